use serde::{Deserialize, Serialize};

use crate::position::GridPosition;
use crate::size::GridSize;

/// One of the four cardinal directions a tile can be adjacent in.
///
/// `up` decreases `y`, `down` increases `y`, `left` decreases `x`, `right`
/// increases `x` - the coordinate convention used throughout this crate.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Steps one tile away from `from` in `self`'s direction, returning `None`
    /// if that would leave `size`'s bounds.
    pub fn march_step(self, from: GridPosition, size: GridSize) -> Option<GridPosition> {
        let (x, y) = (from.x(), from.y());
        match self {
            Self::Up => y.checked_sub(1).map(|y| GridPosition::new(x, y)),
            Self::Down => {
                if y + 1 < size.height() {
                    Some(GridPosition::new(x, y + 1))
                } else {
                    None
                }
            }
            Self::Left => x.checked_sub(1).map(|x| GridPosition::new(x, y)),
            Self::Right => {
                if x + 1 < size.width() {
                    Some(GridPosition::new(x + 1, y))
                } else {
                    None
                }
            }
        }
    }
}
