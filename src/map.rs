use grid::Grid;
use rand::Rng;

use crate::cell::Cell;
use crate::position::GridPosition;
use crate::size::GridSize;

/// Dense `width x height` array of [`Cell`]s, backed by the `grid` crate the
/// same way `grid-forge`'s own `GridMap2D` is.
pub struct CellGrid {
    size: GridSize,
    cells: Grid<Cell>,
}

impl CellGrid {
    /// Allocates a grid where every cell starts with all `tile_count` states
    /// possible.
    pub fn new<R: Rng>(size: GridSize, tile_count: usize, rng: &mut R) -> Self {
        let mut flat = Vec::with_capacity(size.tile_count());
        for _ in 0..size.tile_count() {
            flat.push(Cell::new(tile_count, rng));
        }
        Self {
            size,
            cells: Grid::from_vec(flat, size.width() as usize),
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn get(&self, pos: GridPosition) -> Option<&Cell> {
        if !self.size.is_position_valid(pos) {
            return None;
        }
        self.cells.get(pos.y() as usize, pos.x() as usize)
    }

    pub fn get_mut(&mut self, pos: GridPosition) -> Option<&mut Cell> {
        if !self.size.is_position_valid(pos) {
            return None;
        }
        self.cells.get_mut(pos.y() as usize, pos.x() as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, &Cell)> {
        let width = self.size.width();
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (offset_to_pos(idx, width), cell))
    }
}

fn offset_to_pos(offset: usize, width: u32) -> GridPosition {
    let width = width as usize;
    GridPosition::new((offset % width) as u32, (offset / width) as u32)
}
