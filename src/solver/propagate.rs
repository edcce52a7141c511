use std::collections::{HashSet, VecDeque};

use bitvec::vec::BitVec;

use crate::direction::Direction;
use crate::map::CellGrid;
use crate::position::GridPosition;
use crate::rules::RuleTable;

use super::queue::EntrophyQueue;

/// FIFO worklist of positions whose neighbours may need re-checking,
/// deduped on enqueue with a per-cell flag so a hot cell can't blow up the
/// worklist by being pushed many times before it's popped once.
#[derive(Default)]
pub struct Propagator {
    worklist: VecDeque<GridPosition>,
    enqueued: HashSet<GridPosition>,
}

impl Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pos: GridPosition) {
        if self.enqueued.insert(pos) {
            self.worklist.push_back(pos);
        }
    }

    /// Runs propagation to a fixpoint: pops cells breadth-first, narrows
    /// each in-bounds neighbour's possible set to what the rule table still
    /// allows given the popped cell's current states, and re-enqueues any
    /// neighbour that changed.
    ///
    /// Returns the positions that became collapsed as a side effect of
    /// narrowing (propagation-induced collapses still need `after-collapse`
    /// fired for them, but that firing needs a plugin context this function
    /// doesn't have - the caller fires it from the returned list). On
    /// contradiction, returns the position that ran out of options.
    pub fn propagate(
        &mut self,
        grid: &mut CellGrid,
        rules: &RuleTable,
        queue: &mut EntrophyQueue,
    ) -> Result<Vec<(GridPosition, usize)>, GridPosition> {
        let mut newly_collapsed = Vec::new();
        let size = grid.size();

        while let Some(pos) = self.worklist.pop_front() {
            self.enqueued.remove(&pos);
            let source_states = match grid.get(pos) {
                Some(cell) => cell.possible_states(),
                None => continue,
            };

            for dir in Direction::ALL {
                let Some(neighbour_pos) = dir.march_step(pos, size) else {
                    continue;
                };
                let tile_count = rules.tile_count();
                let mut allowed = BitVec::repeat(false, tile_count);
                for &state in &source_states {
                    for &(to, _weight) in rules.allowed(state, dir) {
                        allowed.set(to, true);
                    }
                }

                let Some(neighbour) = grid.get_mut(neighbour_pos) else {
                    continue;
                };
                if neighbour.is_collapsed() {
                    continue;
                }
                let changed = neighbour.constrain_to_states(&allowed);
                if !changed {
                    continue;
                }
                if neighbour.is_contradiction() {
                    return Err(neighbour_pos);
                }
                if neighbour.is_collapsed() {
                    newly_collapsed.push((neighbour_pos, neighbour.collapsed_state().unwrap()));
                    queue.remove(neighbour_pos);
                } else {
                    queue.update(neighbour_pos, neighbour.entrophy());
                }
                self.push(neighbour_pos);
            }
        }

        Ok(newly_collapsed)
    }
}
