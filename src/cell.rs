use bitvec::vec::BitVec;
use rand::Rng;

use crate::error::CollapseError;

/// Superposition state for one grid position: the set of tile indices still
/// possible there, a cached entrophy, and whether a single state has been
/// settled on.
///
/// The possible-state set is a bitset for cache locality, indexed densely
/// `0..N` against the compiled [`crate::tile::TileIndexMap`].
#[derive(Debug, Clone)]
pub struct Cell {
    possible: BitVec,
    collapsed_state: Option<usize>,
    entrophy: f64,
    jitter: f64,
}

impl Cell {
    /// A cell with every one of `tile_count` states still possible.
    ///
    /// `jitter` is a tiny deterministic offset in `[0, 1e-4)` drawn from the
    /// caller's RNG, added to entrophy at construction to break ties under a
    /// fixed seed.
    pub fn new<R: Rng>(tile_count: usize, rng: &mut R) -> Self {
        let jitter = rng.gen_range(0.0..1e-4);
        let mut cell = Self {
            possible: BitVec::repeat(true, tile_count),
            collapsed_state: None,
            entrophy: 0.0,
            jitter,
        };
        cell.recompute_entrophy();
        cell
    }

    pub fn possible_count(&self) -> usize {
        self.possible.count_ones()
    }

    pub fn is_possible(&self, state: usize) -> bool {
        self.possible.get(state).as_deref() == Some(&true)
    }

    pub fn possible_states(&self) -> Vec<usize> {
        self.possible.iter_ones().collect()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed_state.is_some()
    }

    pub fn collapsed_state(&self) -> Option<usize> {
        self.collapsed_state
    }

    pub fn entrophy(&self) -> f64 {
        self.entrophy
    }

    /// `true` once propagation has driven this cell to zero possible states -
    /// a contradiction that must not survive past the propagation step.
    pub fn is_contradiction(&self) -> bool {
        !self.is_collapsed() && self.possible.not_any()
    }

    fn recompute_entrophy(&mut self) {
        let count = self.possible_count();
        self.entrophy = if count == 0 {
            0.0
        } else {
            (count as f64).log2() + self.jitter
        };
    }

    /// Reduces the possible set to exactly `state`.
    ///
    /// Fails with [`CollapseError::InvalidCollapse`] if `state` was not
    /// already possible.
    pub fn collapse(&mut self, state: usize) -> Result<(), CollapseError> {
        if !self.is_possible(state) {
            return Err(CollapseError::InvalidCollapse { state });
        }
        self.possible.fill(false);
        self.possible.set(state, true);
        self.collapsed_state = Some(state);
        self.entrophy = 0.0;
        Ok(())
    }

    /// Removes every possible state for which `predicate` returns `false`,
    /// returning whether anything was removed. [`Self::constrain_to_states`]
    /// covers the one case the solver itself needs (intersection with an
    /// allowed bitset); this is the more general form for a caller that
    /// wants to filter by an arbitrary property instead.
    pub fn constrain(&mut self, mut predicate: impl FnMut(usize) -> bool) -> bool {
        let mut changed = false;
        for state in self.possible.iter_ones().collect::<Vec<_>>() {
            if !predicate(state) {
                self.possible.set(state, false);
                changed = true;
            }
        }
        if changed {
            self.recompute_entrophy();
            changed_to_single(self);
        }
        changed
    }

    /// Intersects the possible set with `allowed`, returning whether
    /// anything was removed. If the intersection collapses the set to a
    /// single state, the cell transitions to collapsed as a side effect.
    pub fn constrain_to_states(&mut self, allowed: &BitVec) -> bool {
        let before = self.possible.clone();
        self.possible &= allowed;
        let changed = before != self.possible;
        if changed {
            self.recompute_entrophy();
            if self.possible_count() == 1 {
                self.collapsed_state = self.possible.iter_ones().next();
                self.entrophy = 0.0;
            }
        }
        changed
    }

    /// Removes a single state from the possible set, used by `before-collapse`
    /// plugin narrowing. Returns whether the state was actually present.
    pub fn remove_state(&mut self, state: usize) -> bool {
        if !self.is_possible(state) {
            return false;
        }
        self.possible.set(state, false);
        self.recompute_entrophy();
        changed_to_single(self);
        true
    }
}

fn changed_to_single(cell: &mut Cell) {
    if cell.possible_count() == 1 {
        cell.collapsed_state = cell.possible.iter_ones().next();
        cell.entrophy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(1)
    }

    #[test]
    fn construct_has_all_states_possible() {
        let cell = Cell::new(4, &mut rng());
        assert_eq!(cell.possible_count(), 4);
        assert!(!cell.is_collapsed());
    }

    #[test]
    fn entrophy_is_log2_of_count_plus_jitter() {
        let cell = Cell::new(4, &mut rng());
        let base = 4f64.log2();
        assert!((cell.entrophy() - base).abs() < 1e-3);
        assert!(cell.entrophy() >= base);
    }

    #[test]
    fn collapse_rejects_impossible_state() {
        let mut cell = Cell::new(2, &mut rng());
        cell.collapse(0).unwrap();
        assert!(matches!(
            cell.collapse(1),
            Err(CollapseError::InvalidCollapse { state: 1 })
        ));
    }

    #[test]
    fn collapse_reduces_to_single_state() {
        let mut cell = Cell::new(3, &mut rng());
        cell.collapse(1).unwrap();
        assert!(cell.is_collapsed());
        assert_eq!(cell.collapsed_state(), Some(1));
        assert_eq!(cell.entrophy(), 0.0);
    }

    #[test]
    fn constrain_by_predicate_removes_matching_states() {
        let mut cell = Cell::new(3, &mut rng());
        let changed = cell.constrain(|state| state != 1);
        assert!(changed);
        assert_eq!(cell.possible_states(), vec![0, 2]);
    }

    #[test]
    fn constrain_by_predicate_collapses_to_single_survivor() {
        let mut cell = Cell::new(2, &mut rng());
        cell.constrain(|state| state == 0);
        assert!(cell.is_collapsed());
        assert_eq!(cell.collapsed_state(), Some(0));
    }

    #[test]
    fn constrain_to_states_detects_contradiction() {
        let mut cell = Cell::new(2, &mut rng());
        let mut allowed = BitVec::repeat(false, 2);
        allowed.set(0, false);
        let changed = cell.constrain_to_states(&allowed);
        assert!(changed);
        assert!(cell.is_contradiction());
    }

    #[test]
    fn constrain_to_single_state_collapses() {
        let mut cell = Cell::new(2, &mut rng());
        let mut allowed = BitVec::repeat(false, 2);
        allowed.set(0, true);
        cell.constrain_to_states(&allowed);
        assert!(cell.is_collapsed());
        assert_eq!(cell.collapsed_state(), Some(0));
    }
}
