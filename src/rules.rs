use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// One declarative adjacency rule, as contributed by a
/// [`crate::plugin::TileSetPlugin`] or an overlay `rules.json`.
///
/// Reads as "a cell holding `from_tile_id` permits its `direction` neighbour
/// to hold `to_tile_id` with relative `weight`". Rules are directional:
/// `A -> up -> B` does not imply `B -> down -> A` unless stated separately -
/// this crate never symmetrises rules on a caller's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileRuleDefinition {
    pub from_tile_id: String,
    pub direction: Direction,
    pub possible_connections: Vec<RuleConnection>,
}

/// A single `(to_tile_id, weight)` entry of a [`TileRuleDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConnection {
    pub to_tile_id: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// The compiled adjacency constraint the solver consults during propagation
/// and weighted collapse: `(from_index, direction) -> [(to_index, weight)]`.
///
/// Every index appearing here is in `0..tile_count`; a key with zero
/// surviving connections is omitted entirely rather than stored empty.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    inner: HashMap<(usize, Direction), Vec<(usize, f64)>>,
    tile_count: usize,
}

impl RuleTable {
    pub fn new(tile_count: usize) -> Self {
        Self {
            inner: HashMap::new(),
            tile_count,
        }
    }

    /// Sets the connections allowed from `from` in direction `dir`. An empty
    /// `connections` list is dropped rather than stored, so a later `allowed`
    /// lookup for that key comes back empty either way.
    pub fn insert(&mut self, from: usize, dir: Direction, connections: Vec<(usize, f64)>) {
        if connections.is_empty() {
            return;
        }
        self.inner.insert((from, dir), connections);
    }

    /// The states a neighbour in `dir` from a cell holding `from` is allowed
    /// to hold, empty if no rule survived compilation for this key.
    pub fn allowed(&self, from: usize, dir: Direction) -> &[(usize, f64)] {
        self.inner
            .get(&(from, dir))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    /// `true` if `(from, dir) -> to` exists for some weight - i.e. whether a
    /// tile holding `from` is allowed to have `to` as its `dir` neighbour.
    pub fn permits(&self, from: usize, dir: Direction, to: usize) -> bool {
        self.allowed(from, dir).iter().any(|(idx, _)| *idx == to)
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &(usize, Direction)> {
        self.inner.keys()
    }
}
