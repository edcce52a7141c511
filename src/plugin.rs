use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rand::RngCore;

use crate::map::CellGrid;
use crate::position::GridPosition;
use crate::rules::TileRuleDefinition;
use crate::settings::Settings;
use crate::tile::TileDefinition;

/// Contributes tile and rule definitions to the [`crate::config::ConfigCompiler`].
pub trait TileSetPlugin {
    fn tile_definitions(&self) -> Vec<TileDefinition>;
    fn rule_definitions(&self) -> Vec<TileRuleDefinition>;

    /// Disabled plugins are skipped entirely during compilation; defaults to
    /// enabled since most registered plugins are meant to contribute.
    fn enabled(&self) -> bool {
        true
    }
}

/// Read-only view of the grid-in-progress, as handed to a hook via
/// [`GenerationContext`]. Exposes only what a hook needs to make a decision,
/// never a way to mutate cells directly - any narrowing a hook wants applied
/// goes through its return value instead.
pub struct GridView<'a> {
    grid: &'a CellGrid,
}

impl<'a> GridView<'a> {
    pub(crate) fn new(grid: &'a CellGrid) -> Self {
        Self { grid }
    }

    pub fn possible_states_at(&self, pos: GridPosition) -> Vec<usize> {
        self.grid
            .get(pos)
            .map(|cell| cell.possible_states())
            .unwrap_or_default()
    }

    pub fn collapsed_state_at(&self, pos: GridPosition) -> Option<usize> {
        self.grid.get(pos).and_then(|cell| cell.collapsed_state())
    }

    pub fn size(&self) -> crate::size::GridSize {
        self.grid.size()
    }
}

/// Free-form per-plugin state that persists across hook calls within one
/// generation attempt, keyed by whatever the plugin chooses.
#[derive(Default)]
pub struct PluginScratch {
    entries: HashMap<String, Box<dyn Any>>,
}

impl PluginScratch {
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key).and_then(|v| v.downcast_mut())
    }

    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Read-only views of the current grid and settings, the RNG and a mutable
/// scratch map, passed to every [`GenerationHookPlugin`] call.
pub struct GenerationContext<'a> {
    pub grid: GridView<'a>,
    pub settings: &'a Settings,
    pub rng: &'a mut dyn RngCore,
    pub scratch: &'a mut PluginScratch,
}

/// Five extension points in the generation loop, all optional to override.
/// A hook that panics is caught at the call site (see [`call_guarded`]) and
/// treated as a no-op - the solver continues with the unmodified candidates
/// or grid.
pub trait GenerationHookPlugin {
    fn on_before_generation(&mut self, _settings: &Settings) {}

    /// Authoritative narrowing: whatever this returns becomes the final
    /// candidate set for the selected cell. An empty return means the cell
    /// is contradictory.
    fn on_before_collapse(
        &mut self,
        _x: u32,
        _y: u32,
        possible_states: Vec<usize>,
        _ctx: &mut GenerationContext,
    ) -> Vec<usize> {
        possible_states
    }

    fn on_after_collapse(&mut self, _x: u32, _y: u32, _state: usize, _ctx: &mut GenerationContext) {}

    fn on_after_generation(&mut self, _grid: &[Vec<usize>], _ctx: &mut GenerationContext) {}

    fn on_post_process(
        &mut self,
        grid: Vec<Vec<usize>>,
        _ctx: &mut GenerationContext,
    ) -> Vec<Vec<usize>> {
        grid
    }

    /// Disabled hook plugins are skipped at every extension point.
    fn enabled(&self) -> bool {
        true
    }
}

/// Runs `f`, catching a panic and logging it as a [`crate::error::CollapseError`]-class
/// plugin fault rather than letting it unwind into the solver. Returns
/// `fallback` if `f` panicked.
pub fn call_guarded<T>(hook_name: &str, fallback: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            log::warn!("plugin hook `{hook_name}` panicked; treating as no-op");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_guarded_returns_fallback_on_panic() {
        let result = call_guarded("test", 42, || -> i32 { panic!("boom") });
        assert_eq!(result, 42);
    }

    #[test]
    fn call_guarded_returns_value_on_success() {
        let result = call_guarded("test", 0, || 7);
        assert_eq!(result, 7);
    }

    #[test]
    fn plugin_scratch_roundtrips_typed_values() {
        let mut scratch = PluginScratch::default();
        scratch.insert("counter", 3u32);
        assert_eq!(scratch.get::<u32>("counter"), Some(&3));
        *scratch.get_mut::<u32>("counter").unwrap() += 1;
        assert_eq!(scratch.get::<u32>("counter"), Some(&4));
    }

    struct NoopTileSet;
    impl TileSetPlugin for NoopTileSet {
        fn tile_definitions(&self) -> Vec<TileDefinition> {
            vec![]
        }
        fn rule_definitions(&self) -> Vec<TileRuleDefinition> {
            vec![]
        }
    }

    #[test]
    fn tile_set_plugin_defaults_to_enabled() {
        assert!(NoopTileSet.enabled());
    }
}
