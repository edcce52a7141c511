use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::direction::Direction;
use crate::plugin::TileSetPlugin;
use crate::rules::{RuleConnection, RuleTable, TileRuleDefinition};
use crate::tile::{TileDefinition, TileIndexMap};

/// Merges tile and rule definitions contributed by enabled
/// [`TileSetPlugin`]s (and optional JSON overlays) into the solver's
/// compiled representation.
///
/// Never fails outright: every per-item problem (an unknown id in a rule, a
/// malformed overlay file) is logged and the offending item dropped. An
/// empty result is a valid, if unproductive, configuration - the solver
/// detects that at its own init step via `EmptyConfiguration`.
#[derive(Default)]
pub struct ConfigCompiler {
    tile_order: Vec<String>,
    tiles: HashMap<String, TileDefinition>,
    rules: Vec<TileRuleDefinition>,
}

impl ConfigCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges in every enabled plugin's contributions, in registration
    /// order. Plugins merge tile definitions last-write-wins per `id`,
    /// preserving the position the id was first seen at, and append rule
    /// definitions.
    pub fn merge_plugins(&mut self, plugins: &[Box<dyn TileSetPlugin>]) -> &mut Self {
        for plugin in plugins {
            if !plugin.enabled() {
                continue;
            }
            for def in plugin.tile_definitions() {
                self.merge_tile(def);
            }
            self.rules.extend(plugin.rule_definitions());
        }
        self
    }

    /// Merges `tiles.json` / `rules.json` from `dir`, if present. Overlay
    /// tile definitions win over plugin-contributed ones on id conflicts;
    /// overlay rules are appended, not merged. The directory is created if
    /// missing so a later write by the caller has somewhere to land.
    pub fn merge_overlay_dir(&mut self, dir: &Path) -> &mut Self {
        if let Err(err) = fs::create_dir_all(dir) {
            log::warn!("could not create config overlay dir {}: {err}", dir.display());
            return self;
        }

        let tiles_path = dir.join("tiles.json");
        if let Ok(contents) = fs::read_to_string(&tiles_path) {
            match serde_json::from_str::<Vec<TileDefinition>>(&contents) {
                Ok(defs) => {
                    for def in defs {
                        self.merge_tile(def);
                    }
                }
                Err(err) => log::warn!("ignoring malformed {}: {err}", tiles_path.display()),
            }
        }

        let rules_path = dir.join("rules.json");
        if let Ok(contents) = fs::read_to_string(&rules_path) {
            match serde_json::from_str::<Vec<TileRuleDefinition>>(&contents) {
                Ok(defs) => self.rules.extend(defs),
                Err(err) => log::warn!("ignoring malformed {}: {err}", rules_path.display()),
            }
        }

        self
    }

    fn merge_tile(&mut self, def: TileDefinition) {
        if !self.tiles.contains_key(&def.id) {
            self.tile_order.push(def.id.clone());
        }
        self.tiles.insert(def.id.clone(), def);
    }

    /// Assigns dense indices in enumeration order (step 4) and produces the
    /// compiled rule table (step 5): rules whose endpoints refer to unknown
    /// tile ids are dropped with a warning, and a `(from, direction)` key
    /// with no surviving connections is omitted entirely.
    pub fn compile(self) -> (TileIndexMap, RuleTable) {
        let definitions: Vec<TileDefinition> = self
            .tile_order
            .iter()
            .filter_map(|id| self.tiles.get(id).cloned())
            .collect();
        let tile_index_map = TileIndexMap::from_definitions(definitions);

        let mut accum: HashMap<(usize, Direction), Vec<(usize, f64)>> = HashMap::new();
        for rule in &self.rules {
            let Some(from_idx) = tile_index_map.index_of(&rule.from_tile_id) else {
                log::warn!(
                    "dropping rule from unknown tile id `{}`",
                    rule.from_tile_id
                );
                continue;
            };
            let connections = accum.entry((from_idx, rule.direction)).or_default();
            for RuleConnection { to_tile_id, weight } in &rule.possible_connections {
                match tile_index_map.index_of(to_tile_id) {
                    Some(to_idx) => connections.push((to_idx, *weight)),
                    None => log::warn!("dropping connection to unknown tile id `{to_tile_id}`"),
                }
            }
        }

        let mut table = RuleTable::new(tile_index_map.len());
        for ((from, dir), connections) in accum {
            table.insert(from, dir, connections);
        }
        (tile_index_map, table)
    }
}
