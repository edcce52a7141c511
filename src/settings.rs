use std::collections::HashMap;

use crate::rules::RuleTable;
use crate::tile::{TileDefinition, TileIndexMap};

/// Default retry budget the solver restarts with on contradiction.
pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// Immutable input bundle for one generation request.
///
/// Built once per request and never mutated for its duration; the
/// [`crate::config::ConfigCompiler`] is what produces `tiles` and `rules`
/// from plugin contributions and overlay files.
#[derive(Debug, Clone)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    pub tiles: TileIndexMap,
    pub rules: RuleTable,
    pub seed: Option<u64>,
    pub enable_debug_rendering: bool,
    pub plugin_settings: HashMap<String, String>,
    /// How many times the solver restarts from scratch after a contradiction
    /// before giving up, defaulting to [`DEFAULT_RETRY_BUDGET`] and exposed
    /// here so an embedder can tune it.
    pub retry_budget: u32,
}

impl Settings {
    pub fn new(width: u32, height: u32, tiles: TileIndexMap, rules: RuleTable) -> Self {
        Self {
            width,
            height,
            tiles,
            rules,
            seed: None,
            enable_debug_rendering: false,
            plugin_settings: HashMap::new(),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }
}

/// Output envelope for one generation request.
///
/// `success = true` iff the grid came out fully collapsed and consistent
/// with every rule; on failure `grid` is always `None` - no partial grid
/// is ever returned.
#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    pub success: bool,
    pub grid: Option<Vec<Vec<TileDefinition>>>,
    pub error_message: Option<String>,
    /// Whichever seed actually produced `grid`: the caller's seed, a
    /// non-deterministically drawn one, or `seed ^ attempt` after a retry.
    pub seed_used: Option<u64>,
}

impl GenerationResult {
    pub fn success(grid: Vec<Vec<TileDefinition>>, seed_used: u64) -> Self {
        Self {
            success: true,
            grid: Some(grid),
            error_message: None,
            seed_used: Some(seed_used),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            grid: None,
            error_message: Some(message.into()),
            seed_used: None,
        }
    }
}
