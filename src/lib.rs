//! A Wave Function Collapse solver core: a tile/rule model, a plugin
//! interface for extending generation, and a propagating constraint solver
//! over a 2D grid.
//!
//! The pieces fit together roughly in this order:
//!
//! 1. One or more [`plugin::TileSetPlugin`]s, plus an optional JSON overlay
//!    directory, are merged by a [`config::ConfigCompiler`] into a
//!    [`tile::TileIndexMap`] and a [`rules::RuleTable`].
//! 2. Those, together with a grid size and an optional seed, become
//!    [`settings::Settings`].
//! 3. A [`solver::Solver`] - optionally holding one or more
//!    [`plugin::GenerationHookPlugin`]s - runs [`solver::Solver::generate`]
//!    against those settings, reporting progress through a
//!    [`progress::ProgressSink`] and honouring a [`progress::CancellationToken`].
//! 4. The result comes back as a [`settings::GenerationResult`]: either a
//!    fully collapsed grid of [`tile::TileDefinition`]s, or an error message.
//!
//! ```no_run
//! use collapse_forge::config::ConfigCompiler;
//! use collapse_forge::progress::{CancellationToken, NullProgressSink};
//! use collapse_forge::settings::Settings;
//! use collapse_forge::solver::Solver;
//!
//! let (tiles, rules) = ConfigCompiler::new().compile();
//! let settings = Settings::new(16, 16, tiles, rules).with_seed(1234);
//! let mut solver = Solver::new();
//! let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());
//! ```

pub mod cell;
pub mod config;
pub mod direction;
pub mod error;
pub mod map;
pub mod plugin;
pub mod position;
pub mod progress;
pub mod rules;
pub mod settings;
pub mod size;
pub mod solver;
pub mod tile;
mod util;

pub use cell::Cell;
pub use config::ConfigCompiler;
pub use direction::Direction;
pub use error::CollapseError;
pub use map::CellGrid;
pub use plugin::{GenerationContext, GenerationHookPlugin, GridView, PluginScratch, TileSetPlugin};
pub use position::GridPosition;
pub use progress::{CancellationToken, NullProgressSink, Phase, ProgressEvent, ProgressSink, RecordingProgressSink};
pub use rules::{RuleConnection, RuleTable, TileRuleDefinition};
pub use settings::{GenerationResult, Settings};
pub use size::GridSize;
pub use solver::Solver;
pub use tile::{TileDefinition, TileIndexMap};
