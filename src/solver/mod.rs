mod propagate;
mod queue;

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::direction::Direction;
use crate::error::CollapseError;
use crate::map::CellGrid;
use crate::plugin::{call_guarded, GenerationContext, GenerationHookPlugin, GridView, PluginScratch};
use crate::position::GridPosition;
use crate::progress::{CancellationToken, Phase, ProgressEvent, ProgressSink};
use crate::rules::RuleTable;
use crate::settings::{GenerationResult, Settings};
use crate::size::GridSize;
use crate::tile::TileDefinition;

use propagate::Propagator;
use queue::EntrophyQueue;

/// Drives one generation request end to end.
///
/// Owns the registered [`GenerationHookPlugin`]s, fired in registration
/// order at each of the five extension points; a hook that panics is caught
/// and logged by [`call_guarded`] rather than aborting the run.
#[derive(Default)]
pub struct Solver {
    hooks: Vec<Box<dyn GenerationHookPlugin>>,
}

/// What a single collapse attempt ended in: either the fully solved grid
/// (as a dense index matrix, before post-processing) or the position a
/// contradiction was detected at.
enum AttemptOutcome {
    Solved(Vec<Vec<usize>>),
    Contradiction,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: Box<dyn GenerationHookPlugin>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Repeats attempts, each seeded from `seed ^ attempt`, until one
    /// completes without contradiction or the retry budget is exhausted.
    /// Returns a failure result rather than propagating a `Result` - the
    /// external contract is an envelope, never a panic or `Err` escaping to
    /// the caller.
    pub fn generate(
        &mut self,
        settings: &Settings,
        progress: &mut dyn ProgressSink,
        cancellation: &CancellationToken,
    ) -> GenerationResult {
        if settings.tiles.is_empty() {
            return GenerationResult::failure(CollapseError::EmptyConfiguration.to_string());
        }

        progress.on_progress(ProgressEvent::new(Phase::Init, 0.0));

        for hook in &mut self.hooks {
            if !hook.enabled() {
                continue;
            }
            call_guarded("on_before_generation", (), || hook.on_before_generation(settings));
        }

        let base_seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let size = GridSize::new(settings.width, settings.height);
        let retries = settings.retry_budget.max(1);

        for attempt in 0..retries {
            if cancellation.is_cancelled() {
                return GenerationResult::failure(CollapseError::Cancelled.to_string());
            }

            let effective_seed = base_seed ^ attempt as u64;
            let mut rng = ChaCha8Rng::seed_from_u64(effective_seed);

            match self.run_attempt(settings, size, &mut rng, progress, cancellation, attempt) {
                Ok(AttemptOutcome::Solved(matrix)) => {
                    progress.on_progress(ProgressEvent::new(Phase::Finalize, 100.0));
                    let tiles = index_matrix_to_tiles(settings, &matrix);
                    return GenerationResult::success(tiles, effective_seed);
                }
                Ok(AttemptOutcome::Contradiction) => {
                    log::warn!("contradiction on attempt {attempt}, retrying with a new seed");
                    continue;
                }
                Err(CollapseError::Cancelled) => {
                    return GenerationResult::failure(CollapseError::Cancelled.to_string());
                }
                Err(err) => return GenerationResult::failure(err.to_string()),
            }
        }

        GenerationResult::failure(
            CollapseError::RetryBudgetExhausted { attempts: retries }.to_string(),
        )
    }

    /// One full solve attempt: repeat select -> narrow -> collapse ->
    /// propagate until every cell is settled or a contradiction is hit.
    fn run_attempt(
        &mut self,
        settings: &Settings,
        size: GridSize,
        rng: &mut ChaCha8Rng,
        progress: &mut dyn ProgressSink,
        cancellation: &CancellationToken,
        attempt: u32,
    ) -> Result<AttemptOutcome, CollapseError> {
        let mut grid = CellGrid::new(size, settings.tiles.len(), rng);
        let mut scratch = PluginScratch::default();
        let total = size.tile_count();

        let mut entrophy_queue = EntrophyQueue::new();
        for (pos, cell) in grid.iter() {
            if !cell.is_collapsed() {
                entrophy_queue.update(pos, cell.entrophy());
            }
        }

        let mut collapsed_count = 0usize;

        loop {
            if cancellation.is_cancelled() {
                return Err(CollapseError::Cancelled);
            }

            let Some(pos) = entrophy_queue.pop() else {
                break;
            };

            let actual_states = grid
                .get(pos)
                .map(|cell| cell.possible_states())
                .unwrap_or_default();
            if actual_states.is_empty() {
                return Ok(AttemptOutcome::Contradiction);
            }

            let mut candidates = actual_states.clone();
            for hook in &mut self.hooks {
                if !hook.enabled() {
                    continue;
                }
                let mut ctx = GenerationContext {
                    grid: GridView::new(&grid),
                    settings,
                    rng: &mut *rng,
                    scratch: &mut scratch,
                };
                let fallback = candidates.clone();
                let narrowed = call_guarded("on_before_collapse", fallback, || {
                    hook.on_before_collapse(pos.x(), pos.y(), candidates.clone(), &mut ctx)
                });
                candidates = narrowed
                    .into_iter()
                    .filter(|s| actual_states.contains(s))
                    .collect();
            }

            if candidates.is_empty() {
                return Ok(AttemptOutcome::Contradiction);
            }

            let state = weighted_pick(&settings.rules, pos, size, &candidates, rng);

            grid.get_mut(pos)
                .expect("selected position is always in bounds")
                .collapse(state)?;
            collapsed_count += 1;
            self.fire_after_collapse(pos, state, &grid, settings, rng, &mut scratch);

            let mut propagator = Propagator::new();
            propagator.push(pos);
            match propagator.propagate(&mut grid, &settings.rules, &mut entrophy_queue) {
                Ok(induced) => {
                    collapsed_count += induced.len();
                    for (induced_pos, induced_state) in induced {
                        self.fire_after_collapse(
                            induced_pos,
                            induced_state,
                            &grid,
                            settings,
                            rng,
                            &mut scratch,
                        );
                    }
                }
                Err(_contradiction_pos) => return Ok(AttemptOutcome::Contradiction),
            }

            let percent = (collapsed_count as f32 / total as f32) * 100.0;
            progress.on_progress(ProgressEvent::new(Phase::Solve, percent.min(100.0)));
        }

        let mut matrix = grid_to_index_matrix(&grid, size);
        for hook in &mut self.hooks {
            if !hook.enabled() {
                continue;
            }
            let mut ctx = GenerationContext {
                grid: GridView::new(&grid),
                settings,
                rng: &mut *rng,
                scratch: &mut scratch,
            };
            call_guarded("on_after_generation", (), || {
                hook.on_after_generation(&matrix, &mut ctx)
            });
        }

        for hook in &mut self.hooks {
            if !hook.enabled() {
                continue;
            }
            let mut ctx = GenerationContext {
                grid: GridView::new(&grid),
                settings,
                rng: &mut *rng,
                scratch: &mut scratch,
            };
            let fallback = matrix.clone();
            matrix = call_guarded("on_post_process", fallback, || {
                hook.on_post_process(matrix.clone(), &mut ctx)
            });
        }

        Ok(AttemptOutcome::Solved(matrix))
    }

    fn fire_after_collapse(
        &mut self,
        pos: GridPosition,
        state: usize,
        grid: &CellGrid,
        settings: &Settings,
        rng: &mut ChaCha8Rng,
        scratch: &mut PluginScratch,
    ) {
        for hook in &mut self.hooks {
            if !hook.enabled() {
                continue;
            }
            let mut ctx = GenerationContext {
                grid: GridView::new(grid),
                settings,
                rng: &mut *rng,
                scratch: &mut *scratch,
            };
            call_guarded("on_after_collapse", (), || {
                hook.on_after_collapse(pos.x(), pos.y(), state, &mut ctx)
            });
        }
    }
}

fn grid_to_index_matrix(grid: &CellGrid, size: GridSize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; size.width() as usize]; size.height() as usize];
    for (pos, cell) in grid.iter() {
        matrix[pos.y() as usize][pos.x() as usize] = cell.collapsed_state().unwrap_or(0);
    }
    matrix
}

fn index_matrix_to_tiles(settings: &Settings, matrix: &[Vec<usize>]) -> Vec<Vec<TileDefinition>> {
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|idx| {
                    settings
                        .tiles
                        .definition(*idx)
                        .cloned()
                        .unwrap_or_else(|| TileDefinition::new("unknown", "Unknown"))
                })
                .collect()
        })
        .collect()
}

/// Picks a candidate state weighted by its approximate outgoing
/// connectivity: for each direction with an in-bounds neighbour, the sum of
/// that candidate's rule weights toward that direction - independent of
/// what the neighbour's own possible states currently are. Falls back to a
/// uniform draw if every candidate weighs zero.
fn weighted_pick(
    rules: &RuleTable,
    pos: GridPosition,
    size: GridSize,
    candidates: &[usize],
    rng: &mut ChaCha8Rng,
) -> usize {
    let weights: Vec<f64> = candidates
        .iter()
        .map(|&candidate| connectivity_weight(rules, pos, size, candidate))
        .collect();

    if weights.iter().all(|w| *w <= 0.0) {
        let idx = rng.gen_range(0..candidates.len());
        return candidates[idx];
    }

    match WeightedIndex::new(weights) {
        Ok(dist) => candidates[dist.sample(rng)],
        Err(_) => candidates[rng.gen_range(0..candidates.len())],
    }
}

fn connectivity_weight(rules: &RuleTable, pos: GridPosition, size: GridSize, candidate: usize) -> f64 {
    Direction::ALL
        .into_iter()
        .filter(|dir| dir.march_step(pos, size).is_some())
        .map(|dir| rules.allowed(candidate, dir).iter().map(|(_, w)| w).sum::<f64>())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgressSink;
    use crate::tile::{TileDefinition, TileIndexMap};

    fn two_tile_settings(width: u32, height: u32) -> Settings {
        let tiles =
            TileIndexMap::from_definitions(vec![TileDefinition::new("a", "A"), TileDefinition::new("b", "B")]);
        let mut rules = RuleTable::new(2);
        for dir in Direction::ALL {
            rules.insert(0, dir, vec![(0, 1.0), (1, 1.0)]);
            rules.insert(1, dir, vec![(0, 1.0), (1, 1.0)]);
        }
        Settings::new(width, height, tiles, rules).with_seed(42)
    }

    #[test]
    fn solves_trivial_single_cell_grid() {
        let settings = two_tile_settings(1, 1);
        let mut solver = Solver::new();
        let mut sink = NullProgressSink;
        let result = solver.generate(&settings, &mut sink, &CancellationToken::new());
        assert!(result.success);
        let grid = result.grid.unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].len(), 1);
    }

    #[test]
    fn solves_small_grid_fully_collapsed() {
        let settings = two_tile_settings(3, 3);
        let mut solver = Solver::new();
        let mut sink = NullProgressSink;
        let result = solver.generate(&settings, &mut sink, &CancellationToken::new());
        assert!(result.success);
        let grid = result.grid.unwrap();
        assert_eq!(grid.len(), 3);
        assert!(grid.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn empty_configuration_fails_immediately() {
        let settings = Settings::new(2, 2, TileIndexMap::default(), RuleTable::default());
        let mut solver = Solver::new();
        let mut sink = NullProgressSink;
        let result = solver.generate(&settings, &mut sink, &CancellationToken::new());
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("no tiles were provided in the configuration")
        );
    }

    #[test]
    fn unsatisfiable_adjacency_exhausts_retry_budget() {
        let tiles =
            TileIndexMap::from_definitions(vec![TileDefinition::new("a", "A"), TileDefinition::new("b", "B")]);
        // No rules at all: the second cell can never be collapsed.
        let rules = RuleTable::new(2);
        let settings = Settings::new(2, 1, tiles, rules).with_seed(1).with_retry_budget(2);
        let mut solver = Solver::new();
        let mut sink = NullProgressSink;
        let result = solver.generate(&settings, &mut sink, &CancellationToken::new());
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Contradiction after 2 attempts")
        );
    }

    #[test]
    fn cancellation_before_start_fails_with_spec_wording() {
        let settings = two_tile_settings(4, 4);
        let mut solver = Solver::new();
        let mut sink = NullProgressSink;
        let token = CancellationToken::new();
        token.cancel();
        let result = solver.generate(&settings, &mut sink, &token);
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Operation canceled"));
    }

    #[test]
    fn seed_used_is_reported_on_success() {
        let settings = two_tile_settings(2, 2);
        let mut solver = Solver::new();
        let mut sink = NullProgressSink;
        let result = solver.generate(&settings, &mut sink, &CancellationToken::new());
        assert!(result.success);
        assert_eq!(result.seed_used, Some(42));
    }
}
