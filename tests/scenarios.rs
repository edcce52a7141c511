use collapse_forge::direction::Direction;
use collapse_forge::plugin::{GenerationContext, GenerationHookPlugin};
use collapse_forge::progress::{CancellationToken, NullProgressSink};
use collapse_forge::rules::RuleTable;
use collapse_forge::settings::Settings;
use collapse_forge::solver::Solver;
use collapse_forge::tile::{TileDefinition, TileIndexMap};

/// S1 - a single tile, single cell grid always succeeds trivially.
#[test]
fn s1_trivial_single_tile_single_cell() {
    let tiles = TileIndexMap::from_definitions(vec![TileDefinition::new("grass", "Grass")]);
    let rules = RuleTable::new(1);
    let settings = Settings::new(1, 1, tiles, rules).with_seed(1);

    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(result.success);
    let grid = result.grid.unwrap();
    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0][0].id, "grass");
}

/// S2 - one tile, self-permissive in every direction: the whole grid comes
/// out uniform.
#[test]
fn s2_uniform_grass_3x3() {
    let tiles = TileIndexMap::from_definitions(vec![TileDefinition::new("grass", "Grass")]);
    let mut rules = RuleTable::new(1);
    for dir in Direction::ALL {
        rules.insert(0, dir, vec![(0, 1.0)]);
    }
    let settings = Settings::new(3, 3, tiles, rules).with_seed(1);

    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(result.success);
    let grid = result.grid.unwrap();
    assert_eq!(grid.len(), 3);
    for row in &grid {
        assert_eq!(row.len(), 3);
        for tile in row {
            assert_eq!(tile.id, "grass");
        }
    }
}

fn checkerboard_settings(width: u32, height: u32, seed: u64) -> Settings {
    let tiles = TileIndexMap::from_definitions(vec![TileDefinition::new("a", "A"), TileDefinition::new("b", "B")]);
    let mut rules = RuleTable::new(2);
    rules.insert(0, Direction::Right, vec![(1, 1.0)]);
    rules.insert(0, Direction::Down, vec![(1, 1.0)]);
    rules.insert(0, Direction::Left, vec![(1, 1.0)]);
    rules.insert(0, Direction::Up, vec![(1, 1.0)]);
    rules.insert(1, Direction::Right, vec![(0, 1.0)]);
    rules.insert(1, Direction::Down, vec![(0, 1.0)]);
    rules.insert(1, Direction::Left, vec![(0, 1.0)]);
    rules.insert(1, Direction::Up, vec![(0, 1.0)]);
    Settings::new(width, height, tiles, rules).with_seed(seed)
}

/// S3 - with a strict alternation rule, every adjacent pair must differ;
/// this also exercises invariant 2 (consistency) directly.
#[test]
fn s3_checkerboard_2x2_neighbours_always_differ() {
    let settings = checkerboard_settings(2, 2, 9);
    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(result.success);
    let grid = result.grid.unwrap();
    assert_ne!(grid[0][0].id, grid[0][1].id);
    assert_ne!(grid[0][0].id, grid[1][0].id);
    assert_ne!(grid[1][0].id, grid[1][1].id);
    assert_ne!(grid[0][1].id, grid[1][1].id);
}

/// S3 (determinism half) - repeated runs with the same seed and settings
/// produce bit-identical grids (invariant 3).
#[test]
fn s3_checkerboard_is_deterministic_under_fixed_seed() {
    let settings = checkerboard_settings(4, 4, 1234);
    let mut first = Solver::new();
    let mut second = Solver::new();

    let a = first.generate(&settings, &mut NullProgressSink, &CancellationToken::new());
    let b = second.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(a.success && b.success);
    let ids = |r: &collapse_forge::settings::GenerationResult| -> Vec<Vec<String>> {
        r.grid
            .as_ref()
            .unwrap()
            .iter()
            .map(|row| row.iter().map(|t| t.id.clone()).collect())
            .collect()
    };
    assert_eq!(ids(&a), ids(&b));
    assert_eq!(a.seed_used, b.seed_used);
}

/// S4 - no rule ever allows the second column to be collapsed, so every
/// attempt contradicts and the retry budget is exhausted.
#[test]
fn s4_unsatisfiable_configuration_exhausts_retries() {
    let tiles = TileIndexMap::from_definitions(vec![TileDefinition::new("a", "A"), TileDefinition::new("b", "B")]);
    let mut rules = RuleTable::new(2);
    rules.insert(0, Direction::Right, vec![(1, 1.0)]);
    let settings = Settings::new(3, 1, tiles, rules).with_seed(5).with_retry_budget(4);

    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(!result.success);
    assert!(result.grid.is_none());
    assert_eq!(result.error_message.as_deref(), Some("Contradiction after 4 attempts"));
}

/// S5 - cancelling before generation starts returns immediately with the
/// canonical cancellation result and no grid.
#[test]
fn s5_cancellation_returns_immediately_with_no_grid() {
    let settings = checkerboard_settings(50, 50, 1);
    let token = CancellationToken::new();
    token.cancel();

    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &token);

    assert!(!result.success);
    assert!(result.grid.is_none());
    assert_eq!(result.error_message.as_deref(), Some("Operation canceled"));
}

struct PinFirstCellPlugin;

impl GenerationHookPlugin for PinFirstCellPlugin {
    fn on_before_collapse(
        &mut self,
        x: u32,
        y: u32,
        possible_states: Vec<usize>,
        _ctx: &mut GenerationContext,
    ) -> Vec<usize> {
        if x == 0 && y == 0 {
            vec![0]
        } else {
            possible_states
        }
    }
}

/// S6 - a plugin narrowing `(0,0)` down to tile 0 is authoritative: every
/// successful run has tile 0 there.
#[test]
fn s6_plugin_narrows_first_cell_to_a_fixed_tile() {
    let settings = checkerboard_settings(3, 3, 77);
    let mut solver = Solver::new().with_hook(Box::new(PinFirstCellPlugin));
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(result.success);
    let grid = result.grid.unwrap();
    assert_eq!(grid[0][0].id, "a");
}

struct PanickingPlugin;

impl GenerationHookPlugin for PanickingPlugin {
    fn on_after_collapse(&mut self, _x: u32, _y: u32, _state: usize, _ctx: &mut GenerationContext) {
        panic!("boom");
    }
}

/// Invariant 6 - a plugin hook that panics does not prevent an otherwise
/// solvable configuration from succeeding.
#[test]
fn invariant_plugin_fault_does_not_block_generation() {
    let settings = checkerboard_settings(2, 2, 3);
    let mut solver = Solver::new().with_hook(Box::new(PanickingPlugin));
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(result.success);
}

/// Invariant 1 - completeness: every cell in a successful grid is present
/// and assigned (no holes, no placeholder tiles).
#[test]
fn invariant_completeness_every_cell_assigned() {
    let settings = checkerboard_settings(5, 4, 11);
    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    assert!(result.success);
    let grid = result.grid.unwrap();
    assert_eq!(grid.len(), 4);
    for row in &grid {
        assert_eq!(row.len(), 5);
        for tile in row {
            assert!(tile.id == "a" || tile.id == "b");
        }
    }
}

