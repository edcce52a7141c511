//! Minimal end-to-end usage: declare two tiles and a simple adjacency rule
//! through a `TileSetPlugin`, compile it, and run the solver over a small
//! grid, printing the resulting tile ids row by row.

use collapse_forge::direction::Direction;
use collapse_forge::plugin::TileSetPlugin;
use collapse_forge::progress::{CancellationToken, NullProgressSink};
use collapse_forge::rules::{RuleConnection, TileRuleDefinition};
use collapse_forge::settings::Settings;
use collapse_forge::solver::Solver;
use collapse_forge::tile::TileDefinition;
use collapse_forge::ConfigCompiler;

struct GrassWaterTileSet;

impl TileSetPlugin for GrassWaterTileSet {
    fn tile_definitions(&self) -> Vec<TileDefinition> {
        vec![
            TileDefinition::new("grass", "Grass"),
            TileDefinition::new("water", "Water"),
        ]
    }

    fn rule_definitions(&self) -> Vec<TileRuleDefinition> {
        let mut rules = Vec::new();
        for dir in Direction::ALL {
            rules.push(TileRuleDefinition {
                from_tile_id: "grass".into(),
                direction: dir,
                possible_connections: vec![
                    RuleConnection { to_tile_id: "grass".into(), weight: 3.0 },
                    RuleConnection { to_tile_id: "water".into(), weight: 1.0 },
                ],
            });
            rules.push(TileRuleDefinition {
                from_tile_id: "water".into(),
                direction: dir,
                possible_connections: vec![
                    RuleConnection { to_tile_id: "water".into(), weight: 3.0 },
                    RuleConnection { to_tile_id: "grass".into(), weight: 1.0 },
                ],
            });
        }
        rules
    }
}

fn main() {
    env_logger::init();

    let plugin: Box<dyn TileSetPlugin> = Box::new(GrassWaterTileSet);
    let (tiles, rules) = ConfigCompiler::new().merge_plugins(&[plugin]).compile();

    let settings = Settings::new(8, 6, tiles, rules).with_seed(20260728);
    let mut solver = Solver::new();
    let result = solver.generate(&settings, &mut NullProgressSink, &CancellationToken::new());

    match result.grid {
        Some(grid) => {
            for row in grid {
                let line: Vec<&str> = row.iter().map(|t| t.id.as_str()).collect();
                println!("{}", line.join(" "));
            }
        }
        None => eprintln!("generation failed: {}", result.error_message.unwrap_or_default()),
    }
}
