use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single tile type, contributed by a [`crate::plugin::TileSetPlugin`] or an
/// overlay JSON file.
///
/// Consumed by the [`crate::config::ConfigCompiler`] and never mutated by the
/// solver: the solver only ever deals with the dense index a `TileDefinition`
/// is assigned during compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resource_path: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl TileDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_path: String::new(),
            category: None,
            properties: HashMap::new(),
        }
    }
}

/// Maps stable tile identifiers to the dense `0..N` indices the solver
/// actually works with, and back.
///
/// Built once by the [`crate::config::ConfigCompiler`] and treated as
/// immutable for the remainder of a generation request.
#[derive(Debug, Clone, Default)]
pub struct TileIndexMap {
    by_id: HashMap<String, usize>,
    definitions: Vec<TileDefinition>,
}

impl TileIndexMap {
    /// Assigns dense indices `0..N` in enumeration order, per spec's
    /// compilation step 4.
    pub fn from_definitions(definitions: Vec<TileDefinition>) -> Self {
        let by_id = definitions
            .iter()
            .enumerate()
            .map(|(idx, def)| (def.id.clone(), idx))
            .collect();
        Self { by_id, definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn index_of(&self, tile_id: &str) -> Option<usize> {
        self.by_id.get(tile_id).copied()
    }

    pub fn definition(&self, index: usize) -> Option<&TileDefinition> {
        self.definitions.get(index)
    }

    pub fn definitions(&self) -> &[TileDefinition] {
        &self.definitions
    }
}
