//! Level data: map layout plus the waves fought on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_defense_core::{CellCoord, EnemyKind, MapId, SpawnEntry, WaveDefinition};

use crate::map::{Map, MapError};

/// Serializable description of one playable level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Catalog key.
    pub id: MapId,
    /// Human readable name.
    pub name: String,
    /// Grid width in cells.
    pub columns: u32,
    /// Grid height in cells.
    pub rows: u32,
    /// Path waypoints in walking order.
    pub path: Vec<CellCoord>,
    /// Cells off the path where nothing may be built.
    #[serde(default)]
    pub blocked: Vec<CellCoord>,
    /// Waves in play order.
    pub waves: Vec<WaveDefinition>,
}

impl LevelDefinition {
    /// Builds the immutable map for this level.
    pub fn build_map(&self) -> Result<Map, MapError> {
        Map::new(self.columns, self.rows, &self.path, &self.blocked)
    }

    fn validate(&self) -> Result<(), LevelError> {
        let _ = self.build_map().map_err(|source| LevelError::Map {
            level: self.id.clone(),
            source,
        })?;
        if self.waves.is_empty() {
            return Err(LevelError::NoWaves(self.id.clone()));
        }
        for (index, wave) in self.waves.iter().enumerate() {
            if wave.entries.iter().all(|entry| entry.count == 0) {
                return Err(LevelError::EmptyWave {
                    level: self.id.clone(),
                    wave: u32::try_from(index).unwrap_or(u32::MAX),
                });
            }
        }
        Ok(())
    }
}

/// Errors raised when a level is added to a [`LevelCatalog`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The map layout is invalid.
    #[error("level {level} has an invalid map: {source}")]
    Map {
        /// Offending level.
        level: MapId,
        /// Underlying map error.
        source: MapError,
    },
    /// The level defines no waves.
    #[error("level {0} defines no waves")]
    NoWaves(MapId),
    /// A wave would spawn nothing.
    #[error("wave {wave} of level {level} spawns no enemies")]
    EmptyWave {
        /// Offending level.
        level: MapId,
        /// Zero-based wave index.
        wave: u32,
    },
}

/// Levels addressable by [`MapId`].
#[derive(Clone, Debug, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<MapId, LevelDefinition>,
}

impl LevelCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the levels shipped with the game.
    #[must_use]
    pub fn builtin() -> Self {
        let mut levels = BTreeMap::new();
        for level in [meadow(), canyon()] {
            let _ = levels.insert(level.id.clone(), level);
        }
        Self { levels }
    }

    /// Adds or replaces a level after validating it.
    pub fn insert(&mut self, level: LevelDefinition) -> Result<(), LevelError> {
        level.validate()?;
        let _ = self.levels.insert(level.id.clone(), level);
        Ok(())
    }

    /// Looks up a level.
    #[must_use]
    pub fn get(&self, id: &MapId) -> Option<&LevelDefinition> {
        self.levels.get(id)
    }

    /// Levels in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.levels.values()
    }
}

fn entry(kind: EnemyKind, count: u32, interval_ms: u64) -> SpawnEntry {
    SpawnEntry {
        kind,
        count,
        interval_ms,
    }
}

fn wave(entries: Vec<SpawnEntry>) -> WaveDefinition {
    WaveDefinition { entries }
}

fn cells(coords: &[(u32, u32)]) -> Vec<CellCoord> {
    coords
        .iter()
        .map(|(column, row)| CellCoord::new(*column, *row))
        .collect()
}

fn meadow() -> LevelDefinition {
    use EnemyKind::{Brute, Grunt, Runner};

    LevelDefinition {
        id: MapId::new("meadow"),
        name: String::from("Meadow"),
        columns: 10,
        rows: 8,
        path: cells(&[(0, 1), (7, 1), (7, 5), (1, 5), (1, 7)]),
        blocked: cells(&[(9, 0), (9, 7)]),
        waves: vec![
            wave(vec![entry(Grunt, 6, 900)]),
            wave(vec![entry(Grunt, 6, 800), entry(Runner, 4, 600)]),
            wave(vec![entry(Runner, 8, 500), entry(Grunt, 6, 700)]),
            wave(vec![entry(Brute, 2, 2_000), entry(Grunt, 8, 600)]),
            wave(vec![
                entry(Brute, 4, 1_600),
                entry(Runner, 10, 400),
                entry(Grunt, 10, 500),
            ]),
        ],
    }
}

fn canyon() -> LevelDefinition {
    use EnemyKind::{Brute, Grunt, Runner};

    LevelDefinition {
        id: MapId::new("canyon"),
        name: String::from("Canyon"),
        columns: 12,
        rows: 6,
        path: cells(&[(0, 2), (4, 2), (4, 4), (9, 4), (9, 1), (11, 1)]),
        blocked: cells(&[(6, 0), (6, 1), (2, 5), (11, 5)]),
        waves: vec![
            wave(vec![entry(Runner, 6, 500)]),
            wave(vec![entry(Grunt, 8, 600), entry(Runner, 6, 450)]),
            wave(vec![entry(Brute, 3, 1_800), entry(Runner, 10, 350)]),
        ],
    }
}
