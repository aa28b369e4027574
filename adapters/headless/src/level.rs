//! TOML level descriptions.
//!
//! ```toml
//! [simulation]
//! step_interval_ms = 250
//!
//! [terrain]
//! rows = [
//!     "..~~..",
//!     "..^T..",
//! ]
//!
//! [[creatures]]
//! kind = "crane"
//! at = [0, 0]
//! goal = [5, 1]
//! ```
//!
//! The first row is the highest `z`; columns run along `x` from zero. A space
//! or `#` marks a cell that is not part of the world.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use menagerie_core::{Coordinate, CreatureKind, SpawnRejection, TerrainKind};
use menagerie_system_scheduler::{Config, ConfigError};
use serde::Deserialize;
use thiserror::Error;

const VOID_GLYPHS: [char; 2] = [' ', '#'];

/// Errors raised while loading or instantiating a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file could not be read.
    #[error("failed to read level {path:?}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The level is not valid TOML or does not match the expected layout.
    #[error("malformed level description")]
    Parse(#[from] toml::de::Error),
    /// The step interval is unusable.
    #[error("invalid simulation settings")]
    Simulation(#[from] ConfigError),
    /// A terrain row contains a character outside the legend.
    #[error("unknown terrain glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Zero-based row index as written in the file.
        row: usize,
        /// Zero-based column index.
        column: usize,
        /// Offending character.
        glyph: char,
    },
    /// The terrain has more rows or columns than coordinates can address.
    #[error("terrain exceeds the addressable grid size")]
    TooLarge,
    /// The terrain section contains no cells at all.
    #[error("level has no terrain cells")]
    EmptyTerrain,
    /// A creature could not be placed where the level puts it.
    #[error("creature {index} ({kind:?}) cannot be placed at {at}: {reason:?}")]
    CreatureRejected {
        /// Position of the entry in the creature list.
        index: usize,
        /// Archetype of the entry.
        kind: CreatureKind,
        /// Requested cell.
        at: Coordinate,
        /// Reason the world refused the placement.
        reason: SpawnRejection,
    },
}

/// Creature placement declared by a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreaturePlacement {
    /// Archetype to spawn.
    pub kind: CreatureKind,
    /// Starting cell.
    pub at: Coordinate,
    /// Goal assigned right after spawning.
    pub goal: Option<Coordinate>,
}

/// Parsed, validated level.
#[derive(Clone, Debug)]
pub struct Level {
    config: Config,
    cells: Vec<(Coordinate, TerrainKind)>,
    creatures: Vec<CreaturePlacement>,
}

impl Level {
    /// Reads and parses the level stored at `path`.
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let source = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::parse(&source)?;
        log::info!(
            "loaded level {} with {} cells and {} creatures",
            path.display(),
            level.cells.len(),
            level.creatures.len()
        );
        Ok(level)
    }

    /// Parses a level from its TOML source.
    pub fn parse(source: &str) -> Result<Self, LevelError> {
        let file: LevelFile = toml::from_str(source)?;
        let config = Config::new(Duration::from_millis(file.simulation.step_interval_ms))?;
        let cells = parse_rows(&file.terrain.rows)?;
        if cells.is_empty() {
            return Err(LevelError::EmptyTerrain);
        }

        let creatures = file
            .creatures
            .into_iter()
            .map(|entry| CreaturePlacement {
                kind: entry.kind,
                at: Coordinate::new(entry.at[0], entry.at[1]),
                goal: entry.goal.map(|[x, z]| Coordinate::new(x, z)),
            })
            .collect();

        Ok(Self {
            config,
            cells,
            creatures,
        })
    }

    /// Scheduler configuration declared by the level.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Every cell of the level in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[(Coordinate, TerrainKind)] {
        &self.cells
    }

    /// Creature placements in declaration order.
    #[must_use]
    pub fn creatures(&self) -> &[CreaturePlacement] {
        &self.creatures
    }
}

fn parse_rows(rows: &[String]) -> Result<Vec<(Coordinate, TerrainKind)>, LevelError> {
    let height = i32::try_from(rows.len()).map_err(|_| LevelError::TooLarge)?;
    let mut cells = Vec::new();
    for (row, line) in rows.iter().enumerate() {
        let z = height - 1 - i32::try_from(row).map_err(|_| LevelError::TooLarge)?;
        for (column, glyph) in line.chars().enumerate() {
            if VOID_GLYPHS.contains(&glyph) {
                continue;
            }
            let kind = TerrainKind::from_glyph(glyph).ok_or(LevelError::UnknownGlyph {
                row,
                column,
                glyph,
            })?;
            let x = i32::try_from(column).map_err(|_| LevelError::TooLarge)?;
            cells.push((Coordinate::new(x, z), kind));
        }
    }
    Ok(cells)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    simulation: SimulationSection,
    terrain: TerrainSection,
    #[serde(default)]
    creatures: Vec<CreatureEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimulationSection {
    step_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TerrainSection {
    rows: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreatureEntry {
    kind: CreatureKind,
    at: [i32; 2],
    #[serde(default)]
    goal: Option<[i32; 2]>,
}
