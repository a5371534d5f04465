//! Error types for battle setup and data loading.
//!
//! Gameplay actions never produce errors: an illegal click, an out-of-range
//! attack or an out-of-turn action is silently ignored. Errors only arise
//! while building a battle (bad placements, malformed maps, bad data).

use thiserror::Error;

use crate::grid::GridPos;
use crate::unit::UnitId;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for battle construction.
#[derive(Debug, Error)]
pub enum BattleError {
    /// A unit was placed on a tile it cannot stand on.
    #[error("Cannot place unit at {pos}: {reason}")]
    InvalidPlacement {
        /// Requested tile.
        pos: GridPos,
        /// Why the tile was rejected.
        reason: &'static str,
    },

    /// A unit was placed on a tile another living unit already holds.
    #[error("Tile {pos} is already occupied by unit {occupant}")]
    TileOccupied {
        /// Requested tile.
        pos: GridPos,
        /// Unit standing there.
        occupant: UnitId,
    },

    /// Invalid unit identifier.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Battlefield glyph rows could not be parsed.
    #[error("Failed to parse battlefield at row {row}, column {column}: {message}")]
    MapParse {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
        /// Error message.
        message: String,
    },

    /// A unit template cannot produce a living unit.
    #[error("Invalid unit template '{name}': {reason}")]
    InvalidTemplate {
        /// Template name.
        name: String,
        /// Why the template was rejected.
        reason: &'static str,
    },

    /// An encounter has no units for one side.
    #[error("Encounter has no {0} units")]
    EmptyRoster(&'static str),

    /// Data file parsing error.
    #[error("Failed to parse encounter data: {0}")]
    DataParse(#[from] ron::error::SpannedError),

    /// Unrecognised difficulty name.
    #[error("Unknown difficulty '{0}' (expected easy, normal or hard)")]
    UnknownDifficulty(String),

    /// Invalid battle state.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
