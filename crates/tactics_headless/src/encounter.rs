//! Encounter file loading.

use std::path::Path;

use tactics_core::data::EncounterData;
use thiserror::Error;

/// Error type for headless runs.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// File not found.
    #[error("Encounter file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read encounter file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse encounter: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The battle core rejected the encounter.
    #[error("Invalid encounter: {0}")]
    Battle(#[from] tactics_core::error::BattleError),
    /// Failed to write a JSON report.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load an encounter from a RON file.
///
/// The encounter is parsed but not validated; see
/// [`EncounterData::validate`].
pub fn load_encounter<P: AsRef<Path>>(path: P) -> Result<EncounterData, HeadlessError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HeadlessError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let encounter: EncounterData = ron::from_str(&contents)?;
    tracing::debug!(
        path = %path.display(),
        name = %encounter.name,
        players = encounter.players.len(),
        enemies = encounter.enemies.len(),
        "Encounter loaded"
    );
    Ok(encounter)
}

/// Load and validate an encounter.
pub fn load_valid_encounter<P: AsRef<Path>>(path: P) -> Result<EncounterData, HeadlessError> {
    let encounter = load_encounter(path)?;
    encounter.validate()?;
    Ok(encounter)
}
