//! Data structures for encounter configuration.
//!
//! Pure data types that describe units, their abilities and whole
//! encounters. Everything here deserializes from RON.
//!
//! **Note:** This module contains no IO - it only parses strings.
//! File loading is handled by `tactics_headless`.

mod difficulty;
mod encounter_data;
mod unit_template;

pub use difficulty::Difficulty;
pub use encounter_data::{EncounterData, Placement};
pub use unit_template::{AbilityData, UnitTemplate};
