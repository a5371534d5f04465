//! # Tactics Core
//!
//! Deterministic combat core for grid-based tactical battles.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//!
//! Presentation layers feed it already-resolved tile clicks and read back
//! state through queries and the event queue.
//!
//! ## Crate Structure
//!
//! - [`battlefield`] / [`terrain`] - Terrain grid and terrain kinds
//! - [`grid`] - Positions, distances and reachability
//! - [`unit`] / [`roster`] - Units and their storage
//! - [`combat`] - Basic attacks
//! - [`effects`] - Ability targeting and resolution
//! - [`turn`] - Two-phase turn scheduler
//! - [`selection`] - Click-driven player interaction
//! - [`ai`] - Greedy unit decisions
//! - [`battle`] - The battle session tying it all together
//! - [`data`] - RON-loadable unit and encounter definitions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ability;
pub mod ai;
pub mod battle;
pub mod battlefield;
pub mod combat;
pub mod data;
pub mod effects;
pub mod error;
pub mod events;
pub mod grid;
pub mod roster;
pub mod selection;
pub mod terrain;
pub mod turn;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ability::{AbilityDef, AbilityInstance, EffectKind, TargetingMode};
    pub use crate::ai::AiAction;
    pub use crate::battle::{Battle, UnitSnapshot};
    pub use crate::battlefield::Battlefield;
    pub use crate::data::{AbilityData, Difficulty, EncounterData, Placement, UnitTemplate};
    pub use crate::error::{BattleError, Result};
    pub use crate::events::{BattleEvent, EventQueue};
    pub use crate::grid::GridPos;
    pub use crate::roster::UnitRoster;
    pub use crate::selection::ClickOutcome;
    pub use crate::terrain::TerrainKind;
    pub use crate::turn::{BattleOutcome, TurnPhase};
    pub use crate::unit::{Faction, PassiveTrait, StatModifier, Unit, UnitId, UnitStats};
}
