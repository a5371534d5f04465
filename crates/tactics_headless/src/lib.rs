//! Headless battle runner for encounter testing and CI verification.
//!
//! Loads encounter files, plays them out with the built-in AI on both
//! sides and reports the result as JSON. This enables:
//!
//! - **Balance checks**: run an encounter at every difficulty
//! - **CI verification**: encounter files parse and place units legally
//! - **Determinism checks**: identical runs give identical state hashes
//!
//! # Output
//!
//! - **stdout**: JSON reports and ASCII maps
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Play an encounter
//! cargo run -p tactics_headless -- run encounters/skirmish.ron --difficulty hard
//!
//! # Check every encounter in a folder
//! cargo run -p tactics_headless -- validate encounters/*.ron
//!
//! # Show the starting map
//! cargo run -p tactics_headless -- render encounters/skirmish.ron
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod encounter;
pub mod runner;

pub use encounter::{load_encounter, load_valid_encounter, HeadlessError};
pub use runner::{render_battle, run_battle, verify_determinism, BattleReport, RunConfig};
