//! Determinism testing utilities.
//!
//! Checks that a battle produces identical state given identical inputs,
//! step by step and across a snapshot round trip.
//!
//! # Testing Strategy
//!
//! The battle core must be fully reproducible: replays, tests and the
//! headless runner all assume one input sequence has one outcome.
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are stored in a `BTreeMap` and always visited in ID order.
//!
//! - **Randomness**: Combat has none. Damage, targeting and movement are
//!   all pure functions of the battle state.
//!
//! - **Set ordering**: Reachable and attackable tiles are ordered sets, so
//!   tie-breaks ("first tile in row-major order") are stable.

use tactics_core::battle::Battle;

/// Play the same battle twice, comparing hashes after every step.
///
/// Returns the index of the first step after which the two runs differ.
pub fn find_first_divergence<Setup, Step>(setup: Setup, step: Step, steps: u64) -> Option<u64>
where
    Setup: Fn() -> Battle,
    Step: Fn(&mut Battle),
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for index in 1..=steps {
        step(&mut first);
        step(&mut second);
        if first.state_hash() != second.state_hash() {
            return Some(index);
        }
    }

    None
}

/// Verify that a serialization round trip preserves the battle exactly.
pub fn verify_serialization_determinism<Setup, Step>(setup: Setup, step: Step, steps: u64) -> bool
where
    Setup: Fn() -> Battle,
    Step: Fn(&mut Battle),
{
    let mut battle = setup();
    for _ in 0..steps {
        step(&mut battle);
    }

    let hash_before = battle.state_hash();

    let Ok(bytes) = battle.serialize() else {
        return false;
    };
    let Ok(restored) = Battle::deserialize(&bytes) else {
        return false;
    };

    restored.state_hash() == hash_before
}

/// Proptest strategies for battle testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based tests of the battle core.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::prelude::*;

    /// Any terrain kind, OffMap included.
    pub fn arb_terrain() -> impl Strategy<Value = TerrainKind> {
        proptest::sample::select(TerrainKind::ALL.to_vec())
    }

    /// A battlefield of the given size with random terrain.
    pub fn arb_battlefield(width: u32, height: u32) -> impl Strategy<Value = Battlefield> {
        proptest::collection::vec(arb_terrain(), (width * height) as usize).prop_map(move |tiles| {
            let mut field = Battlefield::new(width, height);
            for (i, kind) in tiles.into_iter().enumerate() {
                let x = (i as u32 % width) as i32;
                let y = (i as u32 / width) as i32;
                field.set_terrain(GridPos::new(x, y), kind);
            }
            field
        })
    }

    /// A tile inside a `width` x `height` board.
    pub fn arb_pos(width: u32, height: u32) -> impl Strategy<Value = GridPos> {
        (0..width as i32, 0..height as i32).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Health values (1-40).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..40u32
    }

    /// Raw damage values, zero included (0-30).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        0u32..30u32
    }

    /// Defense values (0-20).
    pub fn arb_defense() -> impl Strategy<Value = u32> {
        0u32..20u32
    }

    /// Movement budgets (0-8).
    pub fn arb_move_range() -> impl Strategy<Value = u32> {
        0u32..8u32
    }

    /// One player-side input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BattleInput {
        /// Click a tile.
        Click(GridPos),
        /// Clear the selection.
        Deselect,
        /// End the player phase and let the enemy act.
        EndTurn,
    }

    /// A random input on a `width` x `height` board. Clicks dominate.
    pub fn arb_input(width: u32, height: u32) -> impl Strategy<Value = BattleInput> {
        prop_oneof![
            8 => arb_pos(width, height).prop_map(BattleInput::Click),
            1 => Just(BattleInput::Deselect),
            1 => Just(BattleInput::EndTurn),
        ]
    }

    /// A sequence of inputs.
    pub fn arb_input_sequence(width: u32, height: u32, max_len: usize) -> impl Strategy<Value = Vec<BattleInput>> {
        proptest::collection::vec(arb_input(width, height), 0..max_len)
    }

    /// Feed one input into a battle.
    pub fn apply_input(battle: &mut Battle, input: BattleInput) {
        match input {
            BattleInput::Click(pos) => {
                battle.click_tile(pos);
            }
            BattleInput::Deselect => battle.deselect(),
            BattleInput::EndTurn => {
                battle.end_turn();
                battle.run_enemy_turn();
            }
        }
    }
}
