//! Test fixtures and helpers.
//!
//! Pre-built battlefields, unit templates and battles for consistent
//! testing.

use tactics_core::prelude::*;

/// Shorthand for [`GridPos::new`].
#[must_use]
pub const fn pos(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

/// An all-open battlefield.
#[must_use]
pub fn open_field(width: u32, height: u32) -> Battlefield {
    Battlefield::new(width, height)
}

/// Template with default movement and range and the given HP, attack and
/// defense.
#[must_use]
pub fn template(name: &str, max_hp: u32, attack_power: u32, defense: u32) -> UnitTemplate {
    UnitTemplate {
        max_hp,
        attack_power,
        defense,
        ..UnitTemplate::named(name)
    }
}

/// Sturdy melee player unit.
#[must_use]
pub fn knight() -> UnitTemplate {
    template("Knight", 14, 4, 1)
}

/// Ranged player unit.
#[must_use]
pub fn archer() -> UnitTemplate {
    UnitTemplate {
        attack_range: 3,
        move_range: 2,
        ..template("Archer", 9, 3, 0)
    }
}

/// Basic enemy.
#[must_use]
pub fn goblin() -> UnitTemplate {
    template("Goblin", 8, 3, 0)
}

/// Heavy enemy.
#[must_use]
pub fn ogre() -> UnitTemplate {
    UnitTemplate {
        move_range: 2,
        push_resistance: 1,
        ..template("Ogre", 16, 5, 1)
    }
}

/// Spawn a unit, panicking on an illegal placement.
///
/// # Panics
///
/// Panics if the tile is invalid, impassable or occupied.
pub fn spawn(battle: &mut Battle, template: &UnitTemplate, faction: Faction, at: GridPos) -> UnitId {
    battle
        .spawn_unit(template, faction, at)
        .unwrap_or_else(|e| panic!("fixture spawn of {} at {at} failed: {e}", template.name))
}

/// 8x8 battle with terrain: a knight and an archer against two goblins
/// and an ogre.
#[must_use]
pub fn skirmish_battle() -> Battle {
    let mut battle = Battle::from_encounter(&skirmish_encounter(), Difficulty::Normal)
        .unwrap_or_else(|e| panic!("skirmish encounter is invalid: {e}"));
    battle.drain_events();
    battle
}

/// Encounter behind [`skirmish_battle`].
#[must_use]
pub fn skirmish_encounter() -> EncounterData {
    EncounterData {
        name: "Skirmish".to_string(),
        description: "Fixture encounter".to_string(),
        terrain: [
            "........",
            "..F..^..",
            "..F.....",
            "...~~...",
            "...~~...",
            ".....F..",
            "..^..F..",
            "........",
        ]
        .iter()
        .map(|row| (*row).to_string())
        .collect(),
        players: vec![
            Placement {
                at: (1, 6),
                unit: knight(),
            },
            Placement {
                at: (0, 7),
                unit: archer(),
            },
        ],
        enemies: vec![
            Placement {
                at: (6, 1),
                unit: goblin(),
            },
            Placement {
                at: (7, 0),
                unit: goblin(),
            },
            Placement {
                at: (5, 0),
                unit: ogre(),
            },
        ],
        difficulty: Difficulty::Normal,
        max_rounds: 30,
    }
}

/// [`skirmish_encounter`] as RON text, for file-loading tests.
///
/// # Panics
///
/// Panics if the encounter cannot be serialized.
#[must_use]
pub fn skirmish_encounter_ron() -> String {
    ron::ser::to_string_pretty(&skirmish_encounter(), ron::ser::PrettyConfig::default())
        .unwrap_or_else(|e| panic!("failed to serialize fixture encounter: {e}"))
}

/// Play one full round automatically: the player phase through clicks,
/// then the enemy phase.
pub fn play_round(battle: &mut Battle) {
    battle.autoplay_player_turn();
    battle.end_turn();
    battle.run_enemy_turn();
    tracing::trace!(round = battle.round(), hash = battle.state_hash(), "Fixture round played");
}

/// Play rounds until the battle ends or `max_rounds` have been played.
/// Returns the outcome, if any.
pub fn play_out(battle: &mut Battle, max_rounds: u32) -> Option<BattleOutcome> {
    for _ in 0..max_rounds {
        if battle.is_over() {
            break;
        }
        play_round(battle);
    }
    battle.outcome()
}
