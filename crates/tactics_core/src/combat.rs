//! Basic attack resolution.
//!
//! This module implements the combat rules for basic attacks:
//! - Range is plain Manhattan distance (no line of sight, no occlusion)
//! - Flat defense reduction with a hard minimum of 1 damage
//! - Elevated attackers gain attack, forest defenders gain defense
//! - Thorns retaliation against adjacent attackers
//!
//! Abilities are resolved separately in [`crate::effects`].

use crate::battlefield::Battlefield;
use crate::events::{BattleEvent, EventQueue};
use crate::roster::UnitRoster;
use crate::unit::{PassiveTrait, Unit, UnitId};

/// Minimum damage floor - attacks always deal at least 1 damage.
pub const MIN_DAMAGE: u32 = 1;

/// True if `attacker` may basic-attack `defender` right now.
///
/// Both must be alive, distinct, on opposing sides, and the defender must
/// stand within the attacker's attack range.
#[must_use]
pub fn can_attack(attacker: &Unit, defender: &Unit) -> bool {
    attacker.is_alive()
        && defender.is_alive()
        && attacker.id != defender.id
        && attacker.faction.opposes(defender.faction)
        && attacker.can_attack(defender.position)
}

/// Every unit `attacker` can currently basic-attack, in ID order.
#[must_use]
pub fn valid_targets(roster: &UnitRoster, attacker: UnitId) -> Vec<UnitId> {
    let Some(attacker) = roster.get(attacker) else {
        return Vec::new();
    };
    roster
        .iter()
        .filter(|defender| can_attack(attacker, defender))
        .map(|defender| defender.id)
        .collect()
}

/// Damage a basic attack would deal, including terrain modifiers.
///
/// ```text
/// Power   = attack power (+ modifiers) + elevated bonus of the attacker's tile
/// Defense = defense (+ modifiers) + forest bonus of the defender's tile
/// Damage  = max(1, Power - Defense)
/// ```
#[must_use]
pub fn compute_damage(field: &Battlefield, attacker: &Unit, defender: &Unit) -> u32 {
    let power = attacker.effective_attack() + field.attack_bonus_at(attacker.position);
    defender.mitigate(power, field.defense_bonus_at(defender.position))
}

/// Resolve a basic attack.
///
/// An illegal attack is a silent no-op returning 0: callers are expected
/// to have offered only [`valid_targets`]. A legal attack applies
/// [`compute_damage`] to the defender and queues `AttackResolved`, plus
/// `UnitDefeated` for each unit it kills.
pub fn execute_attack(
    field: &Battlefield,
    roster: &mut UnitRoster,
    attacker_id: UnitId,
    defender_id: UnitId,
    events: &mut EventQueue,
) -> u32 {
    let (damage, attacker_pos) = match (roster.get(attacker_id), roster.get(defender_id)) {
        (Some(attacker), Some(defender)) if can_attack(attacker, defender) => {
            (compute_damage(field, attacker, defender), attacker.position)
        }
        _ => return 0,
    };

    let Some(defender) = roster.get_mut(defender_id) else {
        return 0;
    };
    defender.lose_hp(damage);
    let defender_alive = defender.is_alive();
    let thorns = match defender.passive {
        Some(PassiveTrait::Thorns { damage }) if defender.position.distance(attacker_pos) == 1 => {
            damage
        }
        _ => 0,
    };

    tracing::debug!(
        attacker = attacker_id,
        defender = defender_id,
        damage,
        "Attack resolved"
    );
    events.push(BattleEvent::AttackResolved {
        attacker: attacker_id,
        defender: defender_id,
        damage,
    });

    if !defender_alive {
        tracing::debug!(unit = defender_id, "Unit defeated");
        events.push(BattleEvent::UnitDefeated { unit: defender_id });
        return damage;
    }

    if thorns > 0 {
        if let Some(attacker) = roster.get_mut(attacker_id) {
            let lost = attacker.lose_hp(thorns);
            events.push(BattleEvent::UnitDamaged {
                unit: attacker_id,
                amount: lost,
            });
            if !attacker.is_alive() {
                events.push(BattleEvent::UnitDefeated { unit: attacker_id });
            }
        }
    }

    damage
}
