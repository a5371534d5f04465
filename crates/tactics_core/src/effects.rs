//! Ability targeting and effect resolution.
//!
//! Abilities run as their own step, separate from [`crate::combat`]:
//! validate the target for the ability's [`TargetingMode`], put the
//! ability on cooldown, then apply its [`EffectKind`] to every affected
//! unit (or tile) in ID order.
//!
//! Turn gating (`can_act`, marking the caster as acted) belongs to the
//! caller; see `Battle::use_ability`.

use std::collections::BTreeSet;

use crate::ability::{AbilityDef, EffectKind, TargetingMode};
use crate::battlefield::Battlefield;
use crate::events::{BattleEvent, EventQueue};
use crate::grid::{dominant_direction, line_between, tiles_in_range, GridPos};
use crate::roster::UnitRoster;
use crate::terrain::TerrainKind;
use crate::unit::{StatModifier, Unit, UnitId};

/// HP lost by a pushed unit that is stopped by an obstacle.
pub const COLLISION_DAMAGE: u32 = 1;

impl EffectKind {
    /// True for effects that only ever help their recipients.
    #[must_use]
    pub const fn is_beneficial(self) -> bool {
        matches!(self, Self::Heal | Self::Buff)
    }
}

/// True if `caster` may fire `def` at `target` right now.
///
/// Ignores cooldowns and turn order; see [`use_ability`] for the full gate.
#[must_use]
pub fn is_valid_target(
    field: &Battlefield,
    roster: &UnitRoster,
    caster: &Unit,
    def: &AbilityDef,
    target: GridPos,
) -> bool {
    if !caster.is_alive() {
        return false;
    }
    if matches!(def.effect, EffectKind::CreateTerrain(TerrainKind::OffMap)) {
        return false;
    }

    let dist = caster.position.distance(target);
    let in_range = (1..=def.range).contains(&dist);
    let occupant = roster.unit_at(target);

    let legal = match def.targeting {
        TargetingMode::SelfTarget => target == caster.position,
        TargetingMode::SingleEnemy => {
            in_range && occupant.is_some_and(|u| caster.faction.opposes(u.faction))
        }
        TargetingMode::SingleAlly => {
            in_range && occupant.is_some_and(|u| u.faction == caster.faction && u.id != caster.id)
        }
        TargetingMode::SingleUnit => in_range && occupant.is_some_and(|u| u.id != caster.id),
        TargetingMode::Tile => in_range && field.is_valid_tile(target),
        TargetingMode::Line => {
            in_range && field.is_valid_tile(target) && line_between(caster.position, target).is_some()
        }
        TargetingMode::Area => dist <= def.range && field.is_valid_tile(target),
    };

    if def.effect == EffectKind::Dash {
        return legal && field.is_passable(target) && occupant.is_none();
    }
    legal
}

/// Every tile `caster` could aim ability `slot` at, ignoring cooldown.
#[must_use]
pub fn ability_targets(
    field: &Battlefield,
    roster: &UnitRoster,
    caster: UnitId,
    slot: usize,
) -> BTreeSet<GridPos> {
    let Some(unit) = roster.get(caster) else {
        return BTreeSet::new();
    };
    let Some(ability) = unit.abilities.get(slot) else {
        return BTreeSet::new();
    };
    let mut candidates = tiles_in_range(field, unit.position, ability.def.range);
    candidates.insert(unit.position);
    candidates
        .into_iter()
        .filter(|&pos| is_valid_target(field, roster, unit, &ability.def, pos))
        .collect()
}

/// Tiles an ability fired at `target` touches, in row-major order.
#[must_use]
pub fn affected_tiles(
    field: &Battlefield,
    caster_pos: GridPos,
    def: &AbilityDef,
    target: GridPos,
) -> Vec<GridPos> {
    let tiles: BTreeSet<GridPos> = match def.targeting {
        TargetingMode::SelfTarget
        | TargetingMode::SingleEnemy
        | TargetingMode::SingleAlly
        | TargetingMode::SingleUnit
        | TargetingMode::Tile => std::iter::once(target).collect(),
        TargetingMode::Line => line_between(caster_pos, target)
            .unwrap_or_default()
            .into_iter()
            .collect(),
        TargetingMode::Area => {
            let mut area = tiles_in_range(field, target, def.area_radius);
            area.insert(target);
            area
        }
    };
    tiles
        .into_iter()
        .filter(|&pos| field.is_valid_tile(pos))
        .collect()
}

/// Living units an ability fired at `target` affects, in ID order.
///
/// Single-unit modes affect whoever was targeted. Multi-tile modes spare
/// allies from harmful effects and opponents from beneficial ones.
#[must_use]
pub fn affected_units(
    field: &Battlefield,
    roster: &UnitRoster,
    caster: &Unit,
    def: &AbilityDef,
    target: GridPos,
) -> Vec<UnitId> {
    let single = matches!(
        def.targeting,
        TargetingMode::SelfTarget
            | TargetingMode::SingleEnemy
            | TargetingMode::SingleAlly
            | TargetingMode::SingleUnit
    );
    let mut ids: Vec<UnitId> = affected_tiles(field, caster.position, def, target)
        .into_iter()
        .filter_map(|pos| roster.unit_at(pos))
        .filter(|u| {
            single || (def.effect.is_beneficial() != caster.faction.opposes(u.faction))
        })
        .map(|u| u.id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Fire ability `slot` of `caster_id` at `target`.
///
/// Returns false, without touching any state, if the caster is missing or
/// dead, the slot is empty, the ability is on cooldown, or the target is
/// illegal for its targeting mode.
pub fn use_ability(
    field: &mut Battlefield,
    roster: &mut UnitRoster,
    caster_id: UnitId,
    slot: usize,
    target: GridPos,
    events: &mut EventQueue,
) -> bool {
    let Some(caster) = roster.get(caster_id) else {
        return false;
    };
    let Some(ability) = caster.abilities.get(slot) else {
        return false;
    };
    if !ability.is_ready() || !is_valid_target(field, roster, caster, &ability.def, target) {
        return false;
    }
    let def = ability.def.clone();
    let caster_pos = caster.position;
    let affected = affected_units(field, roster, caster, &def, target);

    if let Some(ability) = roster
        .get_mut(caster_id)
        .and_then(|c| c.abilities.get_mut(slot))
    {
        ability.trigger();
    }
    tracing::debug!(
        unit = caster_id,
        ability = %def.name,
        %target,
        affected = affected.len(),
        "Ability used"
    );
    events.push(BattleEvent::AbilityUsed {
        unit: caster_id,
        ability: def.name.clone(),
        target,
    });

    match def.effect {
        EffectKind::Damage => {
            for id in affected {
                strike(field, roster, id, def.power, events);
            }
        }
        EffectKind::Heal => {
            for id in affected {
                if let Some(unit) = roster.get_mut(id) {
                    let amount = unit.heal(def.power);
                    if amount > 0 {
                        events.push(BattleEvent::UnitHealed { unit: id, amount });
                    }
                }
            }
        }
        EffectKind::Push | EffectKind::Pull => {
            let toward = def.effect == EffectKind::Pull;
            for id in affected {
                if def.power > 0 {
                    strike(field, roster, id, def.power, events);
                }
                displace(field, roster, id, caster_pos, def.push_distance, toward, events);
            }
        }
        EffectKind::Dash => {
            if let Some(unit) = roster.get_mut(caster_id) {
                unit.position = target;
                events.push(BattleEvent::UnitMoved {
                    unit: caster_id,
                    from: caster_pos,
                    to: target,
                });
            }
        }
        EffectKind::Buff | EffectKind::Debuff => {
            let amount = i32::try_from(def.power).unwrap_or(i32::MAX);
            let modifier = if def.effect == EffectKind::Buff {
                StatModifier {
                    attack: amount,
                    defense: 0,
                    turns_remaining: def.duration,
                }
            } else {
                StatModifier {
                    attack: 0,
                    defense: -amount,
                    turns_remaining: def.duration,
                }
            };
            for id in affected {
                if let Some(unit) = roster.get_mut(id) {
                    unit.add_modifier(modifier);
                }
            }
        }
        EffectKind::CreateTerrain(kind) => {
            for pos in affected_tiles(field, caster_pos, &def, target) {
                if roster.unit_at(pos).is_some() || field.terrain_at(pos) == kind {
                    continue;
                }
                if field.set_terrain(pos, kind) {
                    events.push(BattleEvent::TerrainChanged { pos, terrain: kind });
                }
            }
        }
    }
    true
}

/// Ability damage: defense plus forest cover applies, like a basic attack.
fn strike(field: &Battlefield, roster: &mut UnitRoster, id: UnitId, power: u32, events: &mut EventQueue) {
    let Some(unit) = roster.get_mut(id) else {
        return;
    };
    let cover = field.defense_bonus_at(unit.position);
    let amount = unit.take_damage_with_bonus(power, cover);
    if amount == 0 {
        return;
    }
    events.push(BattleEvent::UnitDamaged { unit: id, amount });
    if !unit.is_alive() {
        events.push(BattleEvent::UnitDefeated { unit: id });
    }
}

/// Shove a unit along the dominant axis relative to `origin`.
///
/// Each step needs a passable, unoccupied tile. A blocked step stops the
/// unit and costs it [`COLLISION_DAMAGE`] HP; a pull that reaches the
/// caster just stops. A unit that moved and came to rest on slippery
/// ground slides one more tile if that tile is free.
fn displace(
    field: &Battlefield,
    roster: &mut UnitRoster,
    id: UnitId,
    origin: GridPos,
    intended: u32,
    toward: bool,
    events: &mut EventQueue,
) {
    let Some(unit) = roster.get(id) else {
        return;
    };
    if !unit.is_alive() {
        return;
    }
    let start = unit.position;
    let steps = unit.resolve_push(intended);
    let direction = if toward {
        dominant_direction(start, origin)
    } else {
        dominant_direction(origin, start)
    };
    let Some((dx, dy)) = direction else {
        return;
    };

    let is_free = |roster: &UnitRoster, pos: GridPos| {
        field.is_passable(pos) && roster.unit_at(pos).is_none()
    };

    let mut pos = start;
    let mut collided = false;
    for _ in 0..steps {
        let next = pos.offset(dx, dy);
        if toward && next == origin {
            break;
        }
        if !is_free(roster, next) {
            collided = true;
            break;
        }
        pos = next;
    }
    if pos != start && !collided && field.terrain_at(pos).slides_on_push() {
        let next = pos.offset(dx, dy);
        if next != origin && is_free(roster, next) {
            pos = next;
        }
    }

    let Some(unit) = roster.get_mut(id) else {
        return;
    };
    if pos != start {
        unit.position = pos;
        tracing::debug!(unit = id, from = %start, to = %pos, "Unit pushed");
        events.push(BattleEvent::UnitPushed {
            unit: id,
            from: start,
            to: pos,
        });
    }
    if collided {
        let amount = unit.lose_hp(COLLISION_DAMAGE);
        events.push(BattleEvent::UnitDamaged { unit: id, amount });
        if !unit.is_alive() {
            events.push(BattleEvent::UnitDefeated { unit: id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Faction, PassiveTrait, UnitStats};

    fn pos(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    fn spawn(roster: &mut UnitRoster, faction: Faction, at: GridPos, abilities: Vec<AbilityDef>) -> UnitId {
        let unit = Unit::new("Unit", faction, at, UnitStats::default())
            .with_abilities(abilities.into_iter().map(Into::into));
        roster.insert(unit)
    }

    fn shove() -> AbilityDef {
        AbilityDef::new("Shove", TargetingMode::SingleEnemy, EffectKind::Push, 0).with_push(2)
    }

    #[test]
    fn test_push_moves_target_away() {
        let mut field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let caster = spawn(&mut roster, Faction::Player, pos(1, 1), vec![shove()]);
        let target = spawn(&mut roster, Faction::Enemy, pos(2, 1), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(2, 1), &mut events));
        assert_eq!(roster.get(target).unwrap().position, pos(4, 1));
        assert_eq!(roster.get(target).unwrap().current_hp(), 10);
        assert!(events.pending().contains(&BattleEvent::UnitPushed {
            unit: target,
            from: pos(2, 1),
            to: pos(4, 1)
        }));
    }

    #[test]
    fn test_push_into_wall_collides() {
        let mut field = Battlefield::new(6, 6);
        field.set_terrain(pos(3, 1), TerrainKind::Water);
        let mut roster = UnitRoster::new();
        let caster = spawn(&mut roster, Faction::Player, pos(1, 1), vec![shove()]);
        let target = spawn(&mut roster, Faction::Enemy, pos(2, 1), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(2, 1), &mut events));
        let unit = roster.get(target).unwrap();
        assert_eq!(unit.position, pos(2, 1));
        assert_eq!(unit.current_hp(), 10 - COLLISION_DAMAGE);
    }

    #[test]
    fn test_push_respects_resistance_and_anchor() {
        let mut field = Battlefield::new(8, 3);
        let mut roster = UnitRoster::new();
        let caster = spawn(&mut roster, Faction::Player, pos(0, 1), vec![shove(), shove()]);
        let target = spawn(&mut roster, Faction::Enemy, pos(1, 1), vec![]);
        roster.get_mut(target).unwrap().stats.push_resistance = 1;
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(1, 1), &mut events));
        assert_eq!(roster.get(target).unwrap().position, pos(2, 1));

        roster.get_mut(caster).unwrap().position = pos(1, 1);
        roster.get_mut(target).unwrap().passive = Some(PassiveTrait::Anchored);
        assert!(use_ability(&mut field, &mut roster, caster, 1, pos(2, 1), &mut events));
        assert_eq!(roster.get(target).unwrap().position, pos(2, 1));
    }

    #[test]
    fn test_slippery_ground_slides_one_more_tile() {
        let mut field = Battlefield::new(8, 3);
        field.set_terrain(pos(3, 1), TerrainKind::Slippery);
        let mut roster = UnitRoster::new();
        let caster = spawn(&mut roster, Faction::Player, pos(0, 1), vec![shove()]);
        let target = spawn(&mut roster, Faction::Enemy, pos(1, 1), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(1, 1), &mut events));
        assert_eq!(roster.get(target).unwrap().position, pos(4, 1));
    }

    #[test]
    fn test_pull_stops_next_to_caster() {
        let mut field = Battlefield::new(8, 3);
        let mut roster = UnitRoster::new();
        let hook = AbilityDef::new("Hook", TargetingMode::SingleEnemy, EffectKind::Pull, 0)
            .with_range(4)
            .with_push(5);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 1), vec![hook]);
        let target = spawn(&mut roster, Faction::Enemy, pos(4, 1), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(4, 1), &mut events));
        let unit = roster.get(target).unwrap();
        assert_eq!(unit.position, pos(1, 1));
        assert_eq!(unit.current_hp(), 10);
    }

    #[test]
    fn test_cooldown_blocks_reuse() {
        let mut field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let bolt = AbilityDef::new("Bolt", TargetingMode::SingleEnemy, EffectKind::Damage, 4)
            .with_range(3)
            .with_cooldown(2);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![bolt]);
        let target = spawn(&mut roster, Faction::Enemy, pos(2, 0), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(2, 0), &mut events));
        assert_eq!(roster.get(target).unwrap().current_hp(), 6);
        assert_eq!(roster.get(caster).unwrap().abilities[0].cooldown_remaining(), 2);

        events.drain();
        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(2, 0), &mut events));
        assert!(events.is_empty());
        assert_eq!(roster.get(target).unwrap().current_hp(), 6);
    }

    #[test]
    fn test_illegal_targets_are_rejected() {
        let mut field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let bolt = AbilityDef::new("Bolt", TargetingMode::SingleEnemy, EffectKind::Damage, 4).with_range(2);
        let mend = AbilityDef::new("Mend", TargetingMode::SingleAlly, EffectKind::Heal, 3);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![bolt, mend]);
        spawn(&mut roster, Faction::Player, pos(1, 0), vec![]);
        spawn(&mut roster, Faction::Enemy, pos(4, 0), vec![]);
        let mut events = EventQueue::new();

        // Ally with an enemy-only ability, enemy out of range, empty tile.
        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(1, 0), &mut events));
        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(4, 0), &mut events));
        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(0, 1), &mut events));
        // Allies-only heal on the caster itself.
        assert!(!use_ability(&mut field, &mut roster, caster, 1, pos(0, 0), &mut events));
        // Missing slot.
        assert!(!use_ability(&mut field, &mut roster, caster, 7, pos(1, 0), &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn test_area_damage_spares_allies() {
        let mut field = Battlefield::new(8, 8);
        let mut roster = UnitRoster::new();
        let blast = AbilityDef::new("Blast", TargetingMode::Area, EffectKind::Damage, 5)
            .with_range(6)
            .with_area(1);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![blast]);
        let ally = spawn(&mut roster, Faction::Player, pos(3, 2), vec![]);
        let e1 = spawn(&mut roster, Faction::Enemy, pos(3, 3), vec![]);
        let e2 = spawn(&mut roster, Faction::Enemy, pos(2, 3), vec![]);
        let far = spawn(&mut roster, Faction::Enemy, pos(5, 5), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(3, 3), &mut events));
        assert_eq!(roster.get(ally).unwrap().current_hp(), 10);
        assert_eq!(roster.get(e1).unwrap().current_hp(), 5);
        assert_eq!(roster.get(e2).unwrap().current_hp(), 5);
        assert_eq!(roster.get(far).unwrap().current_hp(), 10);
    }

    #[test]
    fn test_line_hits_every_enemy_on_segment() {
        let mut field = Battlefield::new(8, 3);
        let mut roster = UnitRoster::new();
        let lance = AbilityDef::new("Lance", TargetingMode::Line, EffectKind::Damage, 3).with_range(3);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 1), vec![lance]);
        let near = spawn(&mut roster, Faction::Enemy, pos(1, 1), vec![]);
        let mid = spawn(&mut roster, Faction::Enemy, pos(3, 1), vec![]);
        let beyond = spawn(&mut roster, Faction::Enemy, pos(4, 1), vec![]);
        let mut events = EventQueue::new();

        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(2, 2), &mut events));
        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(3, 1), &mut events));
        assert_eq!(roster.get(near).unwrap().current_hp(), 7);
        assert_eq!(roster.get(mid).unwrap().current_hp(), 7);
        assert_eq!(roster.get(beyond).unwrap().current_hp(), 10);
    }

    #[test]
    fn test_dash_requires_free_passable_tile() {
        let mut field = Battlefield::new(6, 6);
        field.set_terrain(pos(2, 0), TerrainKind::Water);
        let mut roster = UnitRoster::new();
        let dash = AbilityDef::new("Dash", TargetingMode::Tile, EffectKind::Dash, 0).with_range(3);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![dash]);
        spawn(&mut roster, Faction::Enemy, pos(0, 2), vec![]);
        let mut events = EventQueue::new();

        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(2, 0), &mut events));
        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(0, 2), &mut events));
        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(1, 2), &mut events));
        assert_eq!(roster.get(caster).unwrap().position, pos(1, 2));
    }

    #[test]
    fn test_buff_and_debuff_modify_stats() {
        let mut field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let rally = AbilityDef::new("Rally", TargetingMode::SelfTarget, EffectKind::Buff, 2).with_duration(2);
        let sunder = AbilityDef::new("Sunder", TargetingMode::SingleEnemy, EffectKind::Debuff, 1);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![rally, sunder]);
        let target = spawn(&mut roster, Faction::Enemy, pos(1, 0), vec![]);
        roster.get_mut(target).unwrap().stats.defense = 2;
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(0, 0), &mut events));
        assert_eq!(roster.get(caster).unwrap().effective_attack(), 5);
        assert!(use_ability(&mut field, &mut roster, caster, 1, pos(1, 0), &mut events));
        assert_eq!(roster.get(target).unwrap().effective_defense(), 1);
    }

    #[test]
    fn test_create_terrain_skips_occupied_tiles() {
        let mut field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let thicket = AbilityDef::new(
            "Thicket",
            TargetingMode::Area,
            EffectKind::CreateTerrain(TerrainKind::Forest),
            0,
        )
        .with_range(4)
        .with_area(1);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![thicket]);
        spawn(&mut roster, Faction::Enemy, pos(3, 2), vec![]);
        let mut events = EventQueue::new();

        assert!(use_ability(&mut field, &mut roster, caster, 0, pos(2, 2), &mut events));
        assert_eq!(field.terrain_at(pos(2, 2)), TerrainKind::Forest);
        assert_eq!(field.terrain_at(pos(1, 2)), TerrainKind::Forest);
        assert_eq!(field.terrain_at(pos(3, 2)), TerrainKind::Open);
        let changed = events
            .pending()
            .iter()
            .filter(|e| matches!(e, BattleEvent::TerrainChanged { .. }))
            .count();
        assert_eq!(changed, 4);
    }

    #[test]
    fn test_offmap_terrain_cannot_be_created() {
        let mut field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let void = AbilityDef::new(
            "Void",
            TargetingMode::Tile,
            EffectKind::CreateTerrain(TerrainKind::OffMap),
            0,
        );
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![void]);
        let mut events = EventQueue::new();

        assert!(!use_ability(&mut field, &mut roster, caster, 0, pos(1, 0), &mut events));
        assert_eq!(field.terrain_at(pos(1, 0)), TerrainKind::Open);
    }

    #[test]
    fn test_ability_targets_lists_legal_tiles() {
        let field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let bolt = AbilityDef::new("Bolt", TargetingMode::SingleEnemy, EffectKind::Damage, 4).with_range(2);
        let caster = spawn(&mut roster, Faction::Player, pos(0, 0), vec![bolt]);
        spawn(&mut roster, Faction::Enemy, pos(1, 1), vec![]);
        spawn(&mut roster, Faction::Enemy, pos(3, 0), vec![]);

        let targets = ability_targets(&field, &roster, caster, 0);
        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec![pos(1, 1)]);
    }
}
