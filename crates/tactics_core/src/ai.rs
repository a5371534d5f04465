//! Greedy per-unit decisions.
//!
//! Each unit looks at the board once and either attacks the weakest
//! target in range, steps toward the nearest opponent, or passes. There is
//! no lookahead and no ability use. The same rules drive enemies during
//! their phase and the headless autoplayer for player units.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::combat;
use crate::events::{BattleEvent, EventQueue};
use crate::grid::{reachable_tiles, GridPos};
use crate::roster::UnitRoster;
use crate::unit::UnitId;

/// Decision for a single unit activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiAction {
    /// Basic-attack this unit.
    Attack(UnitId),
    /// Move to this tile.
    Move(GridPos),
    /// Do nothing.
    Pass,
}

/// Pick an action for `unit_id`.
///
/// 1. Attack the valid target with the lowest HP (ties: lowest ID).
/// 2. Otherwise find the nearest living opponent (ties: lowest ID) and
///    move to the reachable tile closest to it (ties: row-major order),
///    but only if that tile is strictly closer than where the unit stands.
/// 3. Otherwise pass.
#[must_use]
pub fn choose_action(field: &Battlefield, roster: &UnitRoster, unit_id: UnitId) -> AiAction {
    let Some(unit) = roster.get(unit_id) else {
        return AiAction::Pass;
    };
    if !unit.is_alive() {
        return AiAction::Pass;
    }

    let weakest = combat::valid_targets(roster, unit_id)
        .into_iter()
        .filter_map(|id| roster.get(id))
        .min_by_key(|target| (target.current_hp(), target.id));
    if let Some(target) = weakest {
        return AiAction::Attack(target.id);
    }

    let nearest = roster
        .iter()
        .filter(|other| other.is_alive() && unit.faction.opposes(other.faction))
        .min_by_key(|other| (unit.position.distance(other.position), other.id));
    let Some(goal) = nearest.map(|other| other.position) else {
        return AiAction::Pass;
    };

    let occupied = roster.occupied_tiles(Some(unit_id));
    let current = unit.position.distance(goal);
    reachable_tiles(field, unit.position, unit.stats.move_range, &occupied)
        .into_iter()
        .min_by_key(|&tile| (tile.distance(goal), tile))
        .filter(|tile| tile.distance(goal) < current)
        .map_or(AiAction::Pass, AiAction::Move)
}

/// Carry out `action` for `unit_id`. Returns true if anything happened.
///
/// Moves are re-validated against the current reachable set, so a stale
/// decision degrades to a pass instead of an illegal move.
pub fn apply_action(
    field: &Battlefield,
    roster: &mut UnitRoster,
    unit_id: UnitId,
    action: AiAction,
    events: &mut EventQueue,
) -> bool {
    match action {
        AiAction::Attack(target) => {
            combat::execute_attack(field, roster, unit_id, target, events) > 0
        }
        AiAction::Move(to) => {
            let occupied = roster.occupied_tiles(Some(unit_id));
            let Some(unit) = roster.get_mut(unit_id) else {
                return false;
            };
            if !reachable_tiles(field, unit.position, unit.stats.move_range, &occupied).contains(&to) {
                return false;
            }
            let from = unit.position;
            unit.position = to;
            tracing::debug!(unit = unit_id, %from, %to, "AI moved");
            events.push(BattleEvent::UnitMoved {
                unit: unit_id,
                from,
                to,
            });
            true
        }
        AiAction::Pass => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;
    use crate::unit::{Faction, Unit, UnitStats};

    fn pos(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    fn spawn(roster: &mut UnitRoster, faction: Faction, at: GridPos, stats: UnitStats) -> UnitId {
        roster.insert(Unit::new("Unit", faction, at, stats))
    }

    #[test]
    fn test_attacks_weakest_target_in_range() {
        let field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(2, 2), UnitStats::default());
        let sturdy = spawn(&mut roster, Faction::Player, pos(1, 2), UnitStats::default());
        let frail = spawn(&mut roster, Faction::Player, pos(3, 2), UnitStats::default());
        roster.get_mut(frail).unwrap().lose_hp(6);

        assert_eq!(choose_action(&field, &roster, orc), AiAction::Attack(frail));
        roster.get_mut(sturdy).unwrap().lose_hp(8);
        assert_eq!(choose_action(&field, &roster, orc), AiAction::Attack(sturdy));
    }

    #[test]
    fn test_equal_hp_targets_break_ties_by_id() {
        let field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(2, 2), UnitStats::default());
        let first = spawn(&mut roster, Faction::Player, pos(2, 3), UnitStats::default());
        spawn(&mut roster, Faction::Player, pos(2, 1), UnitStats::default());
        assert_eq!(choose_action(&field, &roster, orc), AiAction::Attack(first));
    }

    #[test]
    fn test_moves_toward_nearest_opponent() {
        let field = Battlefield::new(8, 8);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(6, 6), UnitStats::default());
        spawn(&mut roster, Faction::Player, pos(0, 0), UnitStats::default());

        let AiAction::Move(to) = choose_action(&field, &roster, orc) else {
            panic!("expected a move");
        };
        assert_eq!(pos(6, 6).distance(to), 3);
        assert_eq!(to.distance(pos(0, 0)), 9);
        // Row-major tie-break picks the lowest row first.
        assert_eq!(to, pos(6, 3));
    }

    #[test]
    fn test_respects_terrain_budget() {
        let mut field = Battlefield::new(8, 3);
        field.fill_rect(pos(1, 0), 3, 3, TerrainKind::Difficult);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(4, 1), UnitStats::default());
        spawn(&mut roster, Faction::Player, pos(0, 1), UnitStats::default());

        // A second difficult tile would cost 4 against a budget of 3.
        assert_eq!(choose_action(&field, &roster, orc), AiAction::Move(pos(3, 1)));
    }

    #[test]
    fn test_passes_when_walled_off() {
        let mut field = Battlefield::new(5, 1);
        field.set_terrain(pos(2, 0), TerrainKind::Water);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(3, 0), UnitStats::default());
        spawn(&mut roster, Faction::Player, pos(0, 0), UnitStats::default());

        // (4, 0) is reachable but farther away.
        assert_eq!(choose_action(&field, &roster, orc), AiAction::Pass);
    }

    #[test]
    fn test_passes_without_opponents() {
        let field = Battlefield::new(4, 4);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(1, 1), UnitStats::default());
        assert_eq!(choose_action(&field, &roster, orc), AiAction::Pass);
    }

    #[test]
    fn test_apply_rejects_stale_move() {
        let field = Battlefield::new(8, 8);
        let mut roster = UnitRoster::new();
        let orc = spawn(&mut roster, Faction::Enemy, pos(0, 0), UnitStats::default());
        let mut events = EventQueue::new();

        assert!(!apply_action(&field, &mut roster, orc, AiAction::Move(pos(7, 7)), &mut events));
        assert_eq!(roster.get(orc).unwrap().position, pos(0, 0));
        assert!(apply_action(&field, &mut roster, orc, AiAction::Move(pos(1, 2)), &mut events));
        assert_eq!(roster.get(orc).unwrap().position, pos(1, 2));
    }
}
