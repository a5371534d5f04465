//! Click-driven interaction cycle for player units.
//!
//! select → highlight reachable/attackable tiles → move *or* attack →
//! deselect. The controller consumes already-resolved tile clicks and
//! never decides turn order; the owning battle marks the unit as acted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::combat;
use crate::events::{BattleEvent, EventQueue};
use crate::grid::{reachable_tiles, tiles_in_range, GridPos};
use crate::roster::UnitRoster;
use crate::turn::TurnScheduler;
use crate::unit::UnitId;

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickOutcome {
    /// A player unit is now selected.
    Selected(UnitId),
    /// The selected unit moved and was deselected.
    Moved {
        /// Unit that moved.
        unit: UnitId,
        /// Tile it left.
        from: GridPos,
        /// Tile it reached.
        to: GridPos,
    },
    /// The selected unit attacked and was deselected.
    Attacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Defending unit.
        defender: UnitId,
        /// Damage dealt.
        damage: u32,
    },
    /// Nothing happened beyond clearing the selection.
    Deselected,
}

/// Current selection and its highlight sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionController {
    selected: Option<UnitId>,
    reachable: BTreeSet<GridPos>,
    attackable: BTreeSet<GridPos>,
}

impl SelectionController {
    /// Create a controller with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected unit, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Tiles the selected unit can move to.
    #[must_use]
    pub fn reachable(&self) -> &BTreeSet<GridPos> {
        &self.reachable
    }

    /// Tiles holding enemies the selected unit can attack.
    #[must_use]
    pub fn attackable(&self) -> &BTreeSet<GridPos> {
        &self.attackable
    }

    /// Clear the selection and both highlight sets. Idempotent.
    pub fn deselect(&mut self) {
        self.selected = None;
        self.reachable.clear();
        self.attackable.clear();
    }

    /// Select `unit` and compute its highlight sets.
    ///
    /// Returns false (and clears the selection) if the unit is missing or
    /// not allowed to act.
    pub fn select(
        &mut self,
        unit: UnitId,
        field: &Battlefield,
        roster: &UnitRoster,
        turns: &TurnScheduler,
    ) -> bool {
        self.deselect();
        let Some(u) = roster.get(unit) else {
            return false;
        };
        if !u.is_player() || !turns.can_act(u) {
            return false;
        }

        let occupied = roster.occupied_tiles(Some(unit));
        self.reachable = reachable_tiles(field, u.position, u.stats.move_range, &occupied);
        self.attackable = tiles_in_range(field, u.position, u.stats.attack_range)
            .into_iter()
            .filter(|&pos| {
                roster
                    .unit_at(pos)
                    .is_some_and(|target| combat::can_attack(u, target))
            })
            .collect();
        self.selected = Some(unit);
        true
    }

    /// Handle a resolved tile click.
    pub fn click(
        &mut self,
        pos: GridPos,
        field: &Battlefield,
        roster: &mut UnitRoster,
        turns: &TurnScheduler,
        events: &mut EventQueue,
    ) -> ClickOutcome {
        // Clicking a player unit that may act always (re)selects it.
        if let Some(clicked) = roster
            .unit_at(pos)
            .filter(|u| u.is_player() && turns.can_act(u))
            .map(|u| u.id)
        {
            if self.select(clicked, field, roster, turns) {
                tracing::debug!(unit = clicked, "Unit selected");
                events.push(BattleEvent::UnitSelected { unit: clicked });
                return ClickOutcome::Selected(clicked);
            }
        }

        let Some(selected) = self.selected else {
            self.deselect();
            return ClickOutcome::Deselected;
        };
        let still_active = roster.get(selected).is_some_and(|u| turns.can_act(u));
        let outcome = if !still_active {
            ClickOutcome::Deselected
        } else if self.attackable.contains(&pos) {
            self.attack(selected, pos, field, roster, events)
        } else if self.reachable.contains(&pos) && roster.unit_at(pos).is_none() {
            self.relocate(selected, pos, roster, events)
        } else {
            ClickOutcome::Deselected
        };

        self.deselect();
        outcome
    }

    fn attack(
        &self,
        attacker: UnitId,
        pos: GridPos,
        field: &Battlefield,
        roster: &mut UnitRoster,
        events: &mut EventQueue,
    ) -> ClickOutcome {
        let Some(defender) = roster.unit_at(pos).map(|u| u.id) else {
            return ClickOutcome::Deselected;
        };
        let damage = combat::execute_attack(field, roster, attacker, defender, events);
        if damage == 0 {
            return ClickOutcome::Deselected;
        }
        ClickOutcome::Attacked {
            attacker,
            defender,
            damage,
        }
    }

    fn relocate(
        &self,
        unit: UnitId,
        to: GridPos,
        roster: &mut UnitRoster,
        events: &mut EventQueue,
    ) -> ClickOutcome {
        let Some(u) = roster.get_mut(unit) else {
            return ClickOutcome::Deselected;
        };
        let from = u.position;
        u.position = to;
        tracing::debug!(unit, %from, %to, "Unit moved");
        events.push(BattleEvent::UnitMoved { unit, from, to });
        ClickOutcome::Moved { unit, from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;
    use crate::unit::{Faction, Unit, UnitStats};

    struct Fixture {
        field: Battlefield,
        roster: UnitRoster,
        turns: TurnScheduler,
        events: EventQueue,
        hero: UnitId,
        orc: UnitId,
    }

    fn fixture() -> Fixture {
        let field = Battlefield::new(6, 6);
        let mut roster = UnitRoster::new();
        let hero = roster.insert(Unit::new(
            "Hero",
            Faction::Player,
            GridPos::new(1, 1),
            UnitStats {
                move_range: 2,
                attack_power: 4,
                ..UnitStats::default()
            },
        ));
        let orc = roster.insert(Unit::new(
            "Orc",
            Faction::Enemy,
            GridPos::new(2, 1),
            UnitStats {
                defense: 1,
                ..UnitStats::default()
            },
        ));
        let turns = TurnScheduler::new(&roster);
        Fixture {
            field,
            roster,
            turns,
            events: EventQueue::new(),
            hero,
            orc,
        }
    }

    impl Fixture {
        fn click(&mut self, ctl: &mut SelectionController, x: i32, y: i32) -> ClickOutcome {
            ctl.click(
                GridPos::new(x, y),
                &self.field,
                &mut self.roster,
                &self.turns,
                &mut self.events,
            )
        }
    }

    #[test]
    fn test_select_computes_highlights() {
        let mut f = fixture();
        let mut ctl = SelectionController::new();
        assert_eq!(f.click(&mut ctl, 1, 1), ClickOutcome::Selected(f.hero));
        assert_eq!(ctl.selected(), Some(f.hero));
        assert!(ctl.attackable().contains(&GridPos::new(2, 1)));
        assert_eq!(ctl.attackable().len(), 1);
        // The orc's tile is neither a landing spot nor a waypoint.
        assert!(!ctl.reachable().contains(&GridPos::new(2, 1)));
        assert!(!ctl.reachable().contains(&GridPos::new(3, 1)));
        assert!(ctl.reachable().contains(&GridPos::new(1, 3)));
    }

    #[test]
    fn test_attack_then_deselect() {
        let mut f = fixture();
        let mut ctl = SelectionController::new();
        f.click(&mut ctl, 1, 1);
        let outcome = f.click(&mut ctl, 2, 1);
        assert_eq!(
            outcome,
            ClickOutcome::Attacked {
                attacker: f.hero,
                defender: f.orc,
                damage: 3
            }
        );
        assert_eq!(ctl.selected(), None);
        assert!(ctl.reachable().is_empty());
        assert!(ctl.attackable().is_empty());
        assert_eq!(f.roster.get(f.orc).unwrap().current_hp(), 7);
    }

    #[test]
    fn test_move_to_reachable_tile() {
        let mut f = fixture();
        let mut ctl = SelectionController::new();
        f.click(&mut ctl, 1, 1);
        let outcome = f.click(&mut ctl, 1, 3);
        assert_eq!(
            outcome,
            ClickOutcome::Moved {
                unit: f.hero,
                from: GridPos::new(1, 1),
                to: GridPos::new(1, 3)
            }
        );
        assert_eq!(f.roster.get(f.hero).unwrap().position, GridPos::new(1, 3));
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn test_unreachable_click_deselects_without_mutation() {
        let mut f = fixture();
        f.field.set_terrain(GridPos::new(1, 2), TerrainKind::Water);
        let mut ctl = SelectionController::new();
        f.click(&mut ctl, 1, 1);
        assert_eq!(f.click(&mut ctl, 5, 5), ClickOutcome::Deselected);
        assert_eq!(f.roster.get(f.hero).unwrap().position, GridPos::new(1, 1));
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn test_enemy_unit_cannot_be_selected() {
        let mut f = fixture();
        let mut ctl = SelectionController::new();
        assert_eq!(f.click(&mut ctl, 2, 1), ClickOutcome::Deselected);
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn test_acted_unit_cannot_be_selected() {
        let mut f = fixture();
        f.turns.mark_acted(f.hero);
        let mut ctl = SelectionController::new();
        assert_eq!(f.click(&mut ctl, 1, 1), ClickOutcome::Deselected);
    }

    #[test]
    fn test_deselect_is_idempotent() {
        let mut ctl = SelectionController::new();
        ctl.deselect();
        ctl.deselect();
        assert_eq!(ctl.selected(), None);
        assert!(ctl.reachable().is_empty());
        assert!(ctl.attackable().is_empty());
    }
}
