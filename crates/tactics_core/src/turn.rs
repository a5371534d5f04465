//! Two-phase turn protocol.
//!
//! ```text
//!            end_turn()                      run AI, then
//! PlayerTurn ──────────► EnemyTurn ──────────────────────────► PlayerTurn
//! processing=false       processing=true   complete_enemy_turn()  processing=false
//! ```
//!
//! The scheduler decides *when* a unit may act. It has no terminal state;
//! the owner checks [`TurnScheduler::battle_outcome`] and stops issuing
//! transitions once a side is wiped out.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::roster::UnitRoster;
use crate::unit::{Faction, Unit, UnitId};

/// Whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Player units act through clicks.
    #[default]
    PlayerTurn,
    /// Enemy units act through the AI.
    EnemyTurn,
}

impl TurnPhase {
    /// Faction allowed to act in this phase.
    #[must_use]
    pub const fn faction(self) -> Faction {
        match self {
            Self::PlayerTurn => Faction::Player,
            Self::EnemyTurn => Faction::Enemy,
        }
    }
}

/// Final result of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// At least one player unit survived and every enemy fell.
    PlayerVictory,
    /// Every player unit fell.
    EnemyVictory,
}

/// Turn state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnScheduler {
    phase: TurnPhase,
    /// True while the enemy phase is resolving AI actions.
    processing: bool,
    /// Units that already acted this phase.
    acted: BTreeSet<UnitId>,
    /// Living player units, captured at the last roster refresh.
    player_units: Vec<UnitId>,
    /// Living enemy units, captured at the last roster refresh.
    enemy_units: Vec<UnitId>,
    /// Current round, starting at 1.
    round: u32,
}

impl TurnScheduler {
    /// Start a battle in the player phase with rosters from `roster`.
    #[must_use]
    pub fn new(roster: &UnitRoster) -> Self {
        let mut scheduler = Self {
            phase: TurnPhase::PlayerTurn,
            processing: false,
            acted: BTreeSet::new(),
            player_units: Vec::new(),
            enemy_units: Vec::new(),
            round: 1,
        };
        scheduler.refresh_rosters(roster);
        scheduler
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// True while enemy actions are being resolved.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.processing
    }

    /// Current round number.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Player roster in activation order.
    #[must_use]
    pub fn player_units(&self) -> &[UnitId] {
        &self.player_units
    }

    /// Enemy roster in activation order.
    #[must_use]
    pub fn enemy_units(&self) -> &[UnitId] {
        &self.enemy_units
    }

    /// True if the unit already acted this phase.
    #[must_use]
    pub fn has_acted(&self, id: UnitId) -> bool {
        self.acted.contains(&id)
    }

    /// True if `unit` may act right now.
    #[must_use]
    pub fn can_act(&self, unit: &Unit) -> bool {
        if !unit.is_alive() || self.acted.contains(&unit.id) {
            return false;
        }
        match unit.faction {
            Faction::Player => self.phase == TurnPhase::PlayerTurn && !self.processing,
            Faction::Enemy => self.phase == TurnPhase::EnemyTurn && self.processing,
        }
    }

    /// Record that a unit acted. Idempotent.
    pub fn mark_acted(&mut self, id: UnitId) {
        self.acted.insert(id);
    }

    /// Recompute living rosters. Only call between discrete actions.
    pub fn refresh_rosters(&mut self, roster: &UnitRoster) {
        self.player_units = roster.living(Faction::Player);
        self.enemy_units = roster.living(Faction::Enemy);
    }

    /// End the player phase. Returns true if the phase changed.
    ///
    /// Ignored while processing and during the enemy phase; the enemy phase
    /// only ends through [`Self::complete_enemy_turn`].
    pub fn end_turn(&mut self, roster: &UnitRoster) -> bool {
        if self.processing || self.phase != TurnPhase::PlayerTurn {
            return false;
        }
        self.phase = TurnPhase::EnemyTurn;
        self.acted.clear();
        self.processing = true;
        self.refresh_rosters(roster);
        tracing::info!(round = self.round, "Enemy phase started");
        true
    }

    /// Finish the enemy phase and hand control back to the player.
    /// Returns true if the phase changed.
    pub fn complete_enemy_turn(&mut self, roster: &UnitRoster) -> bool {
        if self.phase != TurnPhase::EnemyTurn {
            return false;
        }
        self.processing = false;
        self.phase = TurnPhase::PlayerTurn;
        self.acted.clear();
        self.refresh_rosters(roster);
        self.round += 1;
        tracing::info!(round = self.round, "Player phase started");
        true
    }

    /// True when one side has no living units.
    #[must_use]
    pub fn is_battle_over(&self, roster: &UnitRoster) -> bool {
        !roster.any_alive(Faction::Player) || !roster.any_alive(Faction::Enemy)
    }

    /// Result of the battle, once it is over.
    #[must_use]
    pub fn battle_outcome(&self, roster: &UnitRoster) -> Option<BattleOutcome> {
        if !self.is_battle_over(roster) {
            return None;
        }
        if roster.any_alive(Faction::Player) {
            Some(BattleOutcome::PlayerVictory)
        } else {
            Some(BattleOutcome::EnemyVictory)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;
    use crate::unit::UnitStats;

    fn roster() -> (UnitRoster, UnitId, UnitId) {
        let mut roster = UnitRoster::new();
        let p = roster.insert(Unit::new("Hero", Faction::Player, GridPos::new(0, 0), UnitStats::default()));
        let e = roster.insert(Unit::new("Orc", Faction::Enemy, GridPos::new(3, 3), UnitStats::default()));
        (roster, p, e)
    }

    #[test]
    fn test_initial_state() {
        let (roster, p, e) = roster();
        let turns = TurnScheduler::new(&roster);
        assert_eq!(turns.phase(), TurnPhase::PlayerTurn);
        assert!(!turns.is_processing());
        assert_eq!(turns.round(), 1);
        assert!(turns.can_act(roster.get(p).unwrap()));
        assert!(!turns.can_act(roster.get(e).unwrap()));
    }

    #[test]
    fn test_mark_acted_is_idempotent() {
        let (roster, p, _) = roster();
        let mut turns = TurnScheduler::new(&roster);
        turns.mark_acted(p);
        turns.mark_acted(p);
        assert!(turns.has_acted(p));
        assert!(!turns.can_act(roster.get(p).unwrap()));
    }

    #[test]
    fn test_phase_cycle() {
        let (roster, p, e) = roster();
        let mut turns = TurnScheduler::new(&roster);
        turns.mark_acted(p);

        assert!(turns.end_turn(&roster));
        assert_eq!(turns.phase(), TurnPhase::EnemyTurn);
        assert!(turns.is_processing());
        assert!(!turns.has_acted(p));
        assert!(turns.can_act(roster.get(e).unwrap()));
        assert!(!turns.can_act(roster.get(p).unwrap()));

        // Ending the turn again while processing does nothing.
        assert!(!turns.end_turn(&roster));
        assert_eq!(turns.phase(), TurnPhase::EnemyTurn);

        turns.mark_acted(e);
        assert!(turns.complete_enemy_turn(&roster));
        assert_eq!(turns.phase(), TurnPhase::PlayerTurn);
        assert!(!turns.is_processing());
        assert!(!turns.has_acted(e));
        assert_eq!(turns.round(), 2);
    }

    #[test]
    fn test_complete_enemy_turn_requires_enemy_phase() {
        let (roster, _, _) = roster();
        let mut turns = TurnScheduler::new(&roster);
        assert!(!turns.complete_enemy_turn(&roster));
        assert_eq!(turns.round(), 1);
    }

    #[test]
    fn test_dead_units_cannot_act() {
        let (mut roster, p, _) = roster();
        roster.get_mut(p).unwrap().lose_hp(100);
        let turns = TurnScheduler::new(&roster);
        assert!(!turns.can_act(roster.get(p).unwrap()));
        assert!(turns.player_units().is_empty());
    }

    #[test]
    fn test_outcome() {
        let (mut roster, p, e) = roster();
        let turns = TurnScheduler::new(&roster);
        assert_eq!(turns.battle_outcome(&roster), None);

        roster.get_mut(e).unwrap().lose_hp(100);
        assert!(turns.is_battle_over(&roster));
        assert_eq!(turns.battle_outcome(&roster), Some(BattleOutcome::PlayerVictory));

        roster.get_mut(p).unwrap().lose_hp(100);
        assert_eq!(turns.battle_outcome(&roster), Some(BattleOutcome::EnemyVictory));
    }
}
