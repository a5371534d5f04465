//! Battle session: the single public mutation surface.
//!
//! A [`Battle`] owns the battlefield, the unit roster, the turn scheduler,
//! the selection controller and the outbound event queue. Every external
//! entry point (`click_tile`, `end_turn`, `run_enemy_turn`, ...) resolves
//! completely before returning and leaves its notifications in the queue
//! for [`Battle::drain_events`].
//!
//! # Determinism
//!
//! - No randomness anywhere in resolution
//! - Units are always visited in ascending ID order
//! - The enemy activation order is captured when the enemy phase begins
//!
//! # Example
//!
//! ```
//! use tactics_core::prelude::*;
//!
//! let mut battle = Battle::new(Battlefield::new(6, 6));
//! let knight = battle
//!     .spawn_unit(&UnitTemplate::named("Knight"), Faction::Player, GridPos::new(0, 0))
//!     .unwrap();
//! battle
//!     .spawn_unit(&UnitTemplate::named("Goblin"), Faction::Enemy, GridPos::new(5, 5))
//!     .unwrap();
//!
//! battle.click_tile(GridPos::new(0, 0));
//! assert_eq!(battle.selected(), Some(knight));
//! battle.click_tile(GridPos::new(0, 3));
//! battle.end_turn();
//! battle.run_enemy_turn();
//! assert_eq!(battle.phase(), TurnPhase::PlayerTurn);
//! assert_eq!(battle.round(), 2);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::ai::{self, AiAction};
use crate::battlefield::Battlefield;
use crate::data::{Difficulty, EncounterData, UnitTemplate};
use crate::effects;
use crate::error::{BattleError, Result};
use crate::events::{BattleEvent, EventQueue};
use crate::grid::GridPos;
use crate::roster::UnitRoster;
use crate::selection::{ClickOutcome, SelectionController};
use crate::turn::{BattleOutcome, TurnPhase, TurnScheduler};
use crate::unit::{Faction, Unit, UnitId};

/// Read-only view of a unit for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit ID.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Side.
    pub faction: Faction,
    /// Current tile.
    pub position: GridPos,
    /// Current HP.
    pub hp: u32,
    /// Maximum HP.
    pub max_hp: u32,
    /// Remaining cooldown per ability slot.
    pub cooldowns: Vec<u32>,
    /// True if the unit already acted this phase.
    pub acted: bool,
}

/// A running battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle {
    field: Battlefield,
    roster: UnitRoster,
    turns: TurnScheduler,
    selection: SelectionController,
    /// Set once, when one side is wiped out.
    outcome: Option<BattleOutcome>,
    #[serde(skip)]
    events: EventQueue,
}

impl Battle {
    /// Create an empty battle on `field`, starting in the player phase.
    #[must_use]
    pub fn new(field: Battlefield) -> Self {
        let roster = UnitRoster::new();
        let turns = TurnScheduler::new(&roster);
        Self {
            field,
            roster,
            turns,
            selection: SelectionController::new(),
            outcome: None,
            events: EventQueue::new(),
        }
    }

    /// Build a battle from an encounter, scaling enemies by `difficulty`.
    ///
    /// # Errors
    ///
    /// Fails if the map does not parse, a side has no units, or a
    /// placement is illegal.
    pub fn from_encounter(encounter: &EncounterData, difficulty: Difficulty) -> Result<Self> {
        if encounter.players.is_empty() {
            return Err(BattleError::EmptyRoster(Faction::Player.label()));
        }
        if encounter.enemies.is_empty() {
            return Err(BattleError::EmptyRoster(Faction::Enemy.label()));
        }

        let mut battle = Self::new(encounter.battlefield()?);
        for placement in &encounter.players {
            battle.spawn_unit(&placement.unit, Faction::Player, placement.position())?;
        }
        for placement in &encounter.enemies {
            // Easy rounds scaled HP up to 1.
            placement.unit.check()?;
            let scaled = difficulty.scale(&placement.unit);
            battle.spawn_unit(&scaled, Faction::Enemy, placement.position())?;
        }

        tracing::info!(
            encounter = %encounter.name,
            %difficulty,
            players = encounter.players.len(),
            enemies = encounter.enemies.len(),
            "Battle created"
        );
        Ok(battle)
    }

    /// Place a new unit built from `template`.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::InvalidTemplate`] for a template with no HP,
    /// [`BattleError::InvalidPlacement`] for tiles outside the map or not
    /// passable, and [`BattleError::TileOccupied`] if a living unit already
    /// stands there.
    pub fn spawn_unit(&mut self, template: &UnitTemplate, faction: Faction, pos: GridPos) -> Result<UnitId> {
        template.check()?;
        if !self.field.is_valid_tile(pos) {
            return Err(BattleError::InvalidPlacement {
                pos,
                reason: "tile is off the battlefield",
            });
        }
        if !self.field.is_passable(pos) {
            return Err(BattleError::InvalidPlacement {
                pos,
                reason: "tile is not passable",
            });
        }
        if let Some(occupant) = self.roster.unit_at(pos) {
            return Err(BattleError::TileOccupied {
                pos,
                occupant: occupant.id,
            });
        }

        let id = self.roster.insert(template.instantiate(faction, pos));
        self.turns.refresh_rosters(&self.roster);
        tracing::debug!(unit = id, name = %template.name, faction = faction.label(), %pos, "Unit spawned");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Feed a resolved tile click into the selection cycle.
    pub fn click_tile(&mut self, pos: GridPos) -> ClickOutcome {
        if self.is_over() {
            return ClickOutcome::Deselected;
        }
        let outcome = self.selection.click(
            pos,
            &self.field,
            &mut self.roster,
            &self.turns,
            &mut self.events,
        );
        match outcome {
            ClickOutcome::Moved { unit, .. } | ClickOutcome::Attacked { attacker: unit, .. } => {
                self.turns.mark_acted(unit);
                self.check_outcome();
            }
            ClickOutcome::Selected(_) | ClickOutcome::Deselected => {}
        }
        self.validate_invariants();
        outcome
    }

    /// Clear the current selection.
    pub fn deselect(&mut self) {
        if !self.is_over() {
            self.selection.deselect();
        }
    }

    /// End the player phase.
    ///
    /// Player units on hazards take damage, the enemy phase begins and
    /// enemy units run their turn-start upkeep. Returns false if it is not
    /// the player's turn or the battle is over.
    pub fn end_turn(&mut self) -> bool {
        if self.is_over() || self.turns.phase() != TurnPhase::PlayerTurn || self.turns.is_processing() {
            return false;
        }
        self.selection.deselect();
        self.apply_hazards(Faction::Player);
        if self.check_outcome() {
            self.validate_invariants();
            return true;
        }

        self.turns.end_turn(&self.roster);
        self.events.push(BattleEvent::PhaseChanged {
            phase: TurnPhase::EnemyTurn,
            round: self.turns.round(),
        });
        self.start_faction_turn(Faction::Enemy);
        self.check_outcome();
        self.validate_invariants();
        true
    }

    /// Resolve every enemy activation, then hand control back to the
    /// player. Returns the number of enemy actions that changed anything.
    ///
    /// Enemies act in the order captured when the phase began; each one is
    /// re-checked before acting, so units killed mid-phase are skipped.
    pub fn run_enemy_turn(&mut self) -> usize {
        if self.is_over() || self.turns.phase() != TurnPhase::EnemyTurn {
            return 0;
        }

        let mut actions = 0;
        let order = self.turns.enemy_units().to_vec();
        for id in order {
            let Some(unit) = self.roster.get(id) else {
                continue;
            };
            if !self.turns.can_act(unit) {
                continue;
            }
            let action = ai::choose_action(&self.field, &self.roster, id);
            tracing::debug!(unit = id, ?action, "Enemy decision");
            if ai::apply_action(&self.field, &mut self.roster, id, action, &mut self.events) {
                actions += 1;
            }
            self.turns.mark_acted(id);
            if self.check_outcome() {
                self.validate_invariants();
                return actions;
            }
        }

        self.apply_hazards(Faction::Enemy);
        if self.check_outcome() {
            self.validate_invariants();
            return actions;
        }

        self.turns.complete_enemy_turn(&self.roster);
        self.events.push(BattleEvent::PhaseChanged {
            phase: TurnPhase::PlayerTurn,
            round: self.turns.round(),
        });
        self.start_faction_turn(Faction::Player);
        self.check_outcome();
        self.validate_invariants();
        actions
    }

    /// Fire ability `slot` of `unit` at `target`.
    ///
    /// Returns false, changing nothing, if the unit may not act right now,
    /// the ability is not ready, or the target is illegal.
    pub fn use_ability(&mut self, unit: UnitId, slot: usize, target: GridPos) -> bool {
        if self.is_over() {
            return false;
        }
        if !self.roster.get(unit).is_some_and(|u| self.turns.can_act(u)) {
            return false;
        }
        if !effects::use_ability(
            &mut self.field,
            &mut self.roster,
            unit,
            slot,
            target,
            &mut self.events,
        ) {
            return false;
        }
        self.turns.mark_acted(unit);
        self.selection.deselect();
        self.check_outcome();
        self.validate_invariants();
        true
    }

    /// Play the player phase automatically.
    ///
    /// Each ready player unit picks an action with the same greedy rules as
    /// the enemy AI, and the action is carried out through [`Self::click_tile`]
    /// exactly as a human would. Returns the number of units that acted.
    pub fn autoplay_player_turn(&mut self) -> usize {
        if self.is_over() || self.turns.phase() != TurnPhase::PlayerTurn || self.turns.is_processing() {
            return 0;
        }

        let mut actions = 0;
        for id in self.turns.player_units().to_vec() {
            if self.is_over() {
                break;
            }
            let Some(unit) = self.roster.get(id) else {
                continue;
            };
            if !self.turns.can_act(unit) {
                continue;
            }
            let origin = unit.position;
            let target = match ai::choose_action(&self.field, &self.roster, id) {
                AiAction::Attack(defender) => self.roster.get(defender).map(|u| u.position),
                AiAction::Move(to) => Some(to),
                AiAction::Pass => None,
            };
            let Some(target) = target else {
                continue;
            };
            self.click_tile(origin);
            if matches!(
                self.click_tile(target),
                ClickOutcome::Moved { .. } | ClickOutcome::Attacked { .. }
            ) {
                actions += 1;
            }
        }
        actions
    }

    /// Drop dead units from storage. Returns the removed IDs; calling it
    /// again removes nothing.
    pub fn cleanup_dead(&mut self) -> Vec<UnitId> {
        if self.is_over() {
            return Vec::new();
        }
        let removed = self.roster.cleanup_dead();
        if !removed.is_empty() {
            if self.selection.selected().is_some_and(|id| removed.contains(&id)) {
                self.selection.deselect();
            }
            self.turns.refresh_rosters(&self.roster);
            tracing::debug!(count = removed.len(), "Dead units removed");
        }
        removed
    }

    /// Take every pending notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    // ------------------------------------------------------------------
    // Turn boundaries
    // ------------------------------------------------------------------

    fn apply_hazards(&mut self, faction: Faction) {
        for id in self.roster.living(faction) {
            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            let damage = self.field.hazard_damage_at(unit.position);
            if damage == 0 {
                continue;
            }
            let amount = unit.lose_hp(damage);
            tracing::debug!(unit = id, amount, "Hazard damage");
            self.events.push(BattleEvent::HazardDamage { unit: id, amount });
            if !unit.is_alive() {
                self.events.push(BattleEvent::UnitDefeated { unit: id });
            }
        }
    }

    fn start_faction_turn(&mut self, faction: Faction) {
        for id in self.roster.living(faction) {
            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            let amount = unit.start_turn();
            if amount > 0 {
                self.events.push(BattleEvent::UnitHealed { unit: id, amount });
            }
        }
    }

    /// Record the outcome the first time one side is wiped out.
    fn check_outcome(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        let Some(outcome) = self.turns.battle_outcome(&self.roster) else {
            return false;
        };
        self.outcome = Some(outcome);
        self.selection.deselect();
        tracing::info!(?outcome, round = self.turns.round(), "Battle ended");
        self.events.push(BattleEvent::BattleEnded { outcome });
        true
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.turns.phase()
    }

    /// True while the enemy phase is resolving.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.turns.is_processing()
    }

    /// Current round, starting at 1.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.turns.round()
    }

    /// Selected player unit.
    #[must_use]
    pub const fn selected(&self) -> Option<UnitId> {
        self.selection.selected()
    }

    /// Move highlights for the selected unit.
    #[must_use]
    pub fn reachable(&self) -> &BTreeSet<GridPos> {
        self.selection.reachable()
    }

    /// Attack highlights for the selected unit.
    #[must_use]
    pub fn attackable(&self) -> &BTreeSet<GridPos> {
        self.selection.attackable()
    }

    /// Final result, once the battle is over.
    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// True once one side has been wiped out.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// The battlefield.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.field
    }

    /// All units, dead ones included until cleanup.
    #[must_use]
    pub const fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// Turn state.
    #[must_use]
    pub const fn turns(&self) -> &TurnScheduler {
        &self.turns
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.roster.get(id)
    }

    /// Tiles that ability `slot` of `unit` could target, ignoring cooldown.
    #[must_use]
    pub fn ability_targets(&self, unit: UnitId, slot: usize) -> BTreeSet<GridPos> {
        effects::ability_targets(&self.field, &self.roster, unit, slot)
    }

    /// Snapshot of every stored unit, in ID order.
    #[must_use]
    pub fn unit_snapshots(&self) -> Vec<UnitSnapshot> {
        self.roster
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id,
                name: unit.name.clone(),
                faction: unit.faction,
                position: unit.position,
                hp: unit.current_hp(),
                max_hp: unit.stats.max_hp,
                cooldowns: unit.abilities.iter().map(|a| a.cooldown_remaining()).collect(),
                acted: self.turns.has_acted(unit.id),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Determinism support
    // ------------------------------------------------------------------

    /// Hash of the full battle state.
    ///
    /// Two battles fed identical inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.field.hash(&mut hasher);
        self.turns.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.selection.selected().hash(&mut hasher);

        let ids = self.roster.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.roster.get(id) {
                unit.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize the battle state. Pending events are not included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| BattleError::InvalidState(format!("Failed to serialize battle: {e}")))
    }

    /// Restore a battle from [`Self::serialize`] output.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not decode or describe an
    /// inconsistent battle.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let battle: Self = bincode::deserialize(data)
            .map_err(|e| BattleError::InvalidState(format!("Failed to deserialize battle: {e}")))?;
        battle.check_invariants()?;
        Ok(battle)
    }

    /// Check structural invariants: HP within bounds, living units on
    /// passable tiles, no two living units sharing a tile.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::InvalidState`] describing the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let mut occupied = BTreeSet::new();
        for unit in self.roster.iter() {
            if unit.current_hp() > unit.stats.max_hp {
                return Err(BattleError::InvalidState(format!(
                    "unit {} has {} HP out of {}",
                    unit.id,
                    unit.current_hp(),
                    unit.stats.max_hp
                )));
            }
            if !unit.is_alive() {
                continue;
            }
            if !self.field.is_passable(unit.position) {
                return Err(BattleError::InvalidState(format!(
                    "unit {} stands on impassable tile {}",
                    unit.id, unit.position
                )));
            }
            if !occupied.insert(unit.position) {
                return Err(BattleError::InvalidState(format!(
                    "tile {} holds more than one living unit",
                    unit.position
                )));
            }
        }
        Ok(())
    }

    #[cfg(any(debug_assertions, feature = "debug-validation"))]
    fn validate_invariants(&self) {
        if let Err(e) = self.check_invariants() {
            panic!("Battle invariant violated: {e}");
        }
    }

    #[cfg(not(any(debug_assertions, feature = "debug-validation")))]
    #[allow(clippy::unused_self)]
    const fn validate_invariants(&self) {}
}
