//! Outbound battle notifications.
//!
//! The core never calls into the presentation layer. Every state change
//! worth showing is appended to an [`EventQueue`], which the owner of the
//! battle drains once per external entry point.

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::terrain::TerrainKind;
use crate::turn::{BattleOutcome, TurnPhase};
use crate::unit::UnitId;

/// Something that happened during a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A player unit was selected.
    UnitSelected {
        /// Selected unit.
        unit: UnitId,
    },
    /// A unit moved by its own action.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Tile it left.
        from: GridPos,
        /// Tile it reached.
        to: GridPos,
    },
    /// A basic attack landed.
    AttackResolved {
        /// Attacking unit.
        attacker: UnitId,
        /// Defending unit.
        defender: UnitId,
        /// HP removed from the defender.
        damage: u32,
    },
    /// A unit used an ability.
    AbilityUsed {
        /// Caster.
        unit: UnitId,
        /// Ability name.
        ability: String,
        /// Chosen target tile.
        target: GridPos,
    },
    /// A unit lost HP to an ability, thorns or a collision.
    UnitDamaged {
        /// Damaged unit.
        unit: UnitId,
        /// HP lost.
        amount: u32,
    },
    /// A unit regained HP.
    UnitHealed {
        /// Healed unit.
        unit: UnitId,
        /// HP restored.
        amount: u32,
    },
    /// A unit was displaced by a push or pull.
    UnitPushed {
        /// Displaced unit.
        unit: UnitId,
        /// Tile before the push.
        from: GridPos,
        /// Tile after the push.
        to: GridPos,
    },
    /// A unit ended its turn on hazardous ground.
    HazardDamage {
        /// Damaged unit.
        unit: UnitId,
        /// HP lost.
        amount: u32,
    },
    /// A tile changed terrain during the battle.
    TerrainChanged {
        /// Affected tile.
        pos: GridPos,
        /// New terrain.
        terrain: TerrainKind,
    },
    /// A unit's HP reached zero.
    UnitDefeated {
        /// Defeated unit.
        unit: UnitId,
    },
    /// The turn passed to the other side.
    PhaseChanged {
        /// Phase that just began.
        phase: TurnPhase,
        /// Round number (starts at 1).
        round: u32,
    },
    /// One side has no living units left.
    BattleEnded {
        /// Final result.
        outcome: BattleOutcome,
    },
}

/// FIFO buffer of pending [`BattleEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQueue {
    events: Vec<BattleEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending events without consuming them.
    #[must_use]
    pub fn pending(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
