//! Combat units.
//!
//! A unit is pure data plus the arithmetic that only needs the unit
//! itself: damage mitigation, healing, push resistance and range checks.
//! Anything involving terrain or other units lives in [`crate::combat`]
//! and [`crate::effects`].

use serde::{Deserialize, Serialize};

use crate::ability::AbilityInstance;
use crate::combat::MIN_DAMAGE;
use crate::grid::GridPos;

/// Unique identifier for units within a battle.
pub type UnitId = u32;

/// Which side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Controlled through tile clicks.
    Player,
    /// Controlled by the enemy AI.
    Enemy,
}

impl Faction {
    /// True if the two factions are hostile to each other.
    #[must_use]
    pub const fn opposes(self, other: Self) -> bool {
        !matches!(
            (self, other),
            (Self::Player, Self::Player) | (Self::Enemy, Self::Enemy)
        )
    }

    /// The hostile faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Lowercase label for logs and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }
}

/// Base combat statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub max_hp: u32,
    /// Movement points per turn.
    pub move_range: u32,
    /// Maximum Manhattan distance for basic attacks.
    pub attack_range: u32,
    /// Raw basic attack damage.
    pub attack_power: u32,
    /// Flat damage reduction.
    pub defense: u32,
    /// Tiles subtracted from every push or pull.
    pub push_resistance: u32,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            max_hp: 10,
            move_range: 3,
            attack_range: 1,
            attack_power: 3,
            defense: 0,
            push_resistance: 0,
        }
    }
}

/// Innate behaviour a unit carries for the whole battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassiveTrait {
    /// Restores HP at the start of each of its faction's turns.
    Regeneration {
        /// HP restored per turn.
        amount: u32,
    },
    /// Adjacent attackers lose HP when they land a basic attack.
    Thorns {
        /// HP lost by the attacker.
        damage: u32,
    },
    /// Cannot be pushed or pulled.
    Anchored,
}

/// Temporary attack/defense adjustment from a buff or debuff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatModifier {
    /// Added to attack power.
    pub attack: i32,
    /// Added to defense.
    pub defense: i32,
    /// Owner turns left before the modifier expires.
    pub turns_remaining: u32,
}

/// A combatant on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier, assigned by the roster.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Side this unit fights for.
    pub faction: Faction,
    /// Current tile.
    pub position: GridPos,
    /// Base statistics.
    pub stats: UnitStats,
    /// Current hit points, in `0..=stats.max_hp`.
    current_hp: u32,
    /// Abilities in slot order.
    pub abilities: Vec<AbilityInstance>,
    /// Optional passive trait.
    pub passive: Option<PassiveTrait>,
    /// Active buffs and debuffs.
    pub modifiers: Vec<StatModifier>,
}

impl Unit {
    /// Create a unit at full health with no abilities.
    #[must_use]
    pub fn new(name: impl Into<String>, faction: Faction, position: GridPos, stats: UnitStats) -> Self {
        Self {
            id: 0,
            name: name.into(),
            faction,
            position,
            stats,
            current_hp: stats.max_hp,
            abilities: Vec::new(),
            passive: None,
            modifiers: Vec::new(),
        }
    }

    /// Builder method to add abilities.
    #[must_use]
    pub fn with_abilities(mut self, abilities: impl IntoIterator<Item = AbilityInstance>) -> Self {
        self.abilities.extend(abilities);
        self
    }

    /// Builder method to set the passive trait.
    #[must_use]
    pub fn with_passive(mut self, passive: PassiveTrait) -> Self {
        self.passive = Some(passive);
        self
    }

    /// Current hit points.
    #[must_use]
    pub const fn current_hp(&self) -> u32 {
        self.current_hp
    }

    /// Alive while HP is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// True for player-controlled units.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.faction, Faction::Player)
    }

    /// Attack power including modifiers, floored at zero.
    #[must_use]
    pub fn effective_attack(&self) -> u32 {
        let bonus: i64 = self.modifiers.iter().map(|m| i64::from(m.attack)).sum();
        (i64::from(self.stats.attack_power) + bonus).max(0) as u32
    }

    /// Defense including modifiers, floored at zero.
    #[must_use]
    pub fn effective_defense(&self) -> u32 {
        let bonus: i64 = self.modifiers.iter().map(|m| i64::from(m.defense)).sum();
        (i64::from(self.stats.defense) + bonus).max(0) as u32
    }

    /// Damage that `raw` would deal after defense plus `bonus_defense`.
    ///
    /// Never below 1: defense can reduce an attack but not negate it.
    #[must_use]
    pub fn mitigate(&self, raw: u32, bonus_defense: u32) -> u32 {
        let defense = self.effective_defense().saturating_add(bonus_defense);
        raw.saturating_sub(defense).max(MIN_DAMAGE)
    }

    /// Apply `raw` damage reduced by defense. Returns damage dealt.
    pub fn take_damage(&mut self, raw: u32) -> u32 {
        self.take_damage_with_bonus(raw, 0)
    }

    /// Apply `raw` damage reduced by defense plus a situational bonus
    /// (terrain cover). Returns damage dealt; dead units take none.
    pub fn take_damage_with_bonus(&mut self, raw: u32, bonus_defense: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let actual = self.mitigate(raw, bonus_defense);
        self.current_hp = self.current_hp.saturating_sub(actual);
        actual
    }

    /// Lose exactly `amount` HP, ignoring defense. Returns HP lost.
    pub fn lose_hp(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current_hp);
        self.current_hp -= lost;
        lost
    }

    /// Restore up to `amount` HP. Returns HP restored; dead units stay dead.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let healed = amount.min(self.stats.max_hp - self.current_hp);
        self.current_hp += healed;
        healed
    }

    /// Tiles this unit actually moves when pushed `intended` tiles.
    #[must_use]
    pub fn resolve_push(&self, intended: u32) -> u32 {
        if matches!(self.passive, Some(PassiveTrait::Anchored)) {
            return 0;
        }
        intended.saturating_sub(self.stats.push_resistance)
    }

    /// Coarse movement check: Manhattan distance within move range.
    ///
    /// Real legality also needs [`crate::grid::reachable_tiles`], since
    /// terrain can cost more than one point per tile.
    #[must_use]
    pub fn can_reach(&self, target: GridPos) -> bool {
        self.position.distance(target) <= self.stats.move_range
    }

    /// Basic-attack range check. Never true for the unit's own tile.
    #[must_use]
    pub fn can_attack(&self, target: GridPos) -> bool {
        let d = self.position.distance(target);
        d > 0 && d <= self.stats.attack_range
    }

    /// Add a temporary modifier. Zero-duration modifiers are ignored.
    pub fn add_modifier(&mut self, modifier: StatModifier) {
        if modifier.turns_remaining > 0 {
            self.modifiers.push(modifier);
        }
    }

    /// Turn-start upkeep for this unit's faction: cooldowns and modifiers
    /// tick down, then regeneration applies. Returns HP regenerated.
    pub fn start_turn(&mut self) -> u32 {
        for ability in &mut self.abilities {
            ability.tick();
        }
        for modifier in &mut self.modifiers {
            modifier.turns_remaining = modifier.turns_remaining.saturating_sub(1);
        }
        self.modifiers.retain(|m| m.turns_remaining > 0);

        match self.passive {
            Some(PassiveTrait::Regeneration { amount }) => self.heal(amount),
            _ => 0,
        }
    }
}
