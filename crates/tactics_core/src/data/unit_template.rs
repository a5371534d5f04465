//! Unit templates for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityDef, AbilityInstance, EffectKind, TargetingMode};
use crate::error::{BattleError, Result};
use crate::grid::GridPos;
use crate::unit::{Faction, PassiveTrait, Unit, UnitStats};

/// Data-driven ability definition.
///
/// Mirrors [`AbilityDef`] with defaults for every optional field.
///
/// # Example RON
///
/// ```ron
/// AbilityData(
///     name: "Shield Bash",
///     targeting: SingleEnemy,
///     effect: Push,
///     power: 1,
///     push_distance: 2,
///     cooldown: 2,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityData {
    /// Display name.
    pub name: String,
    /// Target selection mode.
    pub targeting: TargetingMode,
    /// Effect applied on use.
    pub effect: EffectKind,
    /// Damage, heal or modifier magnitude.
    #[serde(default)]
    pub power: u32,
    /// Maximum distance to the target tile.
    #[serde(default = "default_range")]
    pub range: u32,
    /// Turns of cooldown after use.
    #[serde(default)]
    pub cooldown: u32,
    /// Radius of area abilities.
    #[serde(default)]
    pub area_radius: u32,
    /// Intended push/pull distance.
    #[serde(default)]
    pub push_distance: u32,
    /// Buff/debuff lifetime in owner turns.
    #[serde(default = "default_duration")]
    pub duration: u32,
}

const fn default_range() -> u32 {
    1
}

const fn default_duration() -> u32 {
    1
}

impl AbilityData {
    /// Build the runtime definition.
    #[must_use]
    pub fn to_def(&self) -> AbilityDef {
        AbilityDef::new(self.name.clone(), self.targeting, self.effect, self.power)
            .with_range(self.range)
            .with_cooldown(self.cooldown)
            .with_area(self.area_radius)
            .with_push(self.push_distance)
            .with_duration(self.duration)
    }
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitTemplate(
///     name: "Knight",
///     max_hp: 14,
///     move_range: 3,
///     attack_range: 1,
///     attack_power: 4,
///     defense: 1,
///     passive: Some(Thorns(damage: 1)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Display name.
    pub name: String,

    /// Maximum hit points.
    pub max_hp: u32,

    /// Movement points per turn.
    pub move_range: u32,

    /// Basic attack range.
    #[serde(default = "default_range")]
    pub attack_range: u32,

    /// Basic attack damage.
    pub attack_power: u32,

    /// Flat damage reduction.
    #[serde(default)]
    pub defense: u32,

    /// Tiles subtracted from pushes.
    #[serde(default)]
    pub push_resistance: u32,

    /// Abilities in slot order.
    #[serde(default)]
    pub abilities: Vec<AbilityData>,

    /// Optional passive trait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive: Option<PassiveTrait>,
}

impl UnitTemplate {
    /// Template with the given name and default stats.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let stats = UnitStats::default();
        Self {
            name: name.into(),
            max_hp: stats.max_hp,
            move_range: stats.move_range,
            attack_range: stats.attack_range,
            attack_power: stats.attack_power,
            defense: stats.defense,
            push_resistance: stats.push_resistance,
            abilities: Vec::new(),
            passive: None,
        }
    }

    /// Base statistics described by this template.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        UnitStats {
            max_hp: self.max_hp,
            move_range: self.move_range,
            attack_range: self.attack_range,
            attack_power: self.attack_power,
            defense: self.defense,
            push_resistance: self.push_resistance,
        }
    }

    /// Check that the template describes a unit that starts alive.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::InvalidTemplate`] for a template with no HP.
    pub fn check(&self) -> Result<()> {
        if self.max_hp == 0 {
            return Err(BattleError::InvalidTemplate {
                name: self.name.clone(),
                reason: "max_hp must be at least 1",
            });
        }
        Ok(())
    }

    /// Create a full-health unit from this template. The roster assigns
    /// its ID.
    #[must_use]
    pub fn instantiate(&self, faction: Faction, position: GridPos) -> Unit {
        let abilities = self
            .abilities
            .iter()
            .map(|data| AbilityInstance::new(data.to_def()));
        let unit = Unit::new(self.name.clone(), faction, position, self.stats()).with_abilities(abilities);
        match self.passive {
            Some(passive) => unit.with_passive(passive),
            None => unit,
        }
    }
}
