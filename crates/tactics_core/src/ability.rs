//! Ability definitions and per-unit cooldown state.

use serde::{Deserialize, Serialize};

use crate::terrain::TerrainKind;

/// How an ability picks its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingMode {
    /// The caster's own tile.
    SelfTarget,
    /// One living opposing unit.
    SingleEnemy,
    /// One living friendly unit other than the caster.
    SingleAlly,
    /// Any living unit other than the caster.
    SingleUnit,
    /// Any valid tile.
    Tile,
    /// Every unit on a straight row/column segment from the caster.
    Line,
    /// Every unit within `area_radius` of a target tile.
    Area,
}

/// What an ability does to whatever it affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Deal `power` damage, reduced by defense.
    Damage,
    /// Restore `power` HP.
    Heal,
    /// Deal `power` damage, then shove away from the caster.
    Push,
    /// Deal `power` damage, then drag toward the caster.
    Pull,
    /// Relocate the caster to the target tile.
    Dash,
    /// Raise attack by `power` for `duration` turns.
    Buff,
    /// Lower defense by `power` for `duration` turns.
    Debuff,
    /// Turn the affected tiles into the given terrain.
    CreateTerrain(TerrainKind),
}

/// Static ability definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Display name.
    pub name: String,
    /// Maximum Manhattan distance to the target tile.
    pub range: u32,
    /// Turns the ability stays unavailable after use.
    pub cooldown: u32,
    /// Target selection mode.
    pub targeting: TargetingMode,
    /// Effect applied to each affected unit or tile.
    pub effect: EffectKind,
    /// Damage, heal or modifier magnitude.
    pub power: u32,
    /// Radius around the target tile for [`TargetingMode::Area`].
    pub area_radius: u32,
    /// Intended displacement for push and pull effects.
    pub push_distance: u32,
    /// Lifetime of buff and debuff modifiers, in owner turns.
    pub duration: u32,
}

impl AbilityDef {
    /// Create a new ability definition with no area, push or duration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        targeting: TargetingMode,
        effect: EffectKind,
        power: u32,
    ) -> Self {
        Self {
            name: name.into(),
            range: 1,
            cooldown: 0,
            targeting,
            effect,
            power,
            area_radius: 0,
            push_distance: 0,
            duration: 1,
        }
    }

    /// Builder method to set range.
    #[must_use]
    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    /// Builder method to set cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Builder method to set area radius.
    #[must_use]
    pub fn with_area(mut self, radius: u32) -> Self {
        self.area_radius = radius;
        self
    }

    /// Builder method to set push distance.
    #[must_use]
    pub fn with_push(mut self, distance: u32) -> Self {
        self.push_distance = distance;
        self
    }

    /// Builder method to set modifier duration.
    #[must_use]
    pub fn with_duration(mut self, turns: u32) -> Self {
        self.duration = turns;
        self
    }
}

/// An ability owned by a unit, with its cooldown counter.
///
/// The counter stays in `0..=def.cooldown`; the ability is ready at 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityInstance {
    /// Static definition.
    pub def: AbilityDef,
    /// Turns until the ability is ready again.
    cooldown_remaining: u32,
}

impl AbilityInstance {
    /// Create a ready instance of an ability.
    #[must_use]
    pub const fn new(def: AbilityDef) -> Self {
        Self {
            def,
            cooldown_remaining: 0,
        }
    }

    /// Turns until ready.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    /// True when the ability can be used.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cooldown_remaining == 0
    }

    /// Start the cooldown after a use.
    pub fn trigger(&mut self) {
        self.cooldown_remaining = self.def.cooldown;
    }

    /// Advance the cooldown by one owner turn.
    pub fn tick(&mut self) {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
    }
}

impl From<AbilityDef> for AbilityInstance {
    fn from(def: AbilityDef) -> Self {
        Self::new(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fireball() -> AbilityDef {
        AbilityDef::new("Fireball", TargetingMode::Area, EffectKind::Damage, 3)
            .with_range(4)
            .with_cooldown(2)
            .with_area(1)
    }

    #[test]
    fn test_builder() {
        let def = fireball();
        assert_eq!(def.range, 4);
        assert_eq!(def.cooldown, 2);
        assert_eq!(def.area_radius, 1);
        assert_eq!(def.duration, 1);
    }

    #[test]
    fn test_cooldown_cycle() {
        let mut ability = AbilityInstance::new(fireball());
        assert!(ability.is_ready());

        ability.trigger();
        assert_eq!(ability.cooldown_remaining(), 2);
        assert!(!ability.is_ready());

        ability.tick();
        assert_eq!(ability.cooldown_remaining(), 1);
        ability.tick();
        assert!(ability.is_ready());

        // Never drops below zero.
        ability.tick();
        assert_eq!(ability.cooldown_remaining(), 0);
    }

    #[test]
    fn test_zero_cooldown_always_ready() {
        let mut ability = AbilityInstance::new(
            AbilityDef::new("Jab", TargetingMode::SingleEnemy, EffectKind::Damage, 1),
        );
        ability.trigger();
        assert!(ability.is_ready());
    }
}
