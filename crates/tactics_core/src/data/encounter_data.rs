//! Encounter definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Difficulty, UnitTemplate};
use crate::battlefield::Battlefield;
use crate::error::{BattleError, Result};
use crate::grid::GridPos;
use crate::unit::UnitId;

/// A unit template placed on a starting tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Starting tile as `(x, y)`.
    pub at: (i32, i32),
    /// Unit to spawn there.
    pub unit: UnitTemplate,
}

impl Placement {
    /// Starting tile.
    #[must_use]
    pub const fn position(&self) -> GridPos {
        GridPos::new(self.at.0, self.at.1)
    }
}

/// A complete battle setup: map, both sides and default difficulty.
///
/// # Example RON
///
/// ```ron
/// EncounterData(
///     name: "Bridge Ambush",
///     terrain: [
///         "..F..",
///         ".~~~.",
///         ".....",
///     ],
///     players: [
///         Placement(at: (0, 2), unit: UnitTemplate(name: "Knight", max_hp: 12, move_range: 3, attack_power: 4)),
///     ],
///     enemies: [
///         Placement(at: (4, 0), unit: UnitTemplate(name: "Goblin", max_hp: 8, move_range: 3, attack_power: 3)),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterData {
    /// Display name.
    pub name: String,

    /// Flavour text.
    #[serde(default)]
    pub description: String,

    /// Battlefield glyph rows, top row first.
    pub terrain: Vec<String>,

    /// Player units.
    pub players: Vec<Placement>,

    /// Enemy units, before difficulty scaling.
    pub enemies: Vec<Placement>,

    /// Difficulty used when the caller does not pick one.
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Round limit for automated runs.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

const fn default_max_rounds() -> u32 {
    50
}

impl EncounterData {
    /// Parse an encounter from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::DataParse`] if the text is not a valid
    /// encounter.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Build the battlefield described by [`Self::terrain`].
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::MapParse`] for empty, ragged or unknown rows.
    pub fn battlefield(&self) -> Result<Battlefield> {
        Battlefield::from_rows(self.terrain.as_slice())
    }

    /// Check the encounter without building a battle: the map parses, both
    /// sides have units, every template has HP, and every placement is on
    /// its own passable tile.
    ///
    /// Accepts exactly the encounters [`Battle::from_encounter`] accepts.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    ///
    /// [`Battle::from_encounter`]: crate::battle::Battle::from_encounter
    pub fn validate(&self) -> Result<()> {
        let field = self.battlefield()?;
        if self.players.is_empty() {
            return Err(BattleError::EmptyRoster("player"));
        }
        if self.enemies.is_empty() {
            return Err(BattleError::EmptyRoster("enemy"));
        }

        // Units are spawned players first, with IDs from 1.
        let mut taken: BTreeMap<GridPos, UnitId> = BTreeMap::new();
        for (id, placement) in (1..).zip(self.players.iter().chain(&self.enemies)) {
            placement.unit.check()?;
            let pos = placement.position();
            if !field.is_valid_tile(pos) {
                return Err(BattleError::InvalidPlacement {
                    pos,
                    reason: "tile is off the battlefield",
                });
            }
            if !field.is_passable(pos) {
                return Err(BattleError::InvalidPlacement {
                    pos,
                    reason: "tile is not passable",
                });
            }
            if let Some(&occupant) = taken.get(&pos) {
                return Err(BattleError::TileOccupied { pos, occupant });
            }
            taken.insert(pos, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIRMISH: &str = r#"
        EncounterData(
            name: "Skirmish",
            terrain: [
                "..F.",
                ".~..",
                "....",
            ],
            players: [
                Placement(at: (0, 2), unit: UnitTemplate(name: "Knight", max_hp: 12, move_range: 3, attack_power: 4)),
            ],
            enemies: [
                Placement(at: (3, 0), unit: UnitTemplate(name: "Goblin", max_hp: 8, move_range: 3, attack_power: 3)),
            ],
            difficulty: Hard,
        )
    "#;

    #[test]
    fn test_parse_encounter() {
        let encounter = EncounterData::from_ron_str(SKIRMISH).unwrap();
        assert_eq!(encounter.name, "Skirmish");
        assert_eq!(encounter.difficulty, Difficulty::Hard);
        assert_eq!(encounter.max_rounds, 50);
        assert_eq!(encounter.players[0].position(), GridPos::new(0, 2));

        let field = encounter.battlefield().unwrap();
        assert_eq!((field.width(), field.height()), (4, 3));
        assert!(encounter.validate().is_ok());
    }

    #[test]
    fn test_malformed_ron_is_data_error() {
        let err = EncounterData::from_ron_str("EncounterData(name: ").unwrap_err();
        assert!(matches!(err, BattleError::DataParse(_)));
    }

    #[test]
    fn test_validate_rejects_placement_in_water() {
        let mut encounter = EncounterData::from_ron_str(SKIRMISH).unwrap();
        encounter.enemies[0].at = (1, 1);
        assert!(matches!(
            encounter.validate(),
            Err(BattleError::InvalidPlacement { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_shared_tile() {
        let mut encounter = EncounterData::from_ron_str(SKIRMISH).unwrap();
        encounter.enemies[0].at = encounter.players[0].at;
        assert!(matches!(
            encounter.validate(),
            Err(BattleError::TileOccupied { occupant: 1, .. })
        ));
        assert!(matches!(
            crate::battle::Battle::from_encounter(&encounter, Difficulty::Normal),
            Err(BattleError::TileOccupied { occupant: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_hp_template() {
        let mut encounter = EncounterData::from_ron_str(SKIRMISH).unwrap();
        encounter.players[0].unit.max_hp = 0;
        assert!(matches!(
            encounter.validate(),
            Err(BattleError::InvalidTemplate { .. })
        ));

        let mut encounter = EncounterData::from_ron_str(SKIRMISH).unwrap();
        encounter.enemies[0].unit.max_hp = 0;
        assert!(encounter.validate().is_err());
        for difficulty in Difficulty::ALL {
            assert!(matches!(
                crate::battle::Battle::from_encounter(&encounter, difficulty),
                Err(BattleError::InvalidTemplate { .. })
            ));
        }
    }

    #[test]
    fn test_validate_rejects_empty_side() {
        let mut encounter = EncounterData::from_ron_str(SKIRMISH).unwrap();
        encounter.enemies.clear();
        assert!(matches!(
            encounter.validate(),
            Err(BattleError::EmptyRoster("enemy"))
        ));
    }
}
