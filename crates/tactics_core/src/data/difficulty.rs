//! Enemy difficulty scaling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UnitTemplate;
use crate::error::BattleError;

/// How hard the enemy side hits.
///
/// Scaling is applied to enemy templates only, once, when a battle is
/// built from an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// 75% HP, -1 attack.
    Easy,
    /// Templates as written.
    #[default]
    Normal,
    /// 125% HP, +1 attack.
    Hard,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Hard];

    /// Scale an enemy template.
    #[must_use]
    pub fn scale(self, template: &UnitTemplate) -> UnitTemplate {
        let mut scaled = template.clone();
        match self {
            Self::Easy => {
                scaled.max_hp = (template.max_hp.saturating_mul(3) / 4).max(1);
                scaled.attack_power = template.attack_power.saturating_sub(1);
            }
            Self::Normal => {}
            Self::Hard => {
                scaled.max_hp = template.max_hp.saturating_mul(5) / 4;
                scaled.attack_power = template.attack_power.saturating_add(1);
            }
        }
        scaled
    }

    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BattleError::UnknownDifficulty(s.to_string()))
    }
}
