//! Terrain kinds and their lookup tables.
//!
//! Every kind has a fully defined movement cost, passability and combat
//! modifier set. Tables are exhaustive matches so adding a kind forces
//! every lookup to be revisited.

use serde::{Deserialize, Serialize};

/// Fixed damage dealt by hazard tiles at the end of the occupant's turn.
pub const HAZARD_DAMAGE: u32 = 2;

/// Terrain kind of a single battlefield tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Plain ground (cost: 1).
    #[default]
    Open,
    /// Woods - slow to cross, grants cover to defenders.
    Forest,
    /// High ground - grants an attack bonus to units attacking from it.
    Elevated,
    /// Burning or toxic ground that hurts whoever ends a turn on it.
    Hazard,
    /// Deep liquid. Never passable.
    Water,
    /// Rubble, mud or brush (cost: 2).
    Difficult,
    /// Ice or oil - pushed units slide one extra tile.
    Slippery,
    /// Not part of the map. Used to carve non-rectangular battlefields.
    OffMap,
}

impl TerrainKind {
    /// All terrain kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Open,
        Self::Forest,
        Self::Elevated,
        Self::Hazard,
        Self::Water,
        Self::Difficult,
        Self::Slippery,
        Self::OffMap,
    ];

    /// Returns the movement cost for entering a tile of this kind.
    /// Returns `None` for impassable kinds.
    #[must_use]
    pub const fn movement_cost(self) -> Option<u32> {
        match self {
            Self::Open | Self::Elevated | Self::Hazard | Self::Slippery => Some(1),
            Self::Forest | Self::Difficult => Some(2),
            Self::Water | Self::OffMap => None,
        }
    }

    /// Returns true if units may enter or stand on this kind.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        self.movement_cost().is_some()
    }

    /// Defense bonus for a unit defending while standing here.
    #[must_use]
    pub const fn defense_bonus(self) -> u32 {
        match self {
            Self::Forest => 1,
            _ => 0,
        }
    }

    /// Attack bonus for a unit attacking while standing here.
    #[must_use]
    pub const fn attack_bonus(self) -> u32 {
        match self {
            Self::Elevated => 1,
            _ => 0,
        }
    }

    /// Damage dealt to an occupant at the end of its turn.
    #[must_use]
    pub const fn hazard_damage(self) -> u32 {
        match self {
            Self::Hazard => HAZARD_DAMAGE,
            _ => 0,
        }
    }

    /// Whether a pushed unit keeps sliding one extra tile after stopping here.
    #[must_use]
    pub const fn slides_on_push(self) -> bool {
        matches!(self, Self::Slippery)
    }

    /// Map glyph used by encounter files and ASCII rendering.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Open => '.',
            Self::Forest => 'F',
            Self::Elevated => '^',
            Self::Hazard => 'H',
            Self::Water => '~',
            Self::Difficult => ':',
            Self::Slippery => '=',
            Self::OffMap => '#',
        }
    }

    /// Parse a map glyph. A space is accepted as an alias for off-map.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Open),
            'F' => Some(Self::Forest),
            '^' => Some(Self::Elevated),
            'H' => Some(Self::Hazard),
            '~' => Some(Self::Water),
            ':' => Some(Self::Difficult),
            '=' => Some(Self::Slippery),
            '#' | ' ' => Some(Self::OffMap),
            _ => None,
        }
    }
}
