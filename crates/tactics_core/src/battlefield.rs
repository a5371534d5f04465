//! The battlefield terrain grid.
//!
//! A dense, row-major grid of [`TerrainKind`]. Non-rectangular maps are
//! carved out with [`TerrainKind::OffMap`]. Every query is total: anything
//! outside the bounds reads as off-map.

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};
use crate::grid::GridPos;
use crate::terrain::TerrainKind;

/// Terrain grid for one encounter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battlefield {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Tile data stored in row-major order.
    tiles: Vec<TerrainKind>,
}

impl Battlefield {
    /// Create a new battlefield with every tile open.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Battlefield width must be positive");
        assert!(height > 0, "Battlefield height must be positive");

        let tile_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![TerrainKind::Open; tile_count],
        }
    }

    /// Parse a battlefield from glyph rows (see [`TerrainKind::glyph`]).
    ///
    /// All rows must have the same length.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::MapParse`] for an empty map, ragged rows or
    /// an unknown glyph.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(BattleError::MapParse {
                row: 0,
                column: 0,
                message: "battlefield has no rows".into(),
            });
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(BattleError::MapParse {
                row: 0,
                column: 0,
                message: "battlefield has no columns".into(),
            });
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let len = line.chars().count();
            if len != width {
                return Err(BattleError::MapParse {
                    row,
                    column: len.min(width),
                    message: format!("expected {width} columns, found {len}"),
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let kind = TerrainKind::from_glyph(glyph).ok_or_else(|| BattleError::MapParse {
                    row,
                    column,
                    message: format!("unknown terrain glyph '{glyph}'"),
                })?;
                tiles.push(kind);
            }
        }

        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            tiles,
        })
    }

    /// Render the battlefield back to glyph rows.
    #[must_use]
    pub fn render_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|kind| kind.glyph()).collect())
            .collect()
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Convert a tile coordinate to a grid index, if in bounds.
    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y as usize) * (self.width as usize) + (pos.x as usize))
        } else {
            None
        }
    }

    /// Check if a coordinate is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Terrain at a tile. Out-of-bounds tiles read as [`TerrainKind::OffMap`].
    #[must_use]
    pub fn terrain_at(&self, pos: GridPos) -> TerrainKind {
        self.index(pos)
            .map_or(TerrainKind::OffMap, |index| self.tiles[index])
    }

    /// Set terrain at a tile.
    /// Returns `false` if out of bounds.
    pub fn set_terrain(&mut self, pos: GridPos, kind: TerrainKind) -> bool {
        match self.index(pos) {
            Some(index) => {
                self.tiles[index] = kind;
                true
            }
            None => false,
        }
    }

    /// Fill every in-bounds tile of a rectangle with one terrain kind.
    pub fn fill_rect(&mut self, origin: GridPos, width: u32, height: u32, kind: TerrainKind) {
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                self.set_terrain(origin.offset(dx, dy), kind);
            }
        }
    }

    /// In bounds and not off-map.
    #[must_use]
    pub fn is_valid_tile(&self, pos: GridPos) -> bool {
        self.terrain_at(pos) != TerrainKind::OffMap
    }

    /// Valid and passable terrain.
    #[must_use]
    pub fn is_passable(&self, pos: GridPos) -> bool {
        self.terrain_at(pos).is_passable()
    }

    /// Movement cost for entering a tile.
    /// Returns `None` for impassable or out-of-bounds tiles.
    #[must_use]
    pub fn movement_cost(&self, pos: GridPos) -> Option<u32> {
        self.terrain_at(pos).movement_cost()
    }

    /// Attack bonus for a unit attacking from `pos`.
    #[must_use]
    pub fn attack_bonus_at(&self, pos: GridPos) -> u32 {
        self.terrain_at(pos).attack_bonus()
    }

    /// Defense bonus for a unit defending on `pos`.
    #[must_use]
    pub fn defense_bonus_at(&self, pos: GridPos) -> u32 {
        self.terrain_at(pos).defense_bonus()
    }

    /// End-of-turn damage for a unit standing on `pos`.
    #[must_use]
    pub fn hazard_damage_at(&self, pos: GridPos) -> u32 {
        self.terrain_at(pos).hazard_damage()
    }

    /// All valid (in-bounds, on-map) tiles in row-major order.
    pub fn valid_tiles(&self) -> impl Iterator<Item = GridPos> + '_ {
        let width = self.width as usize;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, kind)| **kind != TerrainKind::OffMap)
            .map(move |(index, _)| GridPos::new((index % width) as i32, (index / width) as i32))
    }
}

impl Default for Battlefield {
    /// Create a default 8x8 open battlefield.
    fn default() -> Self {
        Self::new(8, 8)
    }
}
