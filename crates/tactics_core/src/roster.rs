//! Storage for every unit in a battle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::unit::{Faction, Unit, UnitId};

/// Id-keyed unit storage.
///
/// Iteration is always in ascending id order, which doubles as spawn
/// order. Dead units remain stored until [`UnitRoster::cleanup_dead`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRoster {
    /// Map of unit ID to unit data.
    units: BTreeMap<UnitId, Unit>,
    /// Next unit ID to assign.
    next_id: UnitId,
}

impl UnitRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new unit and return its ID.
    pub fn insert(&mut self, mut unit: Unit) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        unit.id = id;
        self.units.insert(id, unit);
        id
    }

    /// Remove a unit by ID.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by ID.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists (alive or not).
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of stored units, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit IDs in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Iterate over all units in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Iterate mutably over all units in ID order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// IDs of living units of one faction, in ID order.
    #[must_use]
    pub fn living(&self, faction: Faction) -> Vec<UnitId> {
        self.iter()
            .filter(|u| u.is_alive() && u.faction == faction)
            .map(|u| u.id)
            .collect()
    }

    /// True if any unit of the faction is alive.
    #[must_use]
    pub fn any_alive(&self, faction: Faction) -> bool {
        self.iter().any(|u| u.is_alive() && u.faction == faction)
    }

    /// The living unit standing on `pos`, if any.
    #[must_use]
    pub fn unit_at(&self, pos: GridPos) -> Option<&Unit> {
        self.iter().find(|u| u.is_alive() && u.position == pos)
    }

    /// Tiles held by living units, optionally ignoring one unit.
    #[must_use]
    pub fn occupied_tiles(&self, except: Option<UnitId>) -> BTreeSet<GridPos> {
        self.iter()
            .filter(|u| u.is_alive() && Some(u.id) != except)
            .map(|u| u.position)
            .collect()
    }

    /// Remove every dead unit. Returns removed IDs; repeated calls are no-ops.
    pub fn cleanup_dead(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id)
            .collect();
        for id in &dead {
            self.units.remove(id);
        }
        dead
    }
}

impl Default for UnitRoster {
    fn default() -> Self {
        Self::new()
    }
}
