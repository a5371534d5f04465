//! Integer tile coordinates and grid queries.
//!
//! Distances are Manhattan (4-connected). Reachability uses a FIFO flood
//! fill that relaxes each tile on the best remaining movement budget, so
//! terrain cost is respected without a priority queue.
//!
//! # Occupancy
//!
//! Occupied tiles block transit as well as landing: a unit can never path
//! through a tile another living unit stands on.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;

/// Tile coordinate on a battlefield.
///
/// Coordinates are signed so that out-of-bounds queries are representable;
/// the battlefield treats them as off-map. Ordering is row-major
/// (`y` first, then `x`), which is the stable order used for every
/// tie-break in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub const fn distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The tile offset by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbours in N, E, S, W order.
    #[must_use]
    pub fn neighbours(self) -> [Self; 4] {
        NEIGHBOUR_OFFSETS.map(|(dx, dy)| self.offset(dx, dy))
    }
}

impl Ord for GridPos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for GridPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Direction offsets for 4-directional movement (N, E, S, W).
const NEIGHBOUR_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Manhattan distance, `|ax-bx| + |ay-by|`.
#[inline]
#[must_use]
pub const fn distance(a: GridPos, b: GridPos) -> u32 {
    a.distance(b)
}

/// All valid tiles within `radius` of `center`, excluding `center`.
///
/// Tiles outside the battlefield or tagged off-map are never returned.
/// Passability is not checked; this is the range query used for attacks.
#[must_use]
pub fn tiles_in_range(field: &Battlefield, center: GridPos, radius: u32) -> BTreeSet<GridPos> {
    // Nothing beyond width + height can be on the map.
    let r = radius.min(field.width() + field.height()) as i32;
    let mut tiles = BTreeSet::new();

    for dy in -r..=r {
        let span = r - dy.abs();
        for dx in -span..=span {
            if dx == 0 && dy == 0 {
                continue;
            }
            let pos = center.offset(dx, dy);
            if field.is_valid_tile(pos) {
                tiles.insert(pos);
            }
        }
    }

    tiles
}

/// Terrain-aware reachability from `start` with `budget` movement points.
///
/// Each visited tile records the largest remaining budget it was reached
/// with. A neighbour is enqueued only if it is passable, not in `occupied`,
/// affordable, and reached with strictly more budget than before. The
/// queue is FIFO so the search order is reproducible; the resulting set
/// does not depend on that order.
///
/// The start tile is never part of the result.
#[must_use]
pub fn reachable_tiles(
    field: &Battlefield,
    start: GridPos,
    budget: u32,
    occupied: &BTreeSet<GridPos>,
) -> BTreeSet<GridPos> {
    let mut best_remaining: HashMap<GridPos, u32> = HashMap::new();
    let mut queue: VecDeque<(GridPos, u32)> = VecDeque::new();

    best_remaining.insert(start, budget);
    queue.push_back((start, budget));

    while let Some((current, remaining)) = queue.pop_front() {
        // A better entry for this tile was queued after this one.
        if best_remaining.get(&current).copied() != Some(remaining) {
            continue;
        }

        for next in current.neighbours() {
            if occupied.contains(&next) {
                continue;
            }
            let Some(cost) = field.movement_cost(next) else {
                continue;
            };
            let Some(left) = remaining.checked_sub(cost) else {
                continue;
            };
            let improves = best_remaining.get(&next).map_or(true, |&prev| left > prev);
            if improves {
                best_remaining.insert(next, left);
                queue.push_back((next, left));
            }
        }
    }

    best_remaining.remove(&start);
    best_remaining.into_keys().collect()
}

/// Unit step along the dominant axis from `from` toward `to`.
///
/// Ties between axes resolve to the horizontal axis. Returns `None` when
/// both tiles are the same.
#[must_use]
pub fn dominant_direction(from: GridPos, to: GridPos) -> Option<(i32, i32)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() >= dy.abs() {
        Some((dx.signum(), 0))
    } else {
        Some((0, dy.signum()))
    }
}

/// Tiles strictly after `from` up to and including `to`, if both share a
/// row or column.
#[must_use]
pub fn line_between(from: GridPos, to: GridPos) -> Option<Vec<GridPos>> {
    if from == to || (from.x != to.x && from.y != to.y) {
        return None;
    }
    let (dx, dy) = dominant_direction(from, to)?;
    let steps = from.distance(to) as i32;
    Some((1..=steps).map(|i| from.offset(dx * i, dy * i)).collect())
}
