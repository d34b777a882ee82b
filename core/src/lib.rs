#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Geo Merge engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing player intent (moving, clicking a cell), the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values describing every cell that was spawned, evicted or mutated.
//! Systems consume immutable snapshots and respond with new commands.

mod config;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::{ConfigError, GameConfig};

/// Number of ranks in the value table that cells can be seeded from (2..=2048).
pub const VALUE_TABLE_LEN: u8 = 11;

/// Salt used when deciding whether a coordinate hosts a cell at all.
pub const SPAWN_SALT: &str = "initialValue";

/// Salt used when selecting the value rank of a freshly spawned cell.
pub const VALUE_SALT: &str = "valueGenerator";

/// Largest number of coordinates a load window may cover.
pub const MAX_WINDOW_CELLS: u64 = 1 << 20;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Teleports the player to the provided geographic position.
    SetPlayerPosition {
        /// Position reported by the movement or geolocation collaborator.
        position: GeoPoint,
    },
    /// Moves the player by exactly one cell in the provided direction.
    MovePlayer {
        /// Direction of travel for the step.
        direction: Direction,
    },
    /// Overrides the geographic region used to derive the load window.
    ///
    /// `None` restores the default neighbourhood centred on the player.
    SetViewport {
        /// Viewport bounds reported by the map collaborator.
        bounds: Option<GeoBounds>,
    },
    /// Reports that the player clicked the cell anchored at `coord`.
    ClickCell {
        /// Grid coordinate of the clicked cell.
        coord: GridCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the player position changed.
    PlayerMoved {
        /// Position occupied before the move.
        from: GeoPoint,
        /// Position occupied after the move.
        to: GeoPoint,
    },
    /// Announces that the set of materialised coordinates changed shape.
    WindowChanged {
        /// Inclusive coordinate rectangle that is now loaded.
        window: CellWindow,
    },
    /// Confirms that a cell was materialised inside the load window.
    CellSpawned {
        /// Coordinate of the new cell.
        coord: GridCoord,
        /// Value the cell was seeded with.
        value: CellValue,
        /// Whether the value came from the overlay or the generator.
        source: SeedSource,
        /// Whether the cell is within collection range of the player.
        in_range: bool,
    },
    /// Confirms that a cell left the load window and was released.
    CellEvicted {
        /// Coordinate of the released cell.
        coord: GridCoord,
    },
    /// Reports that a loaded cell entered or left collection range.
    CellRangeChanged {
        /// Coordinate of the affected cell.
        coord: GridCoord,
        /// Range status after the recalculation.
        in_range: bool,
    },
    /// The held token matched the cell and both combined into the hand.
    TokenMerged {
        /// Coordinate of the cell that was emptied.
        coord: GridCoord,
        /// Doubled token now held by the player.
        token: Token,
    },
    /// The player picked the cell's token up with an empty hand.
    TokenPickedUp {
        /// Coordinate of the cell that was emptied.
        coord: GridCoord,
        /// Token moved into the player's hand.
        token: Token,
    },
    /// The player dropped the held token into an empty cell.
    TokenPlaced {
        /// Coordinate of the cell that received the token.
        coord: GridCoord,
        /// Token moved out of the player's hand.
        token: Token,
    },
    /// Reports the player's held token after an exchange settled.
    HeldTokenChanged {
        /// Token held after the exchange, `None` when empty-handed.
        held: Option<Token>,
    },
    /// The held token reached the win threshold.
    GameWon {
        /// Token that crossed the threshold before the hand was reset.
        token: Token,
    },
    /// A click was accepted as input but produced no state change.
    ClickIgnored {
        /// Coordinate named by the click.
        coord: GridCoord,
        /// Why the click was a no-op.
        reason: ClickIgnoredReason,
    },
}

/// Reasons a click may resolve to a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickIgnoredReason {
    /// No loaded cell exists at the clicked coordinate.
    NotLoaded,
    /// The cell is farther from the player than the collection range.
    OutOfRange,
    /// Held token and cell value match none of the exchange rules.
    NoTransition,
}

/// Origin of the value a cell was seeded with when it spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedSource {
    /// The overlay remembered an earlier interaction at this coordinate.
    Overlay,
    /// The deterministic generator produced the value.
    Generated,
}

/// Cardinal movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing latitude.
    North,
    /// Movement toward increasing longitude.
    East,
    /// Movement toward decreasing latitude.
    South,
    /// Movement toward decreasing longitude.
    West,
}

impl Direction {
    /// Offset of a single step expressed in whole cells as `(lat, lng)`.
    #[must_use]
    pub const fn cell_offset(self) -> (i64, i64) {
        match self {
            Self::North => (1, 0),
            Self::East => (0, 1),
            Self::South => (-1, 0),
            Self::West => (0, -1),
        }
    }
}

/// Power-of-two token carried by cells and by the player.
///
/// Tokens are stored by rank so that `value == 2 << rank`; rank zero is the
/// smallest token (2). The rank doubles as the index into the value and
/// colour tables, so no reverse lookup is ever needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    rank: u8,
}

impl Token {
    /// Largest representable rank; its value still fits in a `u32`.
    pub const MAX_RANK: u8 = 30;

    /// Smallest token (value 2).
    pub const MIN: Self = Self { rank: 0 };

    /// Creates a token from its rank, rejecting ranks above [`Self::MAX_RANK`].
    #[must_use]
    pub const fn from_rank(rank: u8) -> Option<Self> {
        if rank <= Self::MAX_RANK {
            Some(Self { rank })
        } else {
            None
        }
    }

    /// Creates a token from its rank, clamping to [`Self::MAX_RANK`].
    #[must_use]
    pub const fn saturating_from_rank(rank: u8) -> Self {
        if rank <= Self::MAX_RANK {
            Self { rank }
        } else {
            Self {
                rank: Self::MAX_RANK,
            }
        }
    }

    /// Creates a token from its numeric value.
    ///
    /// Returns `None` unless `value` is a power of two no smaller than 2.
    #[must_use]
    pub fn from_value(value: u32) -> Option<Self> {
        if value < 2 || !value.is_power_of_two() {
            return None;
        }
        let rank = u8::try_from(value.trailing_zeros() - 1).ok()?;
        Self::from_rank(rank)
    }

    /// Rank of the token within the value table.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// Numeric value of the token.
    #[must_use]
    pub const fn value(self) -> u32 {
        2 << self.rank
    }

    /// Token produced by merging two copies of this token.
    #[must_use]
    pub const fn doubled(self) -> Option<Self> {
        Self::from_rank(self.rank + 1)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Contents of a cell: either a token or nothing (the numeric value 0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellValue(Option<Token>);

impl CellValue {
    /// A cell holding no token.
    pub const EMPTY: Self = Self(None);

    /// Creates a cell value holding the provided token.
    #[must_use]
    pub const fn holding(token: Token) -> Self {
        Self(Some(token))
    }

    /// Token stored in the cell, if any.
    #[must_use]
    pub const fn token(self) -> Option<Token> {
        self.0
    }

    /// Numeric value of the cell, 0 when empty.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self.0 {
            Some(token) => token.value(),
            None => 0,
        }
    }

    /// Reports whether the cell holds no token.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<Token>> for CellValue {
    fn from(token: Option<Token>) -> Self {
        Self(token)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Geographic position expressed in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a new geographic position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reports whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Returns the point shifted by the provided deltas.
    #[must_use]
    pub fn offset(self, delta_lat: f64, delta_lng: f64) -> Self {
        Self::new(self.lat + delta_lat, self.lng + delta_lng)
    }

    /// Euclidean distance in coordinate space.
    ///
    /// This is not a geodesic distance; the extents involved are small enough
    /// that the planar approximation is adequate.
    #[must_use]
    pub fn distance_to(self, other: GeoPoint) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

/// Axis-aligned geographic rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    south_west: GeoPoint,
    north_east: GeoPoint,
}

impl GeoBounds {
    /// Creates bounds spanning two opposite corners in any order.
    #[must_use]
    pub fn new(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            south_west: GeoPoint::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: GeoPoint::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Creates bounds centred on `center` extending the half spans each way.
    #[must_use]
    pub fn around(center: GeoPoint, half_lat: f64, half_lng: f64) -> Self {
        Self::new(
            center.offset(-half_lat, -half_lng),
            center.offset(half_lat, half_lng),
        )
    }

    /// Corner with the smallest latitude and longitude.
    #[must_use]
    pub const fn south_west(&self) -> GeoPoint {
        self.south_west
    }

    /// Corner with the largest latitude and longitude.
    #[must_use]
    pub const fn north_east(&self) -> GeoPoint {
        self.north_east
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Reports whether both corners are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.south_west.is_finite() && self.north_east.is_finite()
    }
}

/// Integer coordinate of a grid cell on the infinite plane.
///
/// Cell `(i, j)` covers `lat ∈ [i·S, (i+1)·S)` and `lng ∈ [j·S, (j+1)·S)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    i: i64,
    j: i64,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }

    /// Latitude index of the cell.
    #[must_use]
    pub const fn i(&self) -> i64 {
        self.i
    }

    /// Longitude index of the cell.
    #[must_use]
    pub const fn j(&self) -> i64 {
        self.j
    }

    /// Coordinate of the cell containing `point`.
    #[must_use]
    pub fn containing(point: GeoPoint, cell_size: f64) -> Self {
        Self::new(grid_index(point.lat, cell_size), grid_index(point.lng, cell_size))
    }

    /// Returns the coordinate shifted by whole cells.
    #[must_use]
    pub const fn offset(self, delta_i: i64, delta_j: i64) -> Self {
        Self::new(
            self.i.saturating_add(delta_i),
            self.j.saturating_add(delta_j),
        )
    }

    /// Geographic rectangle covered by the cell.
    #[must_use]
    pub fn bounds(self, cell_size: f64) -> GeoBounds {
        let south = self.i as f64 * cell_size;
        let west = self.j as f64 * cell_size;
        GeoBounds::new(
            GeoPoint::new(south, west),
            GeoPoint::new(south + cell_size, west + cell_size),
        )
    }

    /// Geographic centre of the cell.
    #[must_use]
    pub fn center(self, cell_size: f64) -> GeoPoint {
        GeoPoint::new(
            (self.i as f64 + 0.5) * cell_size,
            (self.j as f64 + 0.5) * cell_size,
        )
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

fn grid_index(degrees: f64, cell_size: f64) -> i64 {
    // `as` saturates on overflow and maps NaN to zero.
    (degrees / cell_size).floor() as i64
}

/// Inclusive rectangle of grid coordinates that should be materialised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellWindow {
    min: GridCoord,
    max: GridCoord,
}

impl CellWindow {
    /// Creates a window spanning two opposite corners in any order.
    #[must_use]
    pub fn new(a: GridCoord, b: GridCoord) -> Self {
        Self {
            min: GridCoord::new(a.i().min(b.i()), a.j().min(b.j())),
            max: GridCoord::new(a.i().max(b.i()), a.j().max(b.j())),
        }
    }

    /// Derives the window covering `bounds`, grown by `margin` cells per side.
    #[must_use]
    pub fn covering(bounds: GeoBounds, cell_size: f64, margin: u32) -> Self {
        let margin = i64::from(margin);
        let min = GridCoord::containing(bounds.south_west(), cell_size).offset(-margin, -margin);
        let max = GridCoord::containing(bounds.north_east(), cell_size).offset(margin, margin);
        Self::new(min, max)
    }

    /// Lowest corner of the window.
    #[must_use]
    pub const fn min(&self) -> GridCoord {
        self.min
    }

    /// Highest corner of the window.
    #[must_use]
    pub const fn max(&self) -> GridCoord {
        self.max
    }

    /// Reports whether `coord` lies inside the window.
    #[must_use]
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.i() >= self.min.i()
            && coord.i() <= self.max.i()
            && coord.j() >= self.min.j()
            && coord.j() <= self.max.j()
    }

    /// Number of rows spanned along the latitude axis.
    #[must_use]
    pub const fn rows(&self) -> u64 {
        self.max.i().abs_diff(self.min.i()).saturating_add(1)
    }

    /// Number of columns spanned along the longitude axis.
    #[must_use]
    pub const fn columns(&self) -> u64 {
        self.max.j().abs_diff(self.min.j()).saturating_add(1)
    }

    /// Number of coordinates inside the window, saturating at `u64::MAX`.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.rows().saturating_mul(self.columns())
    }

    /// Iterates every coordinate in row-major order (ascending `i`, then `j`).
    pub fn iter(&self) -> impl Iterator<Item = GridCoord> {
        let (min, max) = (self.min, self.max);
        (min.i()..=max.i()).flat_map(move |i| (min.j()..=max.j()).map(move |j| GridCoord::new(i, j)))
    }
}

/// Immutable representation of a loaded cell used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Coordinate of the cell.
    pub coord: GridCoord,
    /// Current contents of the cell.
    pub value: CellValue,
    /// Whether the cell is within collection range of the player.
    pub in_range: bool,
}

/// Read-only snapshot describing all loaded cells.
#[derive(Clone, Debug, Default)]
pub struct CellView {
    snapshots: Vec<CellSnapshot>,
}

impl CellView {
    /// Creates a new cell view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CellSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.coord);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = &CellSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for `coord`.
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> Option<&CellSnapshot> {
        self.snapshots
            .binary_search_by_key(&coord, |snapshot| snapshot.coord)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of loaded cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no cells are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellSnapshot> {
        self.snapshots
    }
}
