#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Geo Merge adapters.

use anyhow::Result as AnyResult;
use geo_merge_core::{CellSnapshot, CellValue, CellView, GeoPoint, GridCoord, Token};
use glam::DVec2;
use std::{error::Error, fmt};

/// Text shown to the player when the win threshold is reached.
pub const WIN_BANNER: &str = "You Win!";

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgb_u8(0, 0, 0);

    /// Fill for loaded cells that no longer hold a token.
    pub const EMPTY_CELL: Self = Self::from_rgb_u8(0x80, 0x80, 0x80);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Converts the color back to byte RGB values, dropping alpha.
    #[must_use]
    pub fn to_rgb_u8(self) -> [u8; 3] {
        [
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
        ]
    }
}

fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Fill colors indexed by token rank, from 2 up to 2048.
pub const RANK_COLORS: [Color; 11] = [
    Color::from_rgb_u8(0x04, 0x00, 0xff),
    Color::from_rgb_u8(0x6f, 0x00, 0xff),
    Color::from_rgb_u8(0xff, 0x00, 0x9d),
    Color::from_rgb_u8(0xff, 0x00, 0x37),
    Color::from_rgb_u8(0xff, 0x48, 0x00),
    Color::from_rgb_u8(0xff, 0xae, 0x00),
    Color::from_rgb_u8(0xb3, 0xff, 0x00),
    Color::from_rgb_u8(0x00, 0xff, 0x15),
    Color::from_rgb_u8(0x00, 0xff, 0x9d),
    Color::from_rgb_u8(0x00, 0xff, 0xf2),
    Color::from_rgb_u8(0x00, 0x66, 0xff),
];

/// Fill color for a token; ranks beyond the table reuse its last entry.
#[must_use]
pub fn token_color(token: Token) -> Color {
    let index = usize::from(token.rank()).min(RANK_COLORS.len() - 1);
    RANK_COLORS[index]
}

/// Fill color for a cell. Out of range cells are drawn black.
#[must_use]
pub fn cell_color(value: CellValue, in_range: bool) -> Color {
    if !in_range {
        return Color::BLACK;
    }
    value.token().map_or(Color::EMPTY_CELL, token_color)
}

/// Presentation of a single loaded cell in geographic units.
///
/// Vectors use `x` for longitude and `y` for latitude.
#[derive(Clone, Debug, PartialEq)]
pub struct CellPresentation {
    /// Coordinate of the cell.
    pub coord: GridCoord,
    /// South-west corner of the cell.
    pub min: DVec2,
    /// North-east corner of the cell.
    pub max: DVec2,
    /// Fill and outline color.
    pub fill: Color,
    /// Token value printed in the cell, `None` once the cell is emptied.
    pub label: Option<String>,
    /// Whether clicks on the cell can change state.
    pub interactive: bool,
}

impl CellPresentation {
    /// Builds the presentation of `snapshot` for cells of side `cell_size`.
    #[must_use]
    pub fn from_snapshot(snapshot: &CellSnapshot, cell_size: f64) -> Self {
        let bounds = snapshot.coord.bounds(cell_size);
        Self {
            coord: snapshot.coord,
            min: to_vec(bounds.south_west()),
            max: to_vec(bounds.north_east()),
            fill: cell_color(snapshot.value, snapshot.in_range),
            label: snapshot.value.token().map(|token| token.value().to_string()),
            interactive: snapshot.in_range,
        }
    }

    /// Centre of the cell, where the label is anchored.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

/// Heads-up display shown beside the map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hud {
    /// Numeric value of the held token, 0 when empty-handed.
    pub held_value: u32,
    /// Number of wins recorded this session.
    pub wins: u32,
    /// Banner raised by the last update, if any.
    pub banner: Option<String>,
}

impl Hud {
    /// Creates a HUD for the provided hand.
    #[must_use]
    pub fn new(held: Option<Token>, wins: u32) -> Self {
        Self {
            held_value: held.map_or(0, Token::value),
            wins,
            banner: None,
        }
    }

    /// Text of the token counter.
    #[must_use]
    pub fn token_counter(&self) -> String {
        format!("Tokens: {}", self.held_value)
    }
}

/// Declarative frame consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Side length of a cell in degrees.
    pub cell_size: f64,
    /// Loaded cells ordered by coordinate.
    pub cells: Vec<CellPresentation>,
    /// Player marker position.
    pub player: DVec2,
    /// Token counter and banners.
    pub hud: Hud,
}

impl Scene {
    /// Builds a scene from a world snapshot.
    pub fn new(
        view: &CellView,
        player: GeoPoint,
        hud: Hud,
        cell_size: f64,
    ) -> Result<Self, RenderingError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        if !player.is_finite() {
            return Err(RenderingError::NonFinitePlayer);
        }

        let cells = view
            .iter()
            .map(|snapshot| CellPresentation::from_snapshot(snapshot, cell_size))
            .collect();

        Ok(Self {
            cell_size,
            cells,
            player: to_vec(player),
            hud,
        })
    }

    /// Raises the win banner for this frame.
    #[must_use]
    pub fn with_banner(mut self, text: impl Into<String>) -> Self {
        self.hud.banner = Some(text.into());
        self
    }

    /// Presentation of the loaded cell at `coord`.
    #[must_use]
    pub fn cell(&self, coord: GridCoord) -> Option<&CellPresentation> {
        self.cells
            .binary_search_by(|cell| cell.coord.cmp(&coord))
            .ok()
            .map(|index| &self.cells[index])
    }

    /// Coordinate of the cell the player stands in.
    #[must_use]
    pub fn player_cell(&self) -> GridCoord {
        GridCoord::containing(GeoPoint::new(self.player.y, self.player.x), self.cell_size)
    }

    /// Returns the loaded cell under `point`, if any.
    #[must_use]
    pub fn hit_test(&self, point: DVec2) -> Option<&CellPresentation> {
        if !point.is_finite() {
            return None;
        }
        self.cell(GridCoord::containing(
            GeoPoint::new(point.y, point.x),
            self.cell_size,
        ))
    }
}

fn to_vec(point: GeoPoint) -> DVec2 {
    DVec2::new(point.lng, point.lat)
}

/// Rendering backend capable of presenting Geo Merge scenes.
pub trait RenderingBackend {
    /// Presents a single frame.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cell size must be positive and finite to lay out cells.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f64,
    },
    /// The player marker cannot be placed at a non-finite position.
    NonFinitePlayer,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell size must be positive (received {cell_size})")
            }
            Self::NonFinitePlayer => write!(f, "player position must be finite"),
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: u32) -> Token {
        Token::from_value(value).expect("power of two")
    }

    fn snapshot(i: i64, j: i64, value: CellValue, in_range: bool) -> CellSnapshot {
        CellSnapshot {
            coord: GridCoord::new(i, j),
            value,
            in_range,
        }
    }

    #[test]
    fn rank_colors_match_value_table() {
        assert_eq!(token_color(token(2)).to_rgb_u8(), [0x04, 0x00, 0xff]);
        assert_eq!(token_color(token(32)).to_rgb_u8(), [0xff, 0x48, 0x00]);
        assert_eq!(token_color(token(64)).to_rgb_u8(), [0xff, 0xae, 0x00]);
        assert_eq!(token_color(token(2048)).to_rgb_u8(), [0x00, 0x66, 0xff]);
        assert_eq!(token_color(token(4096)), token_color(token(2048)));
    }

    #[test]
    fn out_of_range_cells_are_black() {
        let value = CellValue::holding(token(8));
        assert_eq!(cell_color(value, false), Color::BLACK);
        assert_eq!(cell_color(value, true), RANK_COLORS[2]);
        assert_eq!(cell_color(CellValue::EMPTY, true), Color::EMPTY_CELL);
    }

    #[test]
    fn scene_rejects_invalid_cell_size() {
        let view = CellView::default();
        let hud = Hud::new(None, 0);
        assert_eq!(
            Scene::new(&view, GeoPoint::new(0.0, 0.0), hud.clone(), 0.0),
            Err(RenderingError::InvalidCellSize { cell_size: 0.0 })
        );
        assert_eq!(
            Scene::new(&view, GeoPoint::new(f64::NAN, 0.0), hud, 1e-4),
            Err(RenderingError::NonFinitePlayer)
        );
    }

    #[test]
    fn cells_are_laid_out_in_geographic_units() {
        let view = CellView::from_snapshots(vec![
            snapshot(2, -1, CellValue::holding(token(4)), true),
            snapshot(0, 0, CellValue::EMPTY, false),
        ]);
        let scene = Scene::new(&view, GeoPoint::new(0.0, 0.0), Hud::new(None, 0), 0.5)
            .expect("valid scene");

        assert_eq!(scene.cells.len(), 2);
        let cell = &scene.cells[1];
        assert_eq!(cell.coord, GridCoord::new(2, -1));
        assert_eq!(cell.min, DVec2::new(-0.5, 1.0));
        assert_eq!(cell.max, DVec2::new(0.0, 1.5));
        assert_eq!(cell.center(), DVec2::new(-0.25, 1.25));
        assert_eq!(cell.label.as_deref(), Some("4"));
        assert!(cell.interactive);

        let empty = &scene.cells[0];
        assert_eq!(empty.label, None);
        assert!(!empty.interactive);
        assert_eq!(empty.fill, Color::BLACK);
    }

    #[test]
    fn hit_test_finds_loaded_cells_only() {
        let view = CellView::from_snapshots(vec![snapshot(1, 1, CellValue::EMPTY, true)]);
        let scene = Scene::new(&view, GeoPoint::new(0.0, 0.0), Hud::new(None, 0), 0.5)
            .expect("valid scene");

        let hit = scene.hit_test(DVec2::new(0.75, 0.6)).expect("inside (1, 1)");
        assert_eq!(hit.coord, GridCoord::new(1, 1));
        assert!(scene.hit_test(DVec2::new(0.25, 0.25)).is_none());
        assert!(scene.hit_test(DVec2::new(f64::NAN, 0.6)).is_none());
    }

    #[test]
    fn hud_reports_tokens_and_banner() {
        let scene = Scene::new(
            &CellView::default(),
            GeoPoint::new(0.0, 0.0),
            Hud::new(Some(token(64)), 2),
            1e-4,
        )
        .expect("valid scene")
        .with_banner(WIN_BANNER);

        assert_eq!(scene.hud.token_counter(), "Tokens: 64");
        assert_eq!(scene.hud.wins, 2);
        assert_eq!(scene.hud.banner.as_deref(), Some(WIN_BANNER));
        assert_eq!(Hud::new(None, 0).token_counter(), "Tokens: 0");
    }
}
