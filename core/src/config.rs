//! Session configuration shared by the world and its adapters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GeoPoint, Token, MAX_WINDOW_CELLS, VALUE_TABLE_LEN};

const DEFAULT_START: GeoPoint = GeoPoint::new(36.997936938057016, -122.05703507501151);
const DEFAULT_CELL_SIZE: f64 = 1.2e-4;
const DEFAULT_SPAWN_CHANCE: f64 = 0.1;
const DEFAULT_NEIGHBORHOOD_LAT_CELLS: u32 = 7;
const DEFAULT_NEIGHBORHOOD_LNG_CELLS: u32 = 23;
const DEFAULT_WINDOW_MARGIN: u32 = 1;
const DEFAULT_COLLECTION_RANGE: f64 = 0.001;
const DEFAULT_WIN_THRESHOLD: u32 = 4096;
const DEFAULT_NATURAL_SPAWN_RANKS: u8 = 4;

/// Tunable parameters for a single play session.
///
/// Every field has a default, so a TOML file only needs to name the values it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Position the player starts the session at.
    pub start_position: GeoPoint,
    /// Edge length of a grid cell in degrees.
    pub cell_size: f64,
    /// Probability that a coordinate hosts a cell.
    pub spawn_chance: f64,
    /// Half height of the player's neighbourhood, in cells.
    pub neighborhood_lat_cells: u32,
    /// Half width of the player's neighbourhood, in cells.
    pub neighborhood_lng_cells: u32,
    /// Extra cells loaded past each edge of the visible region.
    pub window_margin: u32,
    /// Maximum coordinate-space distance at which cells can be clicked.
    pub collection_range: f64,
    /// Held value at which the game is won and the hand is reset.
    pub win_threshold: u32,
    /// Held value at session start and after every win; 0 is empty-handed.
    pub starting_held_value: u32,
    /// Number of low ranks (from 2 upward) that cells can spawn with.
    pub natural_spawn_ranks: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_position: DEFAULT_START,
            cell_size: DEFAULT_CELL_SIZE,
            spawn_chance: DEFAULT_SPAWN_CHANCE,
            neighborhood_lat_cells: DEFAULT_NEIGHBORHOOD_LAT_CELLS,
            neighborhood_lng_cells: DEFAULT_NEIGHBORHOOD_LNG_CELLS,
            window_margin: DEFAULT_WINDOW_MARGIN,
            collection_range: DEFAULT_COLLECTION_RANGE,
            win_threshold: DEFAULT_WIN_THRESHOLD,
            starting_held_value: 0,
            natural_spawn_ranks: DEFAULT_NATURAL_SPAWN_RANKS,
        }
    }
}

impl GameConfig {
    /// Checks every field against the ranges the world relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start_position.is_finite() {
            return Err(ConfigError::StartPosition);
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !(0.0..=1.0).contains(&self.spawn_chance) {
            return Err(ConfigError::SpawnChance(self.spawn_chance));
        }
        if !(self.collection_range.is_finite() && self.collection_range > 0.0) {
            return Err(ConfigError::CollectionRange(self.collection_range));
        }
        if self.natural_spawn_ranks == 0 || self.natural_spawn_ranks > VALUE_TABLE_LEN {
            return Err(ConfigError::NaturalSpawnRanks {
                ranks: self.natural_spawn_ranks,
                max: VALUE_TABLE_LEN,
            });
        }
        let cells = self.neighborhood_window_cells();
        if cells > MAX_WINDOW_CELLS {
            return Err(ConfigError::WindowTooLarge {
                cells,
                max: MAX_WINDOW_CELLS,
            });
        }
        let starting = self.starting_token()?;
        let max_threshold = Token::saturating_from_rank(Token::MAX_RANK).value();
        let starting_value = starting.map_or(0, Token::value);
        if self.win_threshold <= starting_value || self.win_threshold > max_threshold {
            return Err(ConfigError::WinThreshold {
                threshold: self.win_threshold,
                starting: starting_value,
                max: max_threshold,
            });
        }
        Ok(())
    }

    /// Upper bound on the coordinates loaded around the player.
    ///
    /// The neighbourhood spans at most `2 * half + 1` cells per axis once
    /// floored onto the grid; one extra row and column absorb rounding.
    #[must_use]
    pub fn neighborhood_window_cells(&self) -> u64 {
        let margin = u64::from(self.window_margin);
        let extent = |half: u32| {
            u64::from(half)
                .saturating_add(margin)
                .saturating_mul(2)
                .saturating_add(2)
        };
        extent(self.neighborhood_lat_cells).saturating_mul(extent(self.neighborhood_lng_cells))
    }

    /// Token held at session start, `None` when the player starts empty-handed.
    pub fn starting_token(&self) -> Result<Option<Token>, ConfigError> {
        if self.starting_held_value == 0 {
            return Ok(None);
        }
        match Token::from_value(self.starting_held_value) {
            Some(token) if token.rank() < VALUE_TABLE_LEN => Ok(Some(token)),
            _ => Err(ConfigError::StartingHeldValue(self.starting_held_value)),
        }
    }
}

/// Reasons a [`GameConfig`] may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The start position contained a non-finite component.
    #[error("start position must have finite latitude and longitude")]
    StartPosition,
    /// Cells must have a positive, finite edge length.
    #[error("cell size must be positive and finite (received {0})")]
    CellSize(f64),
    /// Spawn chance is a probability.
    #[error("spawn chance must lie within 0..=1 (received {0})")]
    SpawnChance(f64),
    /// Collection range must be positive and finite.
    #[error("collection range must be positive and finite (received {0})")]
    CollectionRange(f64),
    /// The starting held value is neither 0 nor a table value.
    #[error("starting held value must be 0 or a power of two from 2 to 2048 (received {0})")]
    StartingHeldValue(u32),
    /// Natural spawn ranks must select a non-empty prefix of the value table.
    #[error("natural spawn ranks must lie within 1..={max} (received {ranks})")]
    NaturalSpawnRanks {
        /// Rank count that failed validation.
        ranks: u8,
        /// Length of the value table.
        max: u8,
    },
    /// The win threshold must sit above the starting value and be reachable.
    #[error("win threshold must exceed the starting value {starting} and not exceed {max} (received {threshold})")]
    WinThreshold {
        /// Threshold that failed validation.
        threshold: u32,
        /// Configured starting held value.
        starting: u32,
        /// Largest representable token value.
        max: u32,
    },
    /// The neighbourhood and margin would load too many cells at once.
    #[error("neighbourhood and margin cover up to {cells} cells (limit {max})")]
    WindowTooLarge {
        /// Cells the configured window may cover.
        cells: u64,
        /// Largest window the world loads.
        max: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
        assert_eq!(GameConfig::default().starting_token(), Ok(None));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
                cell_size = 0.0001
                starting_held_value = 2

                [start_position]
                lat = 0.0
                lng = 0.0
            "#,
        )
        .expect("parse config");

        assert_eq!(config.cell_size, 1e-4);
        assert_eq!(config.start_position, GeoPoint::new(0.0, 0.0));
        assert_eq!(config.win_threshold, DEFAULT_WIN_THRESHOLD);
        assert_eq!(config.starting_token(), Ok(Token::from_rank(0)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: Result<GameConfig, _> = toml::from_str("cell_sise = 0.5");
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_non_power_starting_value() {
        let config = GameConfig {
            starting_held_value: 6,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StartingHeldValue(6)));
    }

    #[test]
    fn rejects_starting_value_above_table() {
        let config = GameConfig {
            starting_held_value: 4096,
            win_threshold: 8192,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StartingHeldValue(4096)));
    }

    #[test]
    fn rejects_zero_cell_size() {
        let config = GameConfig {
            cell_size: 0.0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::CellSize(0.0)));
    }

    #[test]
    fn rejects_spawn_ranks_outside_table() {
        let config = GameConfig {
            natural_spawn_ranks: VALUE_TABLE_LEN + 1,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NaturalSpawnRanks { .. })
        ));
    }

    #[test]
    fn rejects_threshold_not_above_start() {
        let config = GameConfig {
            starting_held_value: 8,
            win_threshold: 8,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WinThreshold { .. })
        ));
    }

    #[test]
    fn rejects_unbounded_neighbourhood() {
        let config = GameConfig {
            neighborhood_lat_cells: u32::MAX,
            neighborhood_lng_cells: u32::MAX,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::WindowTooLarge {
                cells: u64::MAX,
                max: MAX_WINDOW_CELLS,
            })
        );

        let margin_only = GameConfig {
            window_margin: 1_000,
            ..GameConfig::default()
        };
        assert!(matches!(
            margin_only.validate(),
            Err(ConfigError::WindowTooLarge { .. })
        ));
    }

    #[test]
    fn default_neighbourhood_fits_window_limit() {
        assert_eq!(GameConfig::default().neighborhood_window_cells(), 18 * 50);
    }
}
