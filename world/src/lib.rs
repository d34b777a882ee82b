#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Geo Merge.
//!
//! The world owns the player, the overlay of remembered interactions and the
//! grid of loaded cells. All mutation flows through [`apply`]; every command
//! runs to completion before the next one is accepted, so a window refresh
//! triggered by movement is always finished before a later click is resolved.

mod grid;
mod overlay;

use geo_merge_core::{
    CellWindow, ClickIgnoredReason, Command, ConfigError, Event, GameConfig, GeoBounds, GeoPoint,
    GridCoord, Token, MAX_WINDOW_CELLS,
};
use geo_merge_system_generator::SpawnTable;
use geo_merge_system_token_exchange::{self as token_exchange, Exchange, Outcome, WinCondition};
use tracing::{debug, info, warn};

use self::grid::GridManager;
pub use self::overlay::OverlayStore;

/// Position and hand of the single player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    position: GeoPoint,
    held: Option<Token>,
    wins: u32,
}

impl PlayerState {
    /// Current geographic position of the player.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        self.position
    }

    /// Token currently carried, `None` when empty-handed.
    #[must_use]
    pub const fn held(&self) -> Option<Token> {
        self.held
    }

    /// Number of times the win threshold was reached this session.
    #[must_use]
    pub const fn wins(&self) -> u32 {
        self.wins
    }
}

/// Represents the authoritative Geo Merge session state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    player: PlayerState,
    viewport: Option<GeoBounds>,
    overlay: OverlayStore,
    grid: GridManager,
    win: WinCondition,
}

impl World {
    /// Creates a session from `config`, loading the cells around the start position.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_overlay(config, OverlayStore::new())
    }

    /// Creates a session whose overlay is pre-populated with `overlay`.
    pub fn with_overlay(config: GameConfig, overlay: OverlayStore) -> Result<Self, ConfigError> {
        config.validate()?;
        let starting = config.starting_token()?;
        Ok(Self::assemble(config, starting, overlay))
    }

    fn assemble(config: GameConfig, starting: Option<Token>, overlay: OverlayStore) -> Self {
        let grid = GridManager::new(
            config.cell_size,
            config.collection_range,
            SpawnTable::from_config(&config),
        );
        let mut world = Self {
            player: PlayerState {
                position: config.start_position,
                held: starting,
                wins: 0,
            },
            viewport: None,
            overlay,
            grid,
            win: WinCondition::new(config.win_threshold, starting),
            config,
        };
        let mut initial_events = Vec::new();
        world.refresh(&mut initial_events);
        world
    }

    /// Inclusive coordinate rectangle that should be loaded for the current
    /// viewport, or for the neighbourhood around the player when no viewport
    /// was provided.
    fn desired_window(&self) -> CellWindow {
        let cell_size = self.config.cell_size;
        let bounds = self.viewport.unwrap_or_else(|| {
            GeoBounds::around(
                self.player.position(),
                f64::from(self.config.neighborhood_lat_cells) * cell_size,
                f64::from(self.config.neighborhood_lng_cells) * cell_size,
            )
        });
        CellWindow::covering(bounds, cell_size, self.config.window_margin)
    }

    fn refresh(&mut self, out_events: &mut Vec<Event>) {
        let window = self.desired_window();
        if self.grid.window() != Some(window) {
            out_events.push(Event::WindowChanged { window });
        }
        let position = self.player.position();
        self.grid.sync(window, &self.overlay, position, out_events);
        self.grid.recalculate_range(position, out_events);
    }

    fn move_to(&mut self, position: GeoPoint, out_events: &mut Vec<Event>) {
        if !position.is_finite() {
            warn!(?position, "ignoring non-finite player position");
            return;
        }
        let from = self.player.position();
        self.player.position = position;
        out_events.push(Event::PlayerMoved { from, to: position });
        self.refresh(out_events);
    }

    fn click(&mut self, coord: GridCoord, out_events: &mut Vec<Event>) {
        let Some(cell) = self.grid.cell_mut(coord) else {
            debug!(%coord, "click on unloaded coordinate");
            out_events.push(Event::ClickIgnored {
                coord,
                reason: ClickIgnoredReason::NotLoaded,
            });
            return;
        };

        let outcome = token_exchange::resolve(self.player.held, cell.value(), cell.in_range());
        let transition = match outcome {
            Outcome::Applied(transition) => transition,
            Outcome::Ignored(reason) => {
                debug!(%coord, ?reason, "click ignored");
                out_events.push(Event::ClickIgnored { coord, reason });
                return;
            }
        };

        cell.set_value(transition.cell);
        self.overlay.put(coord, transition.cell);
        debug!(%coord, exchange = ?transition.exchange, cell = %transition.cell, "token exchange");

        if let Some(token) = transition.token() {
            out_events.push(match transition.exchange {
                Exchange::Merge => Event::TokenMerged { coord, token },
                Exchange::Pickup => Event::TokenPickedUp { coord, token },
                Exchange::Place => Event::TokenPlaced { coord, token },
            });
        }

        let (held, won) = self.win.settle(transition.held);
        self.player.held = held;
        if let Some(token) = won {
            self.player.wins = self.player.wins.saturating_add(1);
            info!(%token, wins = self.player.wins, "win threshold reached");
            out_events.push(Event::GameWon { token });
        }
        out_events.push(Event::HeldTokenChanged { held });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::assemble(GameConfig::default(), None, OverlayStore::new())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetPlayerPosition { position } => world.move_to(position, out_events),
        Command::MovePlayer { direction } => {
            let (delta_i, delta_j) = direction.cell_offset();
            let cell_size = world.config.cell_size;
            let target = world
                .player
                .position()
                .offset(delta_i as f64 * cell_size, delta_j as f64 * cell_size);
            world.move_to(target, out_events);
        }
        Command::SetViewport { bounds } => {
            if let Some(bounds) = bounds {
                if !bounds.is_finite() {
                    warn!(?bounds, "ignoring non-finite viewport");
                    return;
                }
                let window =
                    CellWindow::covering(bounds, world.config.cell_size, world.config.window_margin);
                if window.cell_count() > MAX_WINDOW_CELLS {
                    warn!(
                        ?bounds,
                        cells = window.cell_count(),
                        max = MAX_WINDOW_CELLS,
                        "ignoring oversized viewport"
                    );
                    return;
                }
            }
            world.viewport = bounds;
            world.refresh(out_events);
        }
        Command::ClickCell { coord } => world.click(coord, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use geo_merge_core::{
        CellSnapshot, CellView, CellWindow, GameConfig, GeoPoint, GridCoord, Token,
    };

    use super::{OverlayStore, PlayerState, World};

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current player state.
    #[must_use]
    pub fn player(world: &World) -> &PlayerState {
        &world.player
    }

    /// Current geographic position of the player.
    #[must_use]
    pub fn player_position(world: &World) -> GeoPoint {
        world.player.position()
    }

    /// Token the player carries, `None` when empty-handed.
    #[must_use]
    pub fn held_token(world: &World) -> Option<Token> {
        world.player.held
    }

    /// Numeric held value suitable for a token counter, 0 when empty-handed.
    #[must_use]
    pub fn held_value(world: &World) -> u32 {
        world.player.held.map_or(0, Token::value)
    }

    /// Coordinate rectangle that is currently loaded.
    #[must_use]
    pub fn load_window(world: &World) -> Option<CellWindow> {
        world.grid.window()
    }

    /// Captures a read-only view of every loaded cell.
    #[must_use]
    pub fn cell_view(world: &World) -> CellView {
        CellView::from_snapshots(world.grid.snapshots())
    }

    /// Snapshot of the loaded cell at `coord`, if any.
    #[must_use]
    pub fn cell(world: &World, coord: GridCoord) -> Option<CellSnapshot> {
        world.grid.cell(coord).map(|cell| cell.snapshot())
    }

    /// Read-only access to the overlay of remembered interactions.
    #[must_use]
    pub fn overlay(world: &World) -> &OverlayStore {
        &world.overlay
    }
}
