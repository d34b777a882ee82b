#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure movement system translating player input into position commands.
//!
//! Players either walk with the step buttons or let a geolocation source
//! drive their position. The system tracks which of the two is in charge and
//! emits [`Command::MovePlayer`] or [`Command::SetPlayerPosition`] values for
//! the world to apply.

use geo_merge_core::{Command, Direction, GeoPoint};

/// Source that currently controls the player's position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MovementMode {
    /// Step buttons move the player one cell at a time.
    #[default]
    Manual,
    /// Geolocation fixes teleport the player to the reported position.
    Geolocation,
}

/// Input captured by adapters between two updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementInput {
    /// A step button was pressed.
    Step(Direction),
    /// The geolocation source reported a position.
    Fix(GeoPoint),
    /// The player switched the controlling source.
    SetMode(MovementMode),
}

/// Movement system that remembers the active mode and the latest fix.
#[derive(Debug, Default)]
pub struct Movement {
    mode: MovementMode,
    last_fix: Option<GeoPoint>,
}

impl Movement {
    /// Creates a movement system starting in `mode`.
    #[must_use]
    pub const fn new(mode: MovementMode) -> Self {
        Self {
            mode,
            last_fix: None,
        }
    }

    /// Source currently controlling the player.
    #[must_use]
    pub const fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Consumes the frame's inputs and emits position commands.
    ///
    /// `position` is the player's position before the inputs are applied; it
    /// is used to drop fixes that would not move the player. Non-finite fixes
    /// are discarded.
    pub fn handle(&mut self, inputs: &[MovementInput], position: GeoPoint, out: &mut Vec<Command>) {
        let mut current = Some(position);

        for input in inputs {
            match *input {
                MovementInput::Step(direction) => {
                    if self.mode == MovementMode::Manual {
                        out.push(Command::MovePlayer { direction });
                        current = None;
                    }
                }
                MovementInput::Fix(fix) => {
                    if !fix.is_finite() {
                        continue;
                    }
                    self.last_fix = Some(fix);
                    if self.mode == MovementMode::Geolocation {
                        push_teleport(fix, &mut current, out);
                    }
                }
                MovementInput::SetMode(mode) => {
                    let switched = self.mode != mode;
                    self.mode = mode;
                    if switched && mode == MovementMode::Geolocation {
                        if let Some(fix) = self.last_fix {
                            push_teleport(fix, &mut current, out);
                        }
                    }
                }
            }
        }
    }
}

fn push_teleport(fix: GeoPoint, current: &mut Option<GeoPoint>, out: &mut Vec<Command>) {
    if *current == Some(fix) {
        return;
    }
    out.push(Command::SetPlayerPosition { position: fix });
    *current = Some(fix);
}
