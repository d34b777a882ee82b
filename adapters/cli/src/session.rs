use std::io::{BufRead, Write};

use anyhow::{Context, Result as AnyResult};
use geo_merge_core::{ClickIgnoredReason, Command, Direction, Event, GeoBounds, GeoPoint, GridCoord};
use geo_merge_rendering::{Hud, RenderingBackend, Scene, WIN_BANNER};
use geo_merge_system_movement::{Movement, MovementInput, MovementMode};
use geo_merge_world::{self as world, query, World};
use thiserror::Error;
use tracing::{debug, trace, warn};

const HELP: &str = "\
commands:
  n | s | e | w              step one cell
  goto LAT LNG               teleport to a position
  fix LAT LNG                report a geolocation fix
  mode manual | geo          choose what moves the player
  view LAT LNG LAT LNG       load the cells covering a viewport
  view off                   load the neighbourhood around the player
  click I J                  click the cell at grid coordinate (I, J)
  map                        draw the map around the player
  held                       show the held token
  overlay                    list remembered cells
  help                       show this message
  quit                       end the session";

/// Line of session input after parsing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum SessionCommand {
    Step(Direction),
    Goto(GeoPoint),
    Fix(GeoPoint),
    Mode(MovementMode),
    Viewport(Option<GeoBounds>),
    Click(GridCoord),
    Map,
    Held,
    Overlay,
    Help,
    Quit,
}

/// Errors produced when a session line cannot be understood.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ParseError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
}

/// Parses a single line; blank lines and `#` comments yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<SessionCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match head {
        "n" | "north" => step(&args, "n", Direction::North)?,
        "s" | "south" => step(&args, "s", Direction::South)?,
        "e" | "east" => step(&args, "e", Direction::East)?,
        "w" | "west" => step(&args, "w", Direction::West)?,
        "goto" => SessionCommand::Goto(point(&args, "goto")?),
        "fix" => SessionCommand::Fix(point(&args, "fix")?),
        "mode" => match args.as_slice() {
            ["manual"] => SessionCommand::Mode(MovementMode::Manual),
            ["geo"] => SessionCommand::Mode(MovementMode::Geolocation),
            _ => {
                return Err(ParseError::Arguments {
                    command: "mode",
                    expected: "`manual` or `geo`",
                })
            }
        },
        "view" => viewport(&args)?,
        "click" => match args.as_slice() {
            [i, j] => SessionCommand::Click(GridCoord::new(integer(i)?, integer(j)?)),
            _ => {
                return Err(ParseError::Arguments {
                    command: "click",
                    expected: "two grid indices",
                })
            }
        },
        "map" => bare(&args, "map", SessionCommand::Map)?,
        "held" => bare(&args, "held", SessionCommand::Held)?,
        "overlay" => bare(&args, "overlay", SessionCommand::Overlay)?,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(command))
}

fn step(
    args: &[&str],
    command: &'static str,
    direction: Direction,
) -> Result<SessionCommand, ParseError> {
    bare(args, command, SessionCommand::Step(direction))
}

fn bare(
    args: &[&str],
    command: &'static str,
    parsed: SessionCommand,
) -> Result<SessionCommand, ParseError> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(ParseError::Arguments {
            command,
            expected: "no arguments",
        })
    }
}

fn point(args: &[&str], command: &'static str) -> Result<GeoPoint, ParseError> {
    match args {
        [lat, lng] => Ok(GeoPoint::new(number(lat)?, number(lng)?)),
        _ => Err(ParseError::Arguments {
            command,
            expected: "a latitude and a longitude",
        }),
    }
}

fn viewport(args: &[&str]) -> Result<SessionCommand, ParseError> {
    match args {
        ["off"] => Ok(SessionCommand::Viewport(None)),
        [lat_a, lng_a, lat_b, lng_b] => Ok(SessionCommand::Viewport(Some(GeoBounds::new(
            GeoPoint::new(number(lat_a)?, number(lng_a)?),
            GeoPoint::new(number(lat_b)?, number(lng_b)?),
        )))),
        _ => Err(ParseError::Arguments {
            command: "view",
            expected: "two corners or `off`",
        }),
    }
}

fn number(word: &str) -> Result<f64, ParseError> {
    word.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(word.to_owned()))
}

fn integer(word: &str) -> Result<i64, ParseError> {
    word.parse()
        .map_err(|_| ParseError::InvalidNumber(word.to_owned()))
}

/// Whether the session keeps reading input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Interactive session driving a world from text commands.
#[derive(Debug)]
pub(crate) struct Session<B> {
    world: World,
    movement: Movement,
    backend: B,
    won_since_render: bool,
}

impl<B: RenderingBackend> Session<B> {
    pub(crate) fn new(world: World, backend: B) -> Self {
        Self {
            world,
            movement: Movement::default(),
            backend,
            won_since_render: false,
        }
    }

    /// Reads commands until `quit` or the end of `input`.
    pub(crate) fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
        prompt: bool,
    ) -> AnyResult<()> {
        let mut lines = input.lines();
        loop {
            if prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("failed to read session input")?;
            match parse(&line) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    if self.execute(command, out)? == Flow::Quit {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, line = %line, "rejected session input");
                    writeln!(out, "error: {error}")?;
                }
            }
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> AnyResult<Flow> {
        match command {
            SessionCommand::Step(direction) => self.feed(MovementInput::Step(direction), out)?,
            SessionCommand::Fix(fix) => self.feed(MovementInput::Fix(fix), out)?,
            SessionCommand::Mode(mode) => {
                self.feed(MovementInput::SetMode(mode), out)?;
                writeln!(out, "movement: {mode:?}")?;
            }
            SessionCommand::Goto(position) => {
                self.dispatch(vec![Command::SetPlayerPosition { position }], out)?;
            }
            SessionCommand::Viewport(bounds) => {
                self.dispatch(vec![Command::SetViewport { bounds }], out)?;
            }
            SessionCommand::Click(coord) => {
                self.dispatch(vec![Command::ClickCell { coord }], out)?;
            }
            SessionCommand::Map => self.render()?,
            SessionCommand::Held => {
                let hud = Hud::new(query::held_token(&self.world), query::player(&self.world).wins());
                writeln!(out, "{}", hud.token_counter())?;
            }
            SessionCommand::Overlay => {
                let overlay = query::overlay(&self.world);
                writeln!(out, "{} remembered cells", overlay.len())?;
                for (coord, value) in overlay.iter() {
                    writeln!(out, "  {coord} = {value}")?;
                }
            }
            SessionCommand::Help => writeln!(out, "{HELP}")?,
            SessionCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn feed<W: Write>(&mut self, input: MovementInput, out: &mut W) -> AnyResult<()> {
        let mut commands = Vec::new();
        self.movement
            .handle(&[input], query::player_position(&self.world), &mut commands);
        if commands.is_empty() {
            debug!(?input, mode = ?self.movement.mode(), "movement input produced no command");
        }
        self.dispatch(commands, out)
    }

    fn dispatch<W: Write>(&mut self, commands: Vec<Command>, out: &mut W) -> AnyResult<()> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        for event in &events {
            trace!(?event, "world event");
            if matches!(event, Event::GameWon { .. }) {
                self.won_since_render = true;
            }
            if let Some(message) = describe(event) {
                writeln!(out, "{message}")?;
            }
        }
        Ok(())
    }

    fn render(&mut self) -> AnyResult<()> {
        let player = query::player(&self.world);
        let hud = Hud::new(player.held(), player.wins());
        let mut scene = Scene::new(
            &query::cell_view(&self.world),
            player.position(),
            hud,
            query::config(&self.world).cell_size,
        )?;
        if self.won_since_render {
            scene = scene.with_banner(WIN_BANNER);
        }
        self.backend.present(&scene)?;
        self.won_since_render = false;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn into_backend(self) -> B {
        self.backend
    }
}

fn describe(event: &Event) -> Option<String> {
    let message = match event {
        Event::PlayerMoved { to, .. } => format!("moved to {:.6}, {:.6}", to.lat, to.lng),
        Event::TokenMerged { coord, token } => format!("merged at {coord}, now holding {token}"),
        Event::TokenPickedUp { coord, token } => format!("picked up {token} from {coord}"),
        Event::TokenPlaced { coord, token } => format!("placed {token} at {coord}"),
        Event::GameWon { token } => format!("{WIN_BANNER} Reached {token}."),
        Event::ClickIgnored { coord, reason } => {
            let reason = match reason {
                ClickIgnoredReason::NotLoaded => "no cell is loaded there",
                ClickIgnoredReason::OutOfRange => "the cell is out of range",
                ClickIgnoredReason::NoTransition => "the held token does not fit",
            };
            format!("click at {coord} ignored: {reason}")
        }
        _ => return None,
    };
    Some(message)
}
