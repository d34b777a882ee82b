use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use geo_merge_core::{
    CellSnapshot, CellValue, Command, Direction, Event, GameConfig, GeoPoint, GridCoord, Token,
};
use geo_merge_world::{self as world, query, World};

#[test]
fn deterministic_replay_produces_identical_sessions() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first.events.len() > first.cells.len(),
        "script should exercise movement and clicks"
    );
}

#[test]
fn fresh_sessions_generate_the_same_world() {
    let first = World::new(config()).expect("valid config");
    let second = World::new(config()).expect("valid config");

    assert_eq!(
        query::cell_view(&first).into_vec(),
        query::cell_view(&second).into_vec()
    );
}

fn config() -> GameConfig {
    GameConfig {
        start_position: GeoPoint::new(0.00006, -0.00006),
        cell_size: 1e-4,
        spawn_chance: 0.35,
        collection_range: 3e-4,
        starting_held_value: 2,
        ..GameConfig::default()
    }
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new(config()).expect("valid config");
    let mut log = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        log.extend(events.iter().filter_map(EventRecord::from_event));
    }

    let cells = query::cell_view(&world)
        .into_vec()
        .into_iter()
        .map(CellState::from)
        .collect();

    ReplayOutcome {
        cells,
        events: log,
        held: query::held_token(&world),
        overlay: query::overlay(&world).iter().collect(),
    }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = Vec::new();
    let steps = [
        Direction::North,
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::West,
    ];
    for direction in steps {
        commands.push(Command::MovePlayer { direction });
        for di in -2..=2 {
            for dj in -2..=2 {
                commands.push(Command::ClickCell {
                    coord: GridCoord::new(di, dj - 1),
                });
            }
        }
    }
    commands.push(Command::SetPlayerPosition {
        position: GeoPoint::new(0.02, 0.02),
    });
    commands.push(Command::SetPlayerPosition {
        position: GeoPoint::new(0.00006, -0.00006),
    });
    commands
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    cells: Vec<CellState>,
    events: Vec<EventRecord>,
    held: Option<Token>,
    overlay: Vec<(GridCoord, CellValue)>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CellState {
    coord: GridCoord,
    value: CellValue,
    in_range: bool,
}

impl From<CellSnapshot> for CellState {
    fn from(snapshot: CellSnapshot) -> Self {
        Self {
            coord: snapshot.coord,
            value: snapshot.value,
            in_range: snapshot.in_range,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    Spawned(GridCoord, CellValue),
    Evicted(GridCoord),
    Exchanged(GridCoord, Token),
    Won(Token),
    Ignored(GridCoord),
}

impl EventRecord {
    fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::CellSpawned { coord, value, .. } => Some(Self::Spawned(*coord, *value)),
            Event::CellEvicted { coord } => Some(Self::Evicted(*coord)),
            Event::TokenMerged { coord, token }
            | Event::TokenPickedUp { coord, token }
            | Event::TokenPlaced { coord, token } => Some(Self::Exchanged(*coord, *token)),
            Event::GameWon { token } => Some(Self::Won(*token)),
            Event::ClickIgnored { coord, .. } => Some(Self::Ignored(*coord)),
            _ => None,
        }
    }
}
