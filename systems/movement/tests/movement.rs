use geo_merge_core::{Command, Direction, Event, GameConfig, GeoPoint, GridCoord};
use geo_merge_system_movement::{Movement, MovementInput, MovementMode};
use geo_merge_world::{self as world, query, World};

fn config() -> GameConfig {
    GameConfig {
        start_position: GeoPoint::new(0.00005, 0.00005),
        cell_size: 1e-4,
        ..GameConfig::default()
    }
}

fn pump(world: &mut World, movement: &mut Movement, inputs: &[MovementInput]) -> Vec<Event> {
    let mut commands = Vec::new();
    movement.handle(inputs, query::player_position(world), &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn manual_steps_move_one_cell_each() {
    let mut world = World::new(config()).expect("valid config");
    let mut movement = Movement::default();

    let _ = pump(
        &mut world,
        &mut movement,
        &[
            MovementInput::Step(Direction::North),
            MovementInput::Step(Direction::North),
            MovementInput::Step(Direction::East),
        ],
    );

    let cell = GridCoord::containing(query::player_position(&world), 1e-4);
    assert_eq!(cell, GridCoord::new(2, 1));
}

#[test]
fn fixes_are_ignored_in_manual_mode() {
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    movement.handle(
        &[MovementInput::Fix(GeoPoint::new(10.0, 10.0))],
        GeoPoint::new(0.0, 0.0),
        &mut commands,
    );
    assert!(commands.is_empty());
}

#[test]
fn steps_are_ignored_while_following_geolocation() {
    let mut movement = Movement::new(MovementMode::Geolocation);
    let mut commands = Vec::new();
    movement.handle(
        &[MovementInput::Step(Direction::South)],
        GeoPoint::new(0.0, 0.0),
        &mut commands,
    );
    assert!(commands.is_empty());
}

#[test]
fn geolocation_fix_teleports_player() {
    let mut world = World::new(config()).expect("valid config");
    let mut movement = Movement::new(MovementMode::Geolocation);
    let fix = GeoPoint::new(0.0105, -0.0042);

    let events = pump(&mut world, &mut movement, &[MovementInput::Fix(fix)]);

    assert_eq!(query::player_position(&world), fix);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::PlayerMoved { to, .. } if *to == fix)));
}

#[test]
fn switching_to_geolocation_snaps_to_last_fix() {
    let mut movement = Movement::default();
    let fix = GeoPoint::new(3.0, 4.0);
    let mut commands = Vec::new();

    movement.handle(&[MovementInput::Fix(fix)], GeoPoint::new(0.0, 0.0), &mut commands);
    assert!(commands.is_empty());

    movement.handle(
        &[MovementInput::SetMode(MovementMode::Geolocation)],
        GeoPoint::new(0.0, 0.0),
        &mut commands,
    );
    assert_eq!(commands, vec![Command::SetPlayerPosition { position: fix }]);
    assert_eq!(movement.mode(), MovementMode::Geolocation);
}

#[test]
fn non_finite_fixes_are_discarded() {
    let mut movement = Movement::new(MovementMode::Geolocation);
    let mut commands = Vec::new();
    movement.handle(
        &[
            MovementInput::Fix(GeoPoint::new(f64::NAN, 1.0)),
            MovementInput::Fix(GeoPoint::new(1.0, f64::INFINITY)),
        ],
        GeoPoint::new(0.0, 0.0),
        &mut commands,
    );
    assert!(commands.is_empty());
}
