use std::time::Duration;

use lawn_defence_core::{
    AttackerKind, BehaviorState, CellCoord, DefenderKind, EntityId, Event, SimConfig,
};
use lawn_defence_system_behavior::Behavior;
use lawn_defence_world::{query, World};

fn world_with_attacker_speed(speed: f32) -> World {
    let mut config = SimConfig::standard();
    for stats in &mut config.attackers {
        stats.speed = speed;
    }
    World::headless(config).expect("valid config")
}

fn step(world: &mut World, behavior: &mut Behavior, dt: Duration, events: &mut Vec<Event>) {
    let now = world.now() + dt;
    world.set_now(now);
    behavior.handle(world, dt, events);
    let _ = world.flush();
}

fn state(world: &World, attacker: EntityId) -> BehaviorState {
    world
        .store()
        .get(attacker)
        .and_then(|entity| entity.attacker())
        .map(|profile| profile.state)
        .expect("attacker profile")
}

#[test]
fn unblocked_attacker_reaches_goal_after_distance_over_speed() {
    for fps in [24_u64, 30, 60, 144] {
        let mut world = world_with_attacker_speed(0.8);
        let start = world.grid().goal_x() + 10.0;
        let attacker = world
            .spawn_attacker(AttackerKind::Basic, 0, start)
            .expect("spawned");
        let dt = Duration::from_nanos(1_000_000_000 / fps);
        let mut behavior = Behavior::new();
        let mut events = Vec::new();

        while !query::goal_reached(&world) {
            assert!(
                world.now() < Duration::from_secs(20),
                "attacker never reached the goal at {fps} fps"
            );
            step(&mut world, &mut behavior, dt, &mut events);
        }

        let elapsed = world.now().as_secs_f32();
        assert!(
            (elapsed - 12.5).abs() <= dt.as_secs_f32() + 0.01,
            "reached goal at {elapsed}s with {fps} fps"
        );
        assert_eq!(events, vec![Event::GoalReached { attacker, lane: 0 }]);
    }
}

#[test]
fn blocked_attacker_bites_once_per_interval_until_the_defender_falls() {
    let mut world = world_with_attacker_speed(0.2);
    let cell = CellCoord::new(4, 2);
    let defender = world
        .spawn_defender(DefenderKind::Peashooter, cell)
        .expect("placed");
    let attacker = world
        .spawn_attacker(AttackerKind::Basic, 4, 2.9)
        .expect("spawned");
    let mut behavior = Behavior::new();
    let mut events = Vec::new();
    let dt = Duration::from_millis(100);

    step(&mut world, &mut behavior, dt, &mut events);
    assert_eq!(state(&world, attacker), BehaviorState::Attacking);
    let blocked_at = world.now();

    let health = |world: &World| {
        world
            .store()
            .get_active(defender)
            .and_then(|entity| entity.health())
            .map(|health| health.current())
    };
    while world.now() < blocked_at + Duration::from_secs(2) {
        step(&mut world, &mut behavior, dt, &mut events);
    }
    assert_eq!(health(&world), Some(100), "two bites after two seconds");
    assert!(!world.grid().is_empty(cell));

    while world.now() < blocked_at + Duration::from_secs(3) {
        step(&mut world, &mut behavior, dt, &mut events);
    }
    assert_eq!(health(&world), None, "third bite kills a 300 health defender");
    assert!(world.grid().is_empty(cell));
    assert_eq!(state(&world, attacker), BehaviorState::Walking);

    let destroyed = events
        .iter()
        .filter(|event| matches!(event, Event::DefenderDestroyed { .. }))
        .count();
    assert_eq!(destroyed, 1);
}

#[test]
fn fast_attacker_can_step_over_a_defender_in_one_long_frame() {
    let mut world = world_with_attacker_speed(2.0);
    let _ = world.spawn_defender(DefenderKind::WallNut, CellCoord::new(0, 4));
    let attacker = world
        .spawn_attacker(AttackerKind::Runner, 0, 5.0)
        .expect("spawned");
    let mut behavior = Behavior::new();
    let mut events = Vec::new();

    step(&mut world, &mut behavior, Duration::from_millis(300), &mut events);
    step(&mut world, &mut behavior, Duration::from_millis(300), &mut events);

    assert_eq!(state(&world, attacker), BehaviorState::Walking);
    let x = world
        .store()
        .get(attacker)
        .and_then(|entity| entity.transform())
        .map(|transform| transform.position.x)
        .expect("transform");
    assert!(x < 4.5, "walked past the wall nut to {x}");
}
