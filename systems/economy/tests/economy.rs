use std::time::Duration;

use glam::Vec3;
use lawn_defence_core::{CellCoord, DefenderKind, Event, SimConfig};
use lawn_defence_system_economy::{collect, Economy};
use lawn_defence_world::World;

fn run(world: &mut World, economy: &mut Economy, until: Duration, events: &mut Vec<Event>) {
    let dt = Duration::from_millis(100);
    while world.now() < until {
        let now = world.now() + dt;
        world.set_now(now);
        economy.handle(world, dt, events);
        let _ = world.flush();
    }
}

#[test]
fn auto_collect_banks_sky_sun_and_production() {
    let mut config = SimConfig::standard();
    config.economy.auto_collect = true;
    let mut world = World::headless(config).expect("valid config");
    let _ = world.spawn_defender(DefenderKind::Sunflower, CellCoord::new(2, 0));
    let mut economy = Economy::new(11);
    let mut events = Vec::new();

    run(&mut world, &mut economy, Duration::from_secs(25), &mut events);

    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::PickupSpawned { .. }))
        .count();
    let collected = events
        .iter()
        .filter(|event| matches!(event, Event::PickupCollected { .. }))
        .count();
    assert_eq!(spawned, 3, "two sky suns and one sunflower production");
    assert_eq!(collected, 3);
    assert_eq!(world.ledger().amount(), 150 + 3 * 25);
    assert_eq!(world.pickup_pool().in_use(), 0);
}

#[test]
fn pickups_stay_put_without_auto_collect() {
    let mut world = World::headless(SimConfig::standard()).expect("valid config");
    let mut economy = Economy::new(11);
    let mut events = Vec::new();

    run(&mut world, &mut economy, Duration::from_secs(15), &mut events);

    assert_eq!(world.ledger().amount(), 150);
    assert_eq!(world.pickup_pool().in_use(), 1);
}

#[test]
fn exhausted_pickup_pool_defers_production() {
    let mut config = SimConfig::standard();
    config.economy.pickup_pool_capacity = 1;
    config.economy.sky_sun_interval = Duration::from_secs(600);
    let mut world = World::headless(config).expect("valid config");
    let _ = world.spawn_defender(DefenderKind::Sunflower, CellCoord::new(0, 0));
    let blocker = world
        .spawn_pickup(Vec3::new(5.5, 0.0, 4.5), 25, 0.0)
        .expect("single slot");
    let mut economy = Economy::new(11);
    let mut events = Vec::new();

    run(&mut world, &mut economy, Duration::from_secs(30), &mut events);
    assert!(events.is_empty(), "no slot for the sunflower: {events:?}");

    assert_eq!(collect(&mut world, blocker, &mut events), Some(25));
    let _ = world.flush();
    events.clear();
    run(&mut world, &mut economy, Duration::from_millis(30_100), &mut events);

    assert_eq!(events.len(), 1, "production resumes on the next frame");
    assert!(matches!(events[0], Event::PickupSpawned { value: 25, .. }));
}
