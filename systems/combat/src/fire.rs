//! Ranged fire for defenders carrying a [`Shooter`](lawn_defence_core::Shooter).

use glam::Vec3;
use lawn_defence_core::{ComponentKind, Cue, EntityId, Event};
use lawn_defence_world::{query, World};

/// Fires one projectile from every ready shooter that has a target in its lane.
///
/// A shooter without a target keeps its cooldown. When the projectile pool
/// is exhausted the shot is dropped and the cooldown is kept as well, so the
/// shooter retries on the next frame.
pub(crate) fn fire(world: &mut World, shooters: &mut Vec<EntityId>, out: &mut Vec<Event>) {
    shooters.clear();
    shooters.extend(world.store().query_by_components(&[
        ComponentKind::Shooter,
        ComponentKind::DefenderProfile,
        ComponentKind::Transform,
    ]));

    let now = world.now();
    let muzzle = Vec3::from_array(world.config().combat.muzzle_offset);
    let mut dropped = 0_usize;

    for &id in shooters.iter() {
        let Some(entity) = world.store().get_active(id) else {
            continue;
        };
        let (Some(shooter), Some(profile), Some(transform)) =
            (entity.shooter(), entity.defender(), entity.transform())
        else {
            continue;
        };
        if !shooter.is_ready(now) {
            continue;
        }
        let damage = shooter.damage;
        let position = transform.position;
        if !has_target(world, profile.cell.row(), position.x) {
            continue;
        }

        if world.spawn_projectile(position + muzzle, damage).is_none() {
            dropped += 1;
            continue;
        }
        if let Some(entity) = world.store_mut().get_active_mut(id) {
            if let Some(shooter) = entity.shooter_mut() {
                shooter.last_shot = Some(now);
            }
            if let Some(profile) = entity.defender_mut() {
                profile.last_action = now;
            }
        }
        out.push(Event::Feedback {
            cue: Cue::Shoot,
            intensity: None,
        });
    }

    if dropped > 0 {
        log::warn!("projectile pool exhausted; {dropped} shot(s) postponed");
    }
}

/// Reports whether a live attacker stands ahead of `x` in `lane`, including
/// attackers still walking in from past the lawn's far edge.
fn has_target(world: &World, lane: u32, x: f32) -> bool {
    query::lane_attackers(world, lane)
        .iter()
        .any(|(_, position)| position.x > x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::{AttackerKind, CellCoord, DefenderKind, SimConfig};
    use std::time::Duration;

    fn world() -> World {
        World::headless(SimConfig::standard()).expect("standard config is valid")
    }

    fn shots(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::Feedback {
                        cue: Cue::Shoot,
                        ..
                    }
                )
            })
            .count()
    }

    #[test]
    fn idle_shooter_keeps_its_cooldown() {
        let mut world = world();
        let shooter = world
            .spawn_defender(DefenderKind::Peashooter, CellCoord::new(2, 0))
            .expect("placed");
        let mut scratch = Vec::new();
        let mut events = Vec::new();

        fire(&mut world, &mut scratch, &mut events);
        assert_eq!(shots(&events), 0);
        let last_shot = world
            .store()
            .get(shooter)
            .and_then(|entity| entity.shooter())
            .and_then(|shooter| shooter.last_shot);
        assert_eq!(last_shot, None);

        let _ = world.spawn_attacker(AttackerKind::Basic, 2, 6.0);
        fire(&mut world, &mut scratch, &mut events);
        assert_eq!(shots(&events), 1, "a fresh target is engaged immediately");
    }

    #[test]
    fn only_attackers_ahead_in_the_same_lane_are_targets() {
        let mut world = world();
        let _ = world.spawn_defender(DefenderKind::Peashooter, CellCoord::new(1, 4));
        let _ = world.spawn_attacker(AttackerKind::Basic, 0, 8.0);
        let _ = world.spawn_attacker(AttackerKind::Basic, 1, 2.0);
        let mut events = Vec::new();

        fire(&mut world, &mut Vec::new(), &mut events);

        assert_eq!(shots(&events), 0, "attackers behind or in other lanes");
        assert_eq!(world.projectile_pool().in_use(), 0);
    }

    #[test]
    fn attackers_walking_in_past_the_far_edge_are_targets() {
        let mut world = world();
        let _ = world.spawn_defender(DefenderKind::Peashooter, CellCoord::new(0, 0));
        let spawn_x = world.grid().spawn_x();
        assert!(spawn_x > world.grid().right_edge_x());
        let _ = world.spawn_attacker(AttackerKind::Basic, 0, spawn_x);
        let mut events = Vec::new();

        fire(&mut world, &mut Vec::new(), &mut events);

        assert_eq!(shots(&events), 1);
    }

    #[test]
    fn cooldown_gates_consecutive_shots() {
        let mut world = world();
        let _ = world.spawn_defender(DefenderKind::Peashooter, CellCoord::new(0, 0));
        let _ = world.spawn_attacker(AttackerKind::Buckethead, 0, 8.5);
        let mut scratch = Vec::new();
        let mut events = Vec::new();

        fire(&mut world, &mut scratch, &mut events);
        world.set_now(Duration::from_millis(1_399));
        fire(&mut world, &mut scratch, &mut events);
        assert_eq!(shots(&events), 1);

        world.set_now(Duration::from_millis(1_400));
        fire(&mut world, &mut scratch, &mut events);
        assert_eq!(shots(&events), 2);
        assert_eq!(world.projectile_pool().in_use(), 2);
    }

    #[test]
    fn exhausted_pool_postpones_the_shot() {
        let mut config = SimConfig::standard();
        config.grid.rows = 1;
        config.grid.columns = 1;
        config.combat.projectile_pool_capacity = config.required_projectile_capacity();
        let capacity = config.combat.projectile_pool_capacity;
        let mut world = World::headless(config).expect("valid");
        let shooter = world
            .spawn_defender(DefenderKind::Peashooter, CellCoord::new(0, 0))
            .expect("placed");
        let _ = world.spawn_attacker(AttackerKind::Buckethead, 0, 0.9);
        for _ in 0..capacity {
            let _ = world.spawn_projectile(Vec3::ZERO, 0);
        }
        let mut events = Vec::new();

        fire(&mut world, &mut Vec::new(), &mut events);

        assert_eq!(shots(&events), 0);
        let last_shot = world
            .store()
            .get(shooter)
            .and_then(|entity| entity.shooter())
            .and_then(|shooter| shooter.last_shot);
        assert_eq!(last_shot, None);
    }
}
