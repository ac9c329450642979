//! Expiry sweep for entities with a [`TimedLife`](lawn_defence_core::TimedLife).

use std::time::Duration;

use lawn_defence_core::{Category, ComponentKind, EntityId, Event};
use lawn_defence_world::World;

/// Burns `dt` off every timed life and destroys the entities that ran out.
pub(crate) fn sweep(
    world: &mut World,
    dt: Duration,
    scratch: &mut Vec<EntityId>,
    out: &mut Vec<Event>,
) {
    scratch.clear();
    scratch.extend(world.store().query_by_components(&[ComponentKind::TimedLife]));

    for &id in scratch.iter() {
        let Some(entity) = world.store_mut().get_active_mut(id) else {
            continue;
        };
        let category = entity.category();
        let Some(life) = entity.timed_life_mut() else {
            continue;
        };
        life.remaining = life.remaining.saturating_sub(dt);
        if !life.remaining.is_zero() {
            continue;
        }

        let _ = world.store_mut().destroy(id);
        if category == Category::Pickup {
            out.push(Event::PickupExpired { pickup: id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lawn_defence_core::SimConfig;

    #[test]
    fn pickups_expire_after_their_lifetime() {
        let mut world = World::headless(SimConfig::standard()).expect("valid");
        let pickup = world
            .spawn_pickup(Vec3::new(0.5, 0.0, 0.5), 25, 0.0)
            .expect("pooled");
        let mut scratch = Vec::new();
        let mut events = Vec::new();

        sweep(&mut world, Duration::from_millis(11_900), &mut scratch, &mut events);
        assert!(world.store().is_active(pickup));

        sweep(&mut world, Duration::from_millis(100), &mut scratch, &mut events);
        assert!(!world.store().is_active(pickup));
        assert_eq!(events, vec![Event::PickupExpired { pickup }]);

        let _ = world.flush();
        assert_eq!(world.pickup_pool().in_use(), 0);
    }
}
