//! Projectile flight, far-bound removal and collision.

use std::time::Duration;

use glam::{Vec2, Vec3};
use lawn_defence_core::{BehaviorState, Category, Cue, EntityId, Event};
use lawn_defence_world::World;

use crate::damage::damage_attacker;

/// Moves every projectile, resolves hits against attackers and removes the
/// ones past the far bound.
///
/// Hits are tested against the whole segment a projectile swept this frame,
/// so long frames under fast-forward cannot carry a shot through an attacker.
/// Distances are measured on the ground plane; the muzzle height does not
/// count toward the hit radius. A projectile is destroyed on its first hit,
/// so it can never damage a second attacker.
pub(crate) fn advance(
    world: &mut World,
    dt: Duration,
    projectiles: &mut Vec<EntityId>,
    out: &mut Vec<Event>,
) {
    projectiles.clear();
    projectiles.extend(world.store().query_by_category(Category::Projectile));

    let step = dt.as_secs_f32();
    let far_bound = world.grid().far_bound_x();
    let hit_radius = world.config().combat.hit_radius;

    for &id in projectiles.iter() {
        let Some(entity) = world.store_mut().get_active_mut(id) else {
            continue;
        };
        let Some(projectile) = entity.projectile() else {
            continue;
        };
        let velocity = projectile.direction * projectile.speed;
        let damage = projectile.damage;
        let Some(transform) = entity.transform_mut() else {
            continue;
        };
        let from = transform.position;
        transform.position += velocity * step;
        let to = transform.position;

        let Some(victim) = first_hit(world, from, to, hit_radius) else {
            if to.x > far_bound {
                let _ = world.store_mut().destroy(id);
            }
            continue;
        };
        let _ = world.store_mut().destroy(id);
        out.push(Event::Feedback {
            cue: Cue::Hit,
            intensity: None,
        });
        let _ = damage_attacker(world, victim, damage, out);
    }
}

/// Earliest attacker along the ground-plane segment `from..to` whose
/// distance to the segment is within `radius`.
fn first_hit(world: &World, from: Vec3, to: Vec3, radius: f32) -> Option<EntityId> {
    let start = Vec2::new(from.x, from.z);
    let path = Vec2::new(to.x, to.z) - start;
    let length_squared = path.length_squared();

    world
        .store()
        .iter()
        .filter_map(|entity| {
            let profile = entity.attacker()?;
            if profile.state == BehaviorState::Dying {
                return None;
            }
            let target = entity.transform()?.position;
            let offset = Vec2::new(target.x, target.z) - start;
            let along = if length_squared > 0.0 {
                (offset.dot(path) / length_squared).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let miss = offset - path * along;
            (miss.length_squared() <= radius * radius).then_some((entity.id(), along))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id)
}
