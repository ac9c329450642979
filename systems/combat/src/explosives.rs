//! Fused area damage.

use std::time::Duration;

use glam::Vec3;
use lawn_defence_core::{ComponentKind, Cue, EntityId, Event};
use lawn_defence_world::World;

use crate::damage::damage_attacker;

/// Burns every fuse by `dt` and detonates the explosives whose fuse ran out.
///
/// A detonation damages every live attacker within `radius * cell_size` of
/// the explosive and then removes the explosive from the lawn.
pub(crate) fn burn_fuses(
    world: &mut World,
    dt: Duration,
    explosives: &mut Vec<EntityId>,
    out: &mut Vec<Event>,
) {
    explosives.clear();
    explosives.extend(
        world
            .store()
            .query_by_components(&[ComponentKind::Explosive, ComponentKind::Transform]),
    );

    let cell_size = world.grid().cell_size();
    for &id in explosives.iter() {
        let Some(entity) = world.store_mut().get_active_mut(id) else {
            continue;
        };
        let Some(center) = entity.transform().map(|transform| transform.position) else {
            continue;
        };
        let Some(explosive) = entity.explosive_mut() else {
            continue;
        };
        if explosive.exploded {
            continue;
        }
        explosive.elapsed += dt;
        if explosive.elapsed < explosive.fuse {
            continue;
        }
        explosive.exploded = true;
        let reach = explosive.radius * cell_size;
        let damage = explosive.damage;

        log::debug!("explosive {id} detonated");
        out.push(Event::Feedback {
            cue: Cue::Explosion,
            intensity: Some(reach),
        });
        for victim in attackers_within(world, center, reach) {
            let _ = damage_attacker(world, victim, damage, out);
        }
        if let Some(cell) = world.remove_defender(id) {
            out.push(Event::DefenderRemoved { defender: id, cell });
        }
    }
}

fn attackers_within(world: &World, center: Vec3, reach: f32) -> Vec<EntityId> {
    world
        .store()
        .iter()
        .filter_map(|entity| {
            let _ = entity.attacker()?;
            let position = entity.transform()?.position;
            (position.distance(center) <= reach).then_some(entity.id())
        })
        .collect()
}
