#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sun economy: producer defenders, sky sun, falling pickups and collection.
//!
//! Every pickup is lent a handle from the world's pickup pool. When the pool
//! is empty the producer simply waits for the next frame; its timer is only
//! reset once a pickup actually appears.

use std::time::Duration;

use glam::Vec3;
use lawn_defence_core::{Category, CellCoord, ComponentKind, Cue, EntityId, Event};
use lawn_defence_world::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stream offset that keeps sky sun placement independent from wave lanes.
const SKY_STREAM: u64 = 0x5c1e_5c1e;

/// Economy system that produces, drops and collects sun.
#[derive(Debug)]
pub struct Economy {
    seed: u64,
    rng: ChaCha8Rng,
    last_sky_sun: Duration,
    scratch: Vec<EntityId>,
}

impl Economy {
    /// Creates an economy whose sky sun placement derives from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed ^ SKY_STREAM),
            last_sky_sun: Duration::ZERO,
            scratch: Vec::new(),
        }
    }

    /// Restarts the sky sun timer and random stream.
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Runs producers, sky sun, pickup motion and optional auto-collection.
    pub fn handle(&mut self, world: &mut World, dt: Duration, out: &mut Vec<Event>) {
        self.produce(world, out);
        self.drop_sky_sun(world, out);
        self.settle_pickups(world, dt);
        if world.config().economy.auto_collect {
            self.collect_landed(world, out);
        }
    }

    fn produce(&mut self, world: &mut World, out: &mut Vec<Event>) {
        self.scratch.clear();
        self.scratch.extend(world.store().query_by_components(&[
            ComponentKind::SunProducer,
            ComponentKind::Transform,
        ]));

        let now = world.now();
        for &producer in &self.scratch {
            let Some(entity) = world.store().get_active(producer) else {
                continue;
            };
            let (Some(source), Some(transform)) = (entity.sun_producer(), entity.transform())
            else {
                continue;
            };
            if now.saturating_sub(source.last_produced) < source.interval {
                continue;
            }
            let value = source.value;
            let position = transform.position;

            let Some(pickup) = world.spawn_pickup(position, value, position.y) else {
                log::warn!("pickup pool exhausted; producer {producer} waits");
                continue;
            };
            if let Some(entity) = world.store_mut().get_active_mut(producer) {
                if let Some(source) = entity.sun_producer_mut() {
                    source.last_produced = now;
                }
                if let Some(profile) = entity.defender_mut() {
                    profile.last_action = now;
                }
            }
            out.push(Event::PickupSpawned { pickup, value });
        }
    }

    fn drop_sky_sun(&mut self, world: &mut World, out: &mut Vec<Event>) {
        let economy = &world.config().economy;
        let (interval, value, height) = (
            economy.sky_sun_interval,
            economy.sky_sun_value,
            economy.sky_height,
        );
        let now = world.now();
        if interval.is_zero() || now.saturating_sub(self.last_sky_sun) < interval {
            return;
        }

        let row = self.rng.gen_range(0..world.grid().rows());
        let column = self.rng.gen_range(0..world.grid().columns());
        let ground = world.grid().cell_to_world(CellCoord::new(row, column));
        let start = Vec3::new(ground.x, height, ground.z);
        let Some(pickup) = world.spawn_pickup(start, value, ground.y) else {
            log::warn!("pickup pool exhausted; sky sun postponed");
            return;
        };
        self.last_sky_sun = now;
        out.push(Event::PickupSpawned { pickup, value });
    }

    fn settle_pickups(&mut self, world: &mut World, dt: Duration) {
        self.scratch.clear();
        self.scratch
            .extend(world.store().query_by_category(Category::Pickup));

        let fall = world.config().economy.fall_speed * dt.as_secs_f32();
        for &pickup in &self.scratch {
            let Some(entity) = world.store_mut().get_active_mut(pickup) else {
                continue;
            };
            let Some(resting_y) = entity.collectable().map(|c| c.resting_y) else {
                continue;
            };
            if let Some(transform) = entity.transform_mut() {
                let y = transform.position.y;
                if y > resting_y {
                    transform.position.y = (y - fall).max(resting_y);
                }
            }
        }
    }

    fn collect_landed(&mut self, world: &mut World, out: &mut Vec<Event>) {
        self.scratch.clear();
        self.scratch.extend(world.store().iter().filter_map(|entity| {
            let collectable = entity.collectable()?;
            let y = entity.transform()?.position.y;
            (y <= collectable.resting_y).then_some(entity.id())
        }));
        for &pickup in &self.scratch {
            let _ = collect(world, pickup, out);
        }
    }
}

/// Collects a pickup, crediting its value once.
///
/// Returns the credited amount, or `None` when the pickup is stale, inactive
/// or already collected.
pub fn collect(world: &mut World, pickup: EntityId, out: &mut Vec<Event>) -> Option<u32> {
    let collectable = world
        .store_mut()
        .get_active_mut(pickup)?
        .collectable_mut()?;
    if collectable.collected {
        return None;
    }
    collectable.collected = true;
    let value = collectable.value;

    world.ledger_mut().credit(value);
    let _ = world.store_mut().destroy(pickup);
    out.push(Event::Feedback {
        cue: Cue::SunCollected,
        intensity: Some(value as f32),
    });
    out.push(Event::PickupCollected { pickup, value });
    Some(value)
}

/// Collects the uncollected pickup nearest to `position` on the ground plane,
/// if one lies within the configured collect radius.
pub fn collect_at(world: &mut World, position: Vec3, out: &mut Vec<Event>) -> Option<u32> {
    let radius = world.config().economy.collect_radius;
    let nearest = world
        .store()
        .iter()
        .filter_map(|entity| {
            let collectable = entity.collectable()?;
            if collectable.collected {
                return None;
            }
            let at = entity.transform()?.position;
            let dx = at.x - position.x;
            let dz = at.z - position.z;
            let distance = (dx * dx + dz * dz).sqrt();
            (distance <= radius).then_some((entity.id(), distance))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id)?;
    collect(world, nearest, out)
}
