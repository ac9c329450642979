#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution: ranged fire, projectile flight, fused explosives and
//! the damage path shared with melee attackers.

mod damage;
mod explosives;
mod fire;
mod projectiles;

use std::time::Duration;

use lawn_defence_core::{EntityId, Event};
use lawn_defence_world::World;

pub use damage::{damage_attacker, damage_defender, DamageOutcome};

/// Combat system that resolves one frame of fire, flight and detonations.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<EntityId>,
}

impl Combat {
    /// Creates a combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs explosives, then ranged fire, then projectile flight and hits.
    ///
    /// Projectiles spawned this frame move in the same frame, so a shooter
    /// standing next to its target lands the hit without a frame of delay.
    pub fn handle(&mut self, world: &mut World, dt: Duration, out: &mut Vec<Event>) {
        explosives::burn_fuses(world, dt, &mut self.scratch, out);
        fire::fire(world, &mut self.scratch, out);
        projectiles::advance(world, dt, &mut self.scratch, out);
    }
}
