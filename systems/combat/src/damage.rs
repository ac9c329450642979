//! Shared damage path for attackers and defenders.

use lawn_defence_core::{BehaviorState, Cue, EntityId, Event};
use lawn_defence_world::World;

/// Result of routing damage to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The entity was stale, inactive, of the wrong category or had no health.
    Ignored,
    /// The entity survived.
    Wounded {
        /// Health left after the hit.
        remaining: i32,
    },
    /// This hit killed the entity and death processing ran.
    Killed,
}

/// Damages an attacker, running death processing when its health depletes.
///
/// Death credits the kill reward, marks the attacker `Dying`, queues it for
/// removal and emits the death cue. Only the hit that crosses zero reaches
/// this path, so the reward is paid once.
pub fn damage_attacker(
    world: &mut World,
    attacker: EntityId,
    amount: i32,
    out: &mut Vec<Event>,
) -> DamageOutcome {
    let Some(entity) = world.store_mut().get_active_mut(attacker) else {
        return DamageOutcome::Ignored;
    };
    let Some(kind) = entity.attacker().map(|profile| profile.kind) else {
        return DamageOutcome::Ignored;
    };
    let Some(health) = entity.health_mut() else {
        return DamageOutcome::Ignored;
    };
    if !health.apply_damage(amount) {
        return DamageOutcome::Wounded {
            remaining: health.current(),
        };
    }
    if let Some(profile) = entity.attacker_mut() {
        profile.state = BehaviorState::Dying;
        profile.target = None;
    }

    let reward = match world.config().attacker(kind) {
        Some(stats) => stats.kill_reward,
        None => {
            log::error!("no stats for attacker `{}`; kill reward skipped", kind.name());
            0
        }
    };
    world.ledger_mut().credit(reward);
    let _ = world.store_mut().destroy(attacker);
    log::debug!("attacker `{}` {attacker} defeated", kind.name());

    out.push(Event::Feedback {
        cue: Cue::EnemyDeath,
        intensity: None,
    });
    out.push(Event::AttackerDefeated {
        attacker,
        kind,
        reward,
    });
    DamageOutcome::Killed
}

/// Damages a defender, releasing its cell when its health depletes.
pub fn damage_defender(
    world: &mut World,
    defender: EntityId,
    amount: i32,
    out: &mut Vec<Event>,
) -> DamageOutcome {
    let Some(entity) = world.store_mut().get_active_mut(defender) else {
        return DamageOutcome::Ignored;
    };
    if entity.defender().is_none() {
        return DamageOutcome::Ignored;
    }
    let Some(health) = entity.health_mut() else {
        return DamageOutcome::Ignored;
    };
    if !health.apply_damage(amount) {
        return DamageOutcome::Wounded {
            remaining: health.current(),
        };
    }

    let cell = world.remove_defender(defender);
    log::debug!("defender {defender} destroyed");
    out.push(Event::Feedback {
        cue: Cue::DefenderDeath,
        intensity: None,
    });
    out.push(Event::DefenderDestroyed { defender, cell });
    DamageOutcome::Killed
}
