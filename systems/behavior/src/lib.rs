#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Attacker state machine: walking down the lane, stopping to bite defenders
//! and breaching the house.
//!
//! Blocking uses a fixed band in front of each defender. An attacker that
//! covers more than the band in a single frame can step over a defender
//! without being blocked; fast attackers at low frame rates are the only
//! ones that can do so.

use std::time::Duration;

use lawn_defence_core::{BehaviorState, Category, EntityId, Event};
use lawn_defence_system_combat::{damage_defender, DamageOutcome};
use lawn_defence_world::{query, World};

/// Enemy behaviour system that advances every attacker by one frame.
#[derive(Debug, Default)]
pub struct Behavior {
    scratch: Vec<EntityId>,
}

impl Behavior {
    /// Creates a behaviour system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks, blocks and bites for every active attacker.
    pub fn handle(&mut self, world: &mut World, dt: Duration, out: &mut Vec<Event>) {
        self.scratch.clear();
        self.scratch
            .extend(world.store().query_by_category(Category::Attacker));

        for &attacker in &self.scratch {
            let Some(state) = world
                .store()
                .get_active(attacker)
                .and_then(|entity| entity.attacker())
                .map(|profile| profile.state)
            else {
                continue;
            };
            match state {
                BehaviorState::Walking => walk(world, attacker, dt, out),
                BehaviorState::Attacking => bite(world, attacker, out),
                BehaviorState::Dying => {}
            }
        }
    }
}

/// Copy of the per-kind stats the state machine needs.
#[derive(Clone, Copy)]
struct Stats {
    speed: f32,
    melee_damage: i32,
    attack_interval: Duration,
}

fn stats(world: &World, attacker: EntityId) -> Option<Stats> {
    let kind = world.store().get_active(attacker)?.attacker()?.kind;
    match world.config().attacker(kind) {
        Some(stats) => Some(Stats {
            speed: stats.speed,
            melee_damage: stats.melee_damage,
            attack_interval: stats.attack_interval,
        }),
        None => {
            log::error!("no stats for attacker `{}`; {attacker} stays inert", kind.name());
            None
        }
    }
}

fn walk(world: &mut World, attacker: EntityId, dt: Duration, out: &mut Vec<Event>) {
    let Some(stats) = stats(world, attacker) else {
        return;
    };
    let block_range = world.config().combat.block_range;
    let goal_x = world.grid().goal_x();
    let now = world.now();

    let Some(entity) = world.store().get_active(attacker) else {
        return;
    };
    let (Some(profile), Some(transform)) = (entity.attacker(), entity.transform()) else {
        return;
    };
    let lane = profile.lane;
    let x = transform.position.x;

    let blocker = query::lane_defenders(world, lane)
        .into_iter()
        .filter(|(_, position)| {
            let gap = x - position.x;
            (0.0..=block_range).contains(&gap)
        })
        .max_by(|(_, a), (_, b)| a.x.total_cmp(&b.x))
        .map(|(id, _)| id);

    let Some(entity) = world.store_mut().get_active_mut(attacker) else {
        return;
    };
    if let Some(defender) = blocker {
        if let Some(profile) = entity.attacker_mut() {
            profile.state = BehaviorState::Attacking;
            profile.target = Some(defender);
            profile.last_attack = now;
        }
        log::debug!("attacker {attacker} blocked by {defender}");
        return;
    }

    let Some(transform) = entity.transform_mut() else {
        return;
    };
    transform.position.x -= stats.speed * dt.as_secs_f32();
    let crossed = transform.position.x <= goal_x;

    if let Some(profile) = entity.attacker_mut() {
        if crossed && !profile.reached_goal {
            profile.reached_goal = true;
            log::debug!("attacker {attacker} reached the house in lane {lane}");
            out.push(Event::GoalReached { attacker, lane });
        }
    }
}

fn bite(world: &mut World, attacker: EntityId, out: &mut Vec<Event>) {
    let Some(stats) = stats(world, attacker) else {
        return;
    };
    let now = world.now();
    let Some(profile) = world
        .store()
        .get_active(attacker)
        .and_then(|entity| entity.attacker())
    else {
        return;
    };
    let target = profile
        .target
        .filter(|defender| world.store().is_active(*defender));
    let last_attack = profile.last_attack;

    let Some(defender) = target else {
        resume_walking(world, attacker);
        return;
    };
    if now.saturating_sub(last_attack) < stats.attack_interval {
        return;
    }

    if let Some(profile) = world
        .store_mut()
        .get_active_mut(attacker)
        .and_then(|entity| entity.attacker_mut())
    {
        profile.last_attack = now;
    }
    match damage_defender(world, defender, stats.melee_damage, out) {
        DamageOutcome::Killed | DamageOutcome::Ignored => resume_walking(world, attacker),
        DamageOutcome::Wounded { .. } => {}
    }
}

fn resume_walking(world: &mut World, attacker: EntityId) {
    if let Some(profile) = world
        .store_mut()
        .get_active_mut(attacker)
        .and_then(|entity| entity.attacker_mut())
    {
        profile.state = BehaviorState::Walking;
        profile.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::{AttackerKind, CellCoord, DefenderKind, SimConfig};

    fn world() -> World {
        World::headless(SimConfig::standard()).expect("standard config is valid")
    }

    fn profile(world: &World, attacker: EntityId) -> lawn_defence_core::AttackerProfile {
        *world
            .store()
            .get(attacker)
            .and_then(|entity| entity.attacker())
            .expect("attacker profile")
    }

    #[test]
    fn walking_attacker_moves_toward_the_house() {
        let mut world = world();
        let attacker = world
            .spawn_attacker(AttackerKind::Basic, 0, 8.0)
            .expect("spawned");
        let mut events = Vec::new();

        Behavior::new().handle(&mut world, Duration::from_secs(1), &mut events);

        let x = world
            .store()
            .get(attacker)
            .and_then(|entity| entity.transform())
            .map(|transform| transform.position.x)
            .expect("transform");
        assert!((x - 7.8).abs() < 1e-5);
        assert!(events.is_empty());
    }

    #[test]
    fn defender_in_band_blocks_and_captures_target() {
        let mut world = world();
        let defender = world
            .spawn_defender(DefenderKind::WallNut, CellCoord::new(1, 3))
            .expect("placed");
        let attacker = world
            .spawn_attacker(AttackerKind::Basic, 1, 3.8)
            .expect("spawned");
        world.set_now(Duration::from_secs(4));

        Behavior::new().handle(&mut world, Duration::from_millis(16), &mut Vec::new());

        let profile = profile(&world, attacker);
        assert_eq!(profile.state, BehaviorState::Attacking);
        assert_eq!(profile.target, Some(defender));
        assert_eq!(profile.last_attack, Duration::from_secs(4));
    }

    #[test]
    fn defenders_behind_or_in_other_lanes_do_not_block() {
        let mut world = world();
        let _ = world.spawn_defender(DefenderKind::WallNut, CellCoord::new(1, 5));
        let _ = world.spawn_defender(DefenderKind::WallNut, CellCoord::new(2, 3));
        let attacker = world
            .spawn_attacker(AttackerKind::Basic, 1, 3.8)
            .expect("spawned");

        Behavior::new().handle(&mut world, Duration::from_millis(16), &mut Vec::new());

        assert_eq!(profile(&world, attacker).state, BehaviorState::Walking);
    }

    #[test]
    fn lost_target_sends_the_attacker_walking_again() {
        let mut world = world();
        let defender = world
            .spawn_defender(DefenderKind::WallNut, CellCoord::new(0, 3))
            .expect("placed");
        let attacker = world
            .spawn_attacker(AttackerKind::Basic, 0, 3.7)
            .expect("spawned");
        let mut behavior = Behavior::new();
        behavior.handle(&mut world, Duration::from_millis(16), &mut Vec::new());
        assert_eq!(profile(&world, attacker).state, BehaviorState::Attacking);

        let _ = world.remove_defender(defender);
        behavior.handle(&mut world, Duration::from_millis(16), &mut Vec::new());

        let profile = profile(&world, attacker);
        assert_eq!(profile.state, BehaviorState::Walking);
        assert_eq!(profile.target, None);
    }

    #[test]
    fn goal_is_reported_once() {
        let mut world = world();
        let attacker = world
            .spawn_attacker(AttackerKind::Runner, 2, -0.4)
            .expect("spawned");
        let mut behavior = Behavior::new();
        let mut events = Vec::new();

        for _ in 0..3 {
            behavior.handle(&mut world, Duration::from_millis(500), &mut events);
        }

        assert_eq!(events, vec![Event::GoalReached { attacker, lane: 2 }]);
        assert!(query::goal_reached(&world));
    }

    #[test]
    fn dying_attackers_are_left_alone() {
        let mut world = world();
        let attacker = world
            .spawn_attacker(AttackerKind::Basic, 0, 5.0)
            .expect("spawned");
        if let Some(profile) = world
            .store_mut()
            .get_active_mut(attacker)
            .and_then(|entity| entity.attacker_mut())
        {
            profile.state = BehaviorState::Dying;
        }

        Behavior::new().handle(&mut world, Duration::from_secs(1), &mut Vec::new());

        let x = world
            .store()
            .get(attacker)
            .and_then(|entity| entity.transform())
            .map(|transform| transform.position.x);
        assert_eq!(x, Some(5.0));
    }
}
