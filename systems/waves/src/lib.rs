#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave director that turns the wave table into timed attacker spawns.
//!
//! Starting a wave flattens its attacker groups into a single schedule
//! sorted by due time. Groups of a wave run side by side: every group starts
//! counting at the wave's delay. Lanes and spawn jitter come from a seeded
//! ChaCha stream so a session replays identically for the same seed.

use std::time::Duration;

use lawn_defence_core::{AttackerKind, Event};
use lawn_defence_world::{query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One attacker the active wave will spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledSpawn {
    /// Simulation time at which the attacker becomes due.
    pub due: Duration,
    /// Kind of attacker to spawn.
    pub kind: AttackerKind,
    /// Whether the entry already fired.
    pub spawned: bool,
}

/// Snapshot of the active wave's progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveProgress {
    /// One-based wave number, zero before the first wave.
    pub wave: u32,
    /// Entries spawned so far.
    pub spawned: u32,
    /// Entries scheduled for the wave.
    pub total: u32,
    /// Spawned attackers no longer on the field.
    pub defeated: u32,
    /// Attackers still on the field.
    pub remaining: u32,
    /// Fraction of the wave defeated; zero for an empty schedule.
    pub progress: f32,
}

/// Wave scheduling system.
#[derive(Debug)]
pub struct WaveDirector {
    seed: u64,
    rng: ChaCha8Rng,
    current_wave: u32,
    active: bool,
    exhausted: bool,
    schedule: Vec<ScheduledSpawn>,
    spawned: u32,
}

impl WaveDirector {
    /// Creates a director that has not started any wave.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            current_wave: 0,
            active: false,
            exhausted: false,
            schedule: Vec::new(),
            spawned: 0,
        }
    }

    /// Forgets every wave and rewinds the random stream to the seed.
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Number of the most recently started wave, zero before the first.
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Reports whether a wave is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Schedule of the current wave, sorted by due time.
    #[must_use]
    pub fn schedule(&self) -> &[ScheduledSpawn] {
        &self.schedule
    }

    /// Starts wave `wave`, or the wave after the current one when `None`.
    ///
    /// Returns `false` and marks the table exhausted when the wave lies past
    /// the end of the table. Wave numbers start at one; wave zero is refused
    /// without touching the table. Due times are measured from the world's
    /// current time.
    pub fn start_wave(&mut self, world: &World, wave: Option<u32>) -> bool {
        let number = wave.unwrap_or(self.current_wave + 1);
        if number == 0 {
            log::warn!("ignored request to start wave 0");
            return false;
        }
        let Some(descriptor) = world.config().wave(number) else {
            self.exhausted = true;
            self.active = false;
            log::info!("wave table exhausted after wave {}", self.current_wave);
            return false;
        };

        let start = world.now() + descriptor.delay;
        self.schedule.clear();
        for group in &descriptor.groups {
            if world.config().attacker(group.kind).is_none() {
                log::error!(
                    "wave {number} group `{}` has no stats; its spawns are dropped",
                    group.kind.name()
                );
                continue;
            }
            self.schedule
                .extend((0..group.count).map(|index| ScheduledSpawn {
                    due: start + group.interval * index,
                    kind: group.kind,
                    spawned: false,
                }));
        }
        self.schedule.sort_by_key(|entry| entry.due);

        self.current_wave = number;
        self.spawned = 0;
        self.active = true;
        log::info!("wave {number} started with {} spawns", self.schedule.len());
        true
    }

    /// Spawns every schedule entry whose due time has passed.
    pub fn update(&mut self, world: &mut World, out: &mut Vec<Event>) {
        if !self.active {
            return;
        }

        let now = world.now();
        let rows = world.grid().rows();
        let spawn_x = world.grid().spawn_x();
        let jitter = world.config().grid.spawn_jitter;

        for entry in self.schedule.iter_mut() {
            if entry.spawned || entry.due > now {
                continue;
            }
            entry.spawned = true;
            self.spawned += 1;

            let lane = self.rng.gen_range(0..rows);
            let offset = if jitter > 0.0 {
                self.rng.gen_range(-jitter..=jitter)
            } else {
                0.0
            };
            if let Some(attacker) = world.spawn_attacker(entry.kind, lane, spawn_x + offset) {
                out.push(Event::AttackerSpawned {
                    attacker,
                    kind: entry.kind,
                    lane,
                });
            }
        }
    }

    /// Reports whether the current wave has fully spawned and no attacker
    /// remains. A positive answer deactivates the wave.
    ///
    /// The answer is recomputed on every call because the number of live
    /// attackers depends on combat.
    pub fn is_wave_complete(&mut self, world: &World) -> bool {
        if self.current_wave == 0 || !self.fully_spawned() {
            return false;
        }
        if query::active_attackers(world) > 0 {
            return false;
        }
        if self.active {
            self.active = false;
            log::info!("wave {} complete", self.current_wave);
        }
        true
    }

    /// Reports whether the wave table is exhausted and the field is clear.
    #[must_use]
    pub fn is_all_waves_complete(&self, world: &World) -> bool {
        let table_done = self.exhausted
            || (self.current_wave >= world.config().wave_count() && self.fully_spawned());
        table_done && query::active_attackers(world) == 0
    }

    /// Progress of the current wave.
    #[must_use]
    pub fn progress(&self, world: &World) -> WaveProgress {
        let total = u32::try_from(self.schedule.len()).unwrap_or(u32::MAX);
        let remaining = u32::try_from(query::active_attackers(world)).unwrap_or(u32::MAX);
        let defeated = self.spawned.saturating_sub(remaining);
        let progress = if total == 0 {
            0.0
        } else {
            defeated as f32 / total as f32
        };
        WaveProgress {
            wave: self.current_wave,
            spawned: self.spawned,
            total,
            defeated,
            remaining,
            progress,
        }
    }

    /// Entries of the current wave spawned so far.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    fn fully_spawned(&self) -> bool {
        self.schedule.iter().all(|entry| entry.spawned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::SimConfig;

    fn world() -> World {
        World::headless(SimConfig::standard()).expect("standard config is valid")
    }

    #[test]
    fn starting_past_the_table_exhausts_it() {
        let world = world();
        let mut director = WaveDirector::new(1);

        assert!(!director.start_wave(&world, Some(6)));
        assert!(!director.is_active());
        assert!(director.is_all_waves_complete(&world));
    }

    #[test]
    fn wave_zero_is_refused_without_ending_the_game() {
        let world = world();
        let mut director = WaveDirector::new(1);

        assert!(!director.start_wave(&world, Some(0)));
        assert!(!director.is_active());
        assert_eq!(director.current_wave(), 0);
        assert!(!director.is_all_waves_complete(&world));

        assert!(director.start_wave(&world, None));
        assert_eq!(director.current_wave(), 1);
    }

    #[test]
    fn waves_advance_one_at_a_time() {
        let world = world();
        let mut director = WaveDirector::new(1);

        assert!(director.start_wave(&world, None));
        assert_eq!(director.current_wave(), 1);
        assert_eq!(director.schedule().len(), 3);
        assert!(director.start_wave(&world, None));
        assert_eq!(director.current_wave(), 2);
        assert_eq!(director.schedule().len(), 7);
    }

    #[test]
    fn concurrent_groups_are_merged_in_due_order() {
        let world = world();
        let mut director = WaveDirector::new(1);
        assert!(director.start_wave(&world, Some(2)));

        let dues: Vec<u64> = director
            .schedule()
            .iter()
            .map(|entry| entry.due.as_millis() as u64)
            .collect();
        assert_eq!(
            dues,
            vec![2_000, 2_000, 6_000, 10_000, 11_000, 14_000, 18_000]
        );
    }

    #[test]
    fn progress_tolerates_an_empty_schedule() {
        let world = world();
        let director = WaveDirector::new(1);
        let progress = director.progress(&world);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.progress, 0.0);
        assert_eq!(progress.wave, 0);
    }

    #[test]
    fn wave_complete_is_false_before_any_wave() {
        let world = world();
        let mut director = WaveDirector::new(1);
        assert!(!director.is_wave_complete(&world));
    }

    #[test]
    fn reset_replays_the_same_lanes() {
        let mut first = world();
        let mut director = WaveDirector::new(42);
        let mut events = Vec::new();
        assert!(director.start_wave(&first, Some(5)));
        first.set_now(Duration::from_secs(60));
        director.update(&mut first, &mut events);
        let lanes = |events: &[Event]| -> Vec<u32> {
            events
                .iter()
                .filter_map(|event| match event {
                    Event::AttackerSpawned { lane, .. } => Some(*lane),
                    _ => None,
                })
                .collect()
        };
        let before = lanes(&events);

        director.reset();
        let mut second = world();
        let mut replay = Vec::new();
        assert!(director.start_wave(&second, Some(5)));
        second.set_now(Duration::from_secs(60));
        director.update(&mut second, &mut replay);

        assert_eq!(before.len(), 18);
        assert_eq!(before, lanes(&replay));
        assert_eq!(director.spawned(), 18);
    }
}
