#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven game loop for Lawn Defence.
//!
//! [`Simulation::tick`] advances one rendered frame in a fixed order:
//!
//! 1. queued player inputs are resolved,
//! 2. waves are scheduled and due attackers spawn,
//! 3. the economy produces, drops and settles sun,
//! 4. attackers walk, block and bite,
//! 5. combat fires, moves projectiles and detonates explosives,
//! 6. timed lives expire,
//! 7. ledger, wave and outcome checks emit their events,
//! 8. destroyed entities are flushed,
//! 9. the presenter animates what is left.
//!
//! Steps 2 through 6 only run while the scaled frame delta is non-zero, so a
//! paused game freezes every cooldown, fuse and schedule. Combat runs after
//! behaviour so an attacker that just got blocked can be shot in the same
//! frame, and the flush runs last so no system ever walks a half-removed
//! entity list.

mod clock;
mod lifetime;
mod placement;

use std::time::Duration;

use glam::Vec3;
use lawn_defence_core::{
    CellCoord, ConfigError, Cue, DefenderKind, EntityId, Event, Outcome, PlacementError,
    Presenter, SimConfig,
};
use lawn_defence_system_behavior::Behavior;
use lawn_defence_system_combat::Combat;
use lawn_defence_system_economy::{self as economy, Economy};
use lawn_defence_system_waves::{WaveDirector, WaveProgress};
use lawn_defence_world::{query, World};

pub use clock::GameClock;

use placement::Placement;

/// Player input queued for resolution at the start of the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    /// Changes the selected defender kind.
    Select(Option<DefenderKind>),
    /// Places a defender of the given kind at a world position.
    Place {
        /// Target position on the lawn.
        position: Vec3,
        /// Kind to place.
        kind: DefenderKind,
    },
    /// Places the selected defender at a world position.
    PlaceSelected {
        /// Target position on the lawn.
        position: Vec3,
    },
    /// Digs up the defender standing on a cell.
    Remove {
        /// Cell to clear.
        cell: CellCoord,
    },
    /// Collects the pickup nearest to a world position.
    Collect {
        /// Position the player clicked.
        position: Vec3,
    },
}

/// Identity of one play session.
///
/// Hosts capture the token before scheduling deferred work and present it
/// when the work runs; [`Simulation::restart`] invalidates every token
/// issued before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

/// Complete simulation: world state, systems, clock and session bookkeeping.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    clock: GameClock,
    waves: WaveDirector,
    economy: Economy,
    behavior: Behavior,
    combat: Combat,
    placement: Placement,
    inputs: Vec<Input>,
    events: Vec<Event>,
    scratch: Vec<EntityId>,
    outcome: Outcome,
    session: u64,
    next_wave_at: Option<Duration>,
}

impl Simulation {
    /// Builds a simulation from a configuration and a presentation backend.
    pub fn new(config: SimConfig, presenter: Box<dyn Presenter>) -> Result<Self, ConfigError> {
        let seed = config.seed;
        let max_delta = config.timing.max_frame_delta;
        let first_wave = config.timing.first_wave_delay;
        let world = World::new(config, presenter)?;
        let starting_sun = world.ledger().amount();

        Ok(Self {
            world,
            clock: GameClock::new(max_delta),
            waves: WaveDirector::new(seed),
            economy: Economy::new(seed),
            behavior: Behavior::new(),
            combat: Combat::new(),
            placement: Placement::default(),
            inputs: Vec::new(),
            events: vec![Event::SunChanged {
                amount: starting_sun,
            }],
            scratch: Vec::new(),
            outcome: Outcome::Running,
            session: 0,
            next_wave_at: Some(first_wave),
        })
    }

    /// Builds a simulation without presentation.
    pub fn headless(config: SimConfig) -> Result<Self, ConfigError> {
        Self::new(config, Box::new(lawn_defence_world::HeadlessPresenter::new()))
    }

    /// Read access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The simulation clock.
    #[must_use]
    pub const fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Current outcome of the session.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Sun currently held.
    #[must_use]
    pub fn sun(&self) -> u32 {
        self.world.ledger().amount()
    }

    /// Reports whether the ledger covers the cost of `kind`.
    #[must_use]
    pub fn can_afford(&self, kind: DefenderKind) -> bool {
        self.world
            .config()
            .defender(kind)
            .map_or(false, |stats| self.world.ledger().can_afford(stats.cost))
    }

    /// Wave director state.
    #[must_use]
    pub const fn waves(&self) -> &WaveDirector {
        &self.waves
    }

    /// Progress of the current wave.
    #[must_use]
    pub fn wave_progress(&self) -> WaveProgress {
        self.waves.progress(&self.world)
    }

    /// Simulation time at which the next wave starts on its own, if scheduled.
    #[must_use]
    pub const fn next_wave_at(&self) -> Option<Duration> {
        self.next_wave_at
    }

    /// Token identifying the current session.
    #[must_use]
    pub const fn session(&self) -> SessionToken {
        SessionToken(self.session)
    }

    /// Changes the time scale; zero pauses and values above one fast-forward.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.clock.set_time_scale(scale);
    }

    /// Currently selected defender kind.
    #[must_use]
    pub const fn selected(&self) -> Option<DefenderKind> {
        self.placement.selected()
    }

    /// Selects the defender kind used by previews and [`Input::PlaceSelected`].
    pub fn select(&mut self, kind: Option<DefenderKind>) {
        self.placement.select(kind);
    }

    /// Reports whether the selected defender could be placed at `position`.
    #[must_use]
    pub fn preview(&self, position: Vec3) -> bool {
        self.placement.preview(&self.world, position)
    }

    /// Time left before `kind` can be placed again.
    #[must_use]
    pub fn recharge_remaining(&self, kind: DefenderKind) -> Duration {
        self.placement.recharge_remaining(kind, self.world.now())
    }

    /// Places a defender immediately, debiting its cost.
    pub fn try_place(
        &mut self,
        position: Vec3,
        kind: DefenderKind,
    ) -> Result<EntityId, PlacementError> {
        if self.outcome != Outcome::Running {
            return Err(PlacementError::GameOver);
        }
        let (cell, cost) = self.placement.validate(&self.world, position, kind)?;
        if !self.world.ledger_mut().debit(cost) {
            return Err(PlacementError::InsufficientSun);
        }
        let Some(defender) = self.world.spawn_defender(kind, cell) else {
            log::error!("validated placement of `{}` at {cell} failed", kind.name());
            self.world.ledger_mut().credit(cost);
            return Err(PlacementError::Occupied);
        };

        self.placement.placed(&self.world, kind);
        self.events.push(Event::Feedback {
            cue: Cue::Placed,
            intensity: None,
        });
        self.events.push(Event::DefenderPlaced {
            defender,
            kind,
            cell,
        });
        Ok(defender)
    }

    /// Places the selected defender at `position`.
    pub fn place_selected(&mut self, position: Vec3) -> Result<EntityId, PlacementError> {
        let kind = self.placement.selected().ok_or(PlacementError::NoSelection)?;
        self.try_place(position, kind)
    }

    /// Digs up the defender on `cell` without refunding it.
    pub fn remove_defender(&mut self, cell: CellCoord) -> Option<EntityId> {
        if self.outcome != Outcome::Running {
            return None;
        }
        let defender = self.world.grid().occupant(cell)?;
        let released = self.world.remove_defender(defender)?;
        self.events.push(Event::DefenderRemoved {
            defender,
            cell: released,
        });
        Some(defender)
    }

    /// Collects a pickup by handle.
    pub fn collect(&mut self, pickup: EntityId) -> Option<u32> {
        if self.outcome != Outcome::Running {
            return None;
        }
        economy::collect(&mut self.world, pickup, &mut self.events)
    }

    /// Collects the pickup nearest to `position`.
    pub fn collect_at(&mut self, position: Vec3) -> Option<u32> {
        if self.outcome != Outcome::Running {
            return None;
        }
        economy::collect_at(&mut self.world, position, &mut self.events)
    }

    /// Queues an input for the start of the next tick.
    pub fn queue(&mut self, input: Input) {
        self.inputs.push(input);
    }

    /// Starts the next wave ahead of its timer.
    ///
    /// Refuses tokens from an earlier session, finished games and requests
    /// made while a wave is still running.
    pub fn start_next_wave(&mut self, token: SessionToken) -> bool {
        if token != self.session() {
            log::warn!("ignored wave request from stale session {}", token.0);
            return false;
        }
        if self.outcome != Outcome::Running || self.waves.is_active() {
            return false;
        }
        self.begin_next_wave()
    }

    /// Discards the session and starts over from the configuration.
    pub fn restart(&mut self) {
        self.world.reset();
        self.waves.reset();
        self.economy.reset();
        self.placement.reset();
        self.clock.reset();
        self.inputs.clear();
        self.events.clear();
        self.outcome = Outcome::Running;
        self.session += 1;
        self.next_wave_at = Some(self.world.config().timing.first_wave_delay);
        log::info!("session {} started", self.session);
    }

    /// Drains the events produced since the last call.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, Event> {
        self.events.drain(..)
    }

    /// Advances the simulation by one frame of raw host time.
    ///
    /// Once the outcome is decided the simulation is frozen and further ticks
    /// only report it.
    pub fn tick(&mut self, raw_dt: Duration) -> Outcome {
        if self.outcome != Outcome::Running {
            return self.outcome;
        }

        let dt = self.clock.advance(raw_dt);
        self.world.set_now(self.clock.elapsed());
        self.resolve_inputs();
        let mark = self.events.len();

        if !dt.is_zero() {
            self.schedule_waves();
            self.economy.handle(&mut self.world, dt, &mut self.events);
            self.behavior.handle(&mut self.world, dt, &mut self.events);
            self.combat.handle(&mut self.world, dt, &mut self.events);
            lifetime::sweep(&mut self.world, dt, &mut self.scratch, &mut self.events);
        }

        self.check_progress(mark);
        let _ = self.world.flush();
        self.world.animate();
        self.outcome
    }

    fn resolve_inputs(&mut self) {
        let inputs = std::mem::take(&mut self.inputs);
        for input in inputs {
            let result = match input {
                Input::Select(kind) => {
                    self.select(kind);
                    Ok(())
                }
                Input::Place { position, kind } => self.try_place(position, kind).map(drop),
                Input::PlaceSelected { position } => self.place_selected(position).map(drop),
                Input::Remove { cell } => {
                    let _ = self.remove_defender(cell);
                    Ok(())
                }
                Input::Collect { position } => {
                    let _ = self.collect_at(position);
                    Ok(())
                }
            };
            if let Err(reason) = result {
                log::debug!("input {input:?} rejected: {reason}");
            }
        }
    }

    fn schedule_waves(&mut self) {
        if let Some(at) = self.next_wave_at {
            if self.world.now() >= at {
                let _ = self.begin_next_wave();
            }
        }
        self.waves.update(&mut self.world, &mut self.events);
    }

    fn begin_next_wave(&mut self) -> bool {
        self.next_wave_at = None;
        if !self.waves.start_wave(&self.world, None) {
            return false;
        }
        self.events.push(Event::WaveStarted {
            wave: self.waves.current_wave(),
        });
        true
    }

    /// Emits wave and outcome events for the tick whose events start at `mark`.
    ///
    /// A breach reported this tick loses the game even when the attacker was
    /// killed later in the same tick.
    fn check_progress(&mut self, mark: usize) {
        for amount in self.world.ledger_mut().drain_changes() {
            self.events.push(Event::SunChanged { amount });
        }

        if self.waves.is_active() && self.waves.is_wave_complete(&self.world) {
            let wave = self.waves.current_wave();
            self.events.push(Event::WaveCompleted { wave });
            if wave < self.world.config().wave_count() {
                let delay = self.world.config().timing.inter_wave_delay;
                self.next_wave_at = Some(self.world.now() + delay);
            }
        }

        let breached = self.events[mark..]
            .iter()
            .any(|event| matches!(event, Event::GoalReached { .. }));
        let outcome = if breached || query::goal_reached(&self.world) {
            Outcome::Lost
        } else if self.waves.is_all_waves_complete(&self.world) {
            Outcome::Won
        } else {
            Outcome::Running
        };
        if outcome != Outcome::Running {
            self.outcome = outcome;
            self.next_wave_at = None;
            log::info!("game over: {outcome:?}");
            self.events.push(Event::OutcomeDecided { outcome });
        }
    }
}
