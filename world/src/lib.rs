#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Lawn Defence.
//!
//! The [`World`] bundles the entity store, the lawn grid, the sun ledger and
//! the presentation pools behind factory methods that keep them consistent:
//! a defender is never stored without occupying its cell, and a flushed
//! entity always hands its presentation back to the host or its pool.

mod grid;
mod ledger;
mod pool;
mod presenter;
mod store;

use std::{f32::consts::PI, time::Duration};

use glam::Vec3;
use lawn_defence_core::{
    AttackerKind, AttackerProfile, CellCoord, Category, Collectable, Component, ConfigError,
    DefenderKind, DefenderProfile, DefenderRole, EntityId, EntityView, Explosive, Health,
    Presenter, Projectile, Shooter, SimConfig, Subtype, SunProducer, TimedLife, Transform,
};

pub use grid::LawnGrid;
pub use ledger::SunLedger;
pub use pool::{HandlePool, Lease, PoolKind, PoolSlot};
pub use presenter::HeadlessPresenter;
pub use store::{Entity, EntityStore, Presentation};

/// Authoritative simulation state shared by every system.
pub struct World {
    config: SimConfig,
    store: EntityStore,
    grid: LawnGrid,
    ledger: SunLedger,
    projectile_pool: HandlePool,
    pickup_pool: HandlePool,
    presenter: Box<dyn Presenter>,
    now: Duration,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("store", &self.store)
            .field("grid", &self.grid)
            .field("ledger", &self.ledger)
            .field("projectile_pool", &self.projectile_pool)
            .field("pickup_pool", &self.pickup_pool)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Validates the configuration and builds an empty world.
    pub fn new(config: SimConfig, mut presenter: Box<dyn Presenter>) -> Result<Self, ConfigError> {
        config.validate()?;

        let projectile_pool = HandlePool::new(
            PoolKind::Projectiles,
            config.combat.projectile_pool_capacity,
            Subtype::Projectile,
            presenter.as_mut(),
        );
        let pickup_pool = HandlePool::new(
            PoolKind::Pickups,
            config.economy.pickup_pool_capacity,
            Subtype::Pickup(lawn_defence_core::PickupKind::Sun),
            presenter.as_mut(),
        );

        Ok(Self {
            store: EntityStore::new(),
            grid: LawnGrid::new(&config.grid),
            ledger: SunLedger::new(config.economy.starting_sun),
            projectile_pool,
            pickup_pool,
            presenter,
            now: Duration::ZERO,
            config,
        })
    }

    /// Builds a world backed by a [`HeadlessPresenter`].
    pub fn headless(config: SimConfig) -> Result<Self, ConfigError> {
        Self::new(config, Box::new(HeadlessPresenter::new()))
    }

    /// Static configuration of the session.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Scaled simulation time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Moves the simulation clock. Only the simulation loop advances time.
    pub fn set_now(&mut self, now: Duration) {
        self.now = now;
    }

    /// Read access to the entity store.
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Write access to the entity store.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Read access to the lawn grid.
    #[must_use]
    pub const fn grid(&self) -> &LawnGrid {
        &self.grid
    }

    /// Read access to the sun ledger.
    #[must_use]
    pub const fn ledger(&self) -> &SunLedger {
        &self.ledger
    }

    /// Write access to the sun ledger.
    pub fn ledger_mut(&mut self) -> &mut SunLedger {
        &mut self.ledger
    }

    /// Projectile handle pool.
    #[must_use]
    pub const fn projectile_pool(&self) -> &HandlePool {
        &self.projectile_pool
    }

    /// Pickup handle pool.
    #[must_use]
    pub const fn pickup_pool(&self) -> &HandlePool {
        &self.pickup_pool
    }

    /// Creates a defender on an empty cell without charging for it.
    ///
    /// Returns `None` when the cell is invalid or occupied, or when the
    /// configuration has no stats for the kind.
    pub fn spawn_defender(&mut self, kind: DefenderKind, cell: CellCoord) -> Option<EntityId> {
        let Some(stats) = self.config.defender(kind) else {
            log::error!("no stats for defender `{}`; placement skipped", kind.name());
            return None;
        };
        if !self.grid.is_empty(cell) {
            return None;
        }

        let now = self.now;
        let health = stats.health;
        let role = stats.role.clone();
        let position = self.grid.cell_to_world(cell);
        let id = self.store.create(Category::Defender);
        let entity = self.store.get_mut(id)?;
        entity.insert(Component::Transform(Transform::at(position)));
        entity.insert(Component::Health(Health::full(health)));
        entity.insert(Component::DefenderProfile(DefenderProfile {
            kind,
            cell,
            last_action: now,
        }));
        match role {
            DefenderRole::Shooter { interval, damage } => {
                entity.insert(Component::Shooter(Shooter {
                    interval,
                    damage,
                    last_shot: None,
                }));
            }
            DefenderRole::Producer { interval, value } => {
                entity.insert(Component::SunProducer(SunProducer {
                    interval,
                    value,
                    last_produced: now,
                }));
            }
            DefenderRole::Blocker => {}
            DefenderRole::Explosive {
                fuse,
                radius,
                damage,
            } => {
                entity.insert(Component::Explosive(Explosive {
                    radius,
                    damage,
                    fuse,
                    elapsed: Duration::ZERO,
                    exploded: false,
                }));
            }
        }

        let placed = self.grid.place(cell, id);
        debug_assert!(placed, "cell was checked empty");
        self.present(id, Subtype::Defender(kind));
        log::debug!("defender `{}` {id} placed at {cell}", kind.name());
        Some(id)
    }

    /// Creates a walking attacker in a lane at world `x`.
    pub fn spawn_attacker(&mut self, kind: AttackerKind, lane: u32, x: f32) -> Option<EntityId> {
        let Some(stats) = self.config.attacker(kind) else {
            log::error!("no stats for attacker `{}`; spawn skipped", kind.name());
            return None;
        };
        if lane >= self.grid.rows() {
            log::error!("attacker `{}` requested lane {lane} outside the lawn", kind.name());
            return None;
        }

        let health = stats.health;
        let position = Vec3::new(x, 0.0, self.grid.lane_z(lane));
        let id = self.store.create(Category::Attacker);
        let entity = self.store.get_mut(id)?;
        entity.insert(Component::Transform(Transform {
            position,
            rotation: PI,
        }));
        entity.insert(Component::Health(Health::full(health)));
        entity.insert(Component::AttackerProfile(AttackerProfile::walking(kind, lane)));
        self.present(id, Subtype::Attacker(kind));
        log::debug!("attacker `{}` {id} spawned in lane {lane}", kind.name());
        Some(id)
    }

    /// Creates a projectile travelling toward the far side of its lane.
    ///
    /// Returns `None` without logging an error when the pool is exhausted.
    pub fn spawn_projectile(&mut self, origin: Vec3, damage: i32) -> Option<EntityId> {
        let Some(lease) = self.projectile_pool.acquire() else {
            log::trace!("projectile pool exhausted; shot skipped");
            return None;
        };

        let speed = self.config.combat.projectile_speed;
        let id = self.store.create(Category::Projectile);
        let entity = self.store.get_mut(id)?;
        entity.insert(Component::Transform(Transform::at(origin)));
        entity.insert(Component::Projectile(Projectile {
            damage,
            speed,
            direction: Vec3::X,
        }));
        self.lend(id, PoolKind::Projectiles, lease);
        Some(id)
    }

    /// Creates a sun pickup that falls to `resting_y` and expires after the
    /// configured lifetime.
    pub fn spawn_pickup(&mut self, position: Vec3, value: u32, resting_y: f32) -> Option<EntityId> {
        let Some(lease) = self.pickup_pool.acquire() else {
            log::trace!("pickup pool exhausted; pickup skipped");
            return None;
        };

        let lifetime = self.config.economy.pickup_lifetime;
        let id = self.store.create(Category::Pickup);
        let entity = self.store.get_mut(id)?;
        entity.insert(Component::Transform(Transform::at(position)));
        entity.insert(Component::Collectable(Collectable::sun(value, resting_y)));
        entity.insert(Component::TimedLife(TimedLife {
            remaining: lifetime,
        }));
        self.lend(id, PoolKind::Pickups, lease);
        Some(id)
    }

    /// Removes an active defender from both its cell and the store.
    ///
    /// Returns the released cell, or `None` if the handle is stale, inactive
    /// or not a defender.
    pub fn remove_defender(&mut self, id: EntityId) -> Option<CellCoord> {
        let cell = self.store.get_active(id)?.defender()?.cell;
        if self.grid.occupant(cell) == Some(id) {
            let _ = self.grid.release(cell);
        } else {
            log::error!("defender {id} did not own its recorded cell {cell}");
        }
        let _ = self.store.destroy(id);
        Some(cell)
    }

    /// Physically removes entities destroyed this frame.
    ///
    /// Owned presentation handles are disposed, pooled ones go back to their
    /// pool, and any grid cell still pointing at a removed defender is
    /// released.
    pub fn flush(&mut self) -> usize {
        let presenter = &mut self.presenter;
        let projectile_pool = &mut self.projectile_pool;
        let pickup_pool = &mut self.pickup_pool;
        let grid = &mut self.grid;

        self.store.flush(|entity| {
            if entity.category() == Category::Defender {
                if let Some(cell) = grid.cell_of(entity.id()) {
                    log::error!("defender {} flushed while still holding {cell}", entity.id());
                    let _ = grid.release(cell);
                }
            }

            match entity.presentation() {
                Some(Presentation::Owned(handle)) => presenter.detach_and_dispose(handle),
                Some(Presentation::Pooled { pool, slot, handle }) => {
                    if let Some(handle) = handle {
                        presenter.park(handle);
                    }
                    let pool = match pool {
                        PoolKind::Projectiles => &mut *projectile_pool,
                        PoolKind::Pickups => &mut *pickup_pool,
                    };
                    if !pool.release(slot) {
                        log::error!("{:?} slot {} released twice", pool.kind(), slot.index());
                    }
                }
                None => {}
            }
        })
    }

    /// Hands every presented entity to the presenter's animation pass.
    pub fn animate(&mut self) {
        for entity in self.store.iter() {
            let Some(handle) = entity.presentation().and_then(|p| p.handle()) else {
                continue;
            };
            let view = EntityView {
                id: entity.id(),
                category: entity.category(),
                transform: entity.transform(),
                health: entity.health(),
                state: entity.attacker().map(|profile| profile.state),
            };
            self.presenter.animate(handle, view);
        }
    }

    /// Removes every entity and restores the opening ledger and clock.
    ///
    /// Cells are emptied before the flush; defenders torn down by a reset are
    /// not leaked cell holders.
    pub fn reset(&mut self) {
        self.grid.clear();
        let _ = self.store.destroy_all();
        let _ = self.flush();
        self.ledger.reset(self.config.economy.starting_sun);
        self.now = Duration::ZERO;
    }

    fn present(&mut self, id: EntityId, subtype: Subtype) {
        let Some(handle) = self.presenter.create(subtype) else {
            return;
        };
        self.presenter.attach(id, handle);
        if let Some(entity) = self.store.get_mut(id) {
            let _ = entity.set_presentation(Presentation::Owned(handle));
        }
    }

    fn lend(&mut self, id: EntityId, pool: PoolKind, lease: Lease) {
        if let Some(handle) = lease.handle {
            self.presenter.attach(id, handle);
        }
        if let Some(entity) = self.store.get_mut(id) {
            let _ = entity.set_presentation(Presentation::Pooled {
                pool,
                slot: lease.slot,
                handle: lease.handle,
            });
        }
    }
}

/// Read-only queries shared by systems and hosts.
pub mod query {
    use glam::Vec3;
    use lawn_defence_core::{BehaviorState, Category, EntityId};

    use super::World;

    /// Number of attackers still active.
    #[must_use]
    pub fn active_attackers(world: &World) -> usize {
        world.store().count(Category::Attacker)
    }

    /// Active, non-dying attackers in a lane, with their positions.
    #[must_use]
    pub fn lane_attackers(world: &World, lane: u32) -> Vec<(EntityId, Vec3)> {
        world
            .store()
            .iter()
            .filter_map(|entity| {
                let profile = entity.attacker()?;
                let transform = entity.transform()?;
                (profile.lane == lane && profile.state != BehaviorState::Dying)
                    .then_some((entity.id(), transform.position))
            })
            .collect()
    }

    /// Active defenders standing in a lane, ordered by column.
    #[must_use]
    pub fn lane_defenders(world: &World, lane: u32) -> Vec<(EntityId, Vec3)> {
        world
            .grid()
            .entities_in_row(lane)
            .into_iter()
            .filter_map(|(_, id)| {
                let entity = world.store().get_active(id)?;
                Some((id, entity.transform()?.position))
            })
            .collect()
    }

    /// Reports whether any active attacker has reached the house.
    #[must_use]
    pub fn goal_reached(world: &World) -> bool {
        world
            .store()
            .iter()
            .filter_map(|entity| entity.attacker())
            .any(|profile| profile.reached_goal)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use lawn_defence_core::{ComponentKind, PresentationHandle};

    #[derive(Debug, Default)]
    struct Record {
        created: Vec<Subtype>,
        disposed: Vec<PresentationHandle>,
        parked: Vec<PresentationHandle>,
    }

    struct RecordingPresenter(Rc<RefCell<Record>>);

    impl Presenter for RecordingPresenter {
        fn create(&mut self, subtype: Subtype) -> Option<PresentationHandle> {
            let mut record = self.0.borrow_mut();
            record.created.push(subtype);
            Some(PresentationHandle::new(record.created.len() as u64))
        }

        fn attach(&mut self, _entity: EntityId, _handle: PresentationHandle) {}

        fn detach_and_dispose(&mut self, handle: PresentationHandle) {
            self.0.borrow_mut().disposed.push(handle);
        }

        fn park(&mut self, handle: PresentationHandle) {
            self.0.borrow_mut().parked.push(handle);
        }
    }

    fn recording_world() -> (World, Rc<RefCell<Record>>) {
        let record = Rc::new(RefCell::new(Record::default()));
        let world = World::new(
            SimConfig::standard(),
            Box::new(RecordingPresenter(Rc::clone(&record))),
        )
        .expect("standard config is valid");
        (world, record)
    }

    #[test]
    fn pools_are_allocated_up_front() {
        let (world, record) = recording_world();
        let config = SimConfig::standard();
        let pooled = config.combat.projectile_pool_capacity + config.economy.pickup_pool_capacity;
        assert_eq!(record.borrow().created.len(), pooled);
        assert_eq!(record.borrow().parked.len(), pooled);
        assert_eq!(world.projectile_pool().available(), 128);
    }

    #[test]
    fn defender_occupies_its_cell_and_gets_role_components() {
        let mut world = World::headless(SimConfig::standard()).expect("valid");
        let cell = CellCoord::new(2, 3);
        let id = world
            .spawn_defender(DefenderKind::Peashooter, cell)
            .expect("empty cell");

        assert_eq!(world.grid().occupant(cell), Some(id));
        let entity = world.store().get_active(id).expect("active");
        assert!(entity.has(ComponentKind::Shooter));
        assert!(!entity.has(ComponentKind::SunProducer));
        assert_eq!(entity.health().map(Health::current), Some(300));
        assert!(world.spawn_defender(DefenderKind::WallNut, cell).is_none());
    }

    #[test]
    fn removing_a_defender_frees_the_cell_and_disposes_presentation() {
        let (mut world, record) = recording_world();
        let cell = CellCoord::new(0, 0);
        let id = world
            .spawn_defender(DefenderKind::Sunflower, cell)
            .expect("empty cell");

        assert_eq!(world.remove_defender(id), Some(cell));
        assert!(world.grid().is_empty(cell));
        assert_eq!(world.remove_defender(id), None);
        assert!(record.borrow().disposed.is_empty(), "disposal waits for flush");

        assert_eq!(world.flush(), 1);
        assert_eq!(record.borrow().disposed.len(), 1);
        assert!(world.store().get(id).is_none());
    }

    #[test]
    fn projectiles_return_their_handle_to_the_pool_on_flush() {
        let mut world = World::headless(SimConfig::standard()).expect("valid");
        let shot = world
            .spawn_projectile(Vec3::new(1.0, 0.5, 0.5), 20)
            .expect("pool has room");
        assert_eq!(world.projectile_pool().in_use(), 1);

        assert!(world.store_mut().destroy(shot));
        assert_eq!(world.projectile_pool().in_use(), 1);
        let _ = world.flush();
        assert_eq!(world.projectile_pool().in_use(), 0);
    }

    #[test]
    fn attackers_outside_the_lawn_lanes_are_rejected() {
        let mut world = World::headless(SimConfig::standard()).expect("valid");
        assert!(world.spawn_attacker(AttackerKind::Basic, 5, 10.0).is_none());
        let id = world
            .spawn_attacker(AttackerKind::Basic, 4, 10.0)
            .expect("valid lane");
        assert_eq!(query::lane_attackers(&world, 4), vec![(id, Vec3::new(10.0, 0.0, 4.5))]);
        assert_eq!(query::active_attackers(&world), 1);
    }

    #[test]
    fn missing_stats_leave_nothing_behind() {
        let mut config = SimConfig::standard();
        config.defenders.retain(|stats| stats.kind != DefenderKind::CherryBomb);
        let mut world = World::headless(config).expect("valid");

        assert!(world
            .spawn_defender(DefenderKind::CherryBomb, CellCoord::new(0, 0))
            .is_none());
        assert_eq!(world.store().iter().count(), 0);
        assert!(world.grid().is_empty(CellCoord::new(0, 0)));
    }

    #[test]
    fn reset_clears_entities_cells_and_ledger() {
        let mut world = World::headless(SimConfig::standard()).expect("valid");
        let _ = world.spawn_defender(DefenderKind::WallNut, CellCoord::new(1, 1));
        let _ = world.spawn_attacker(AttackerKind::Runner, 1, 9.0);
        assert!(world.ledger_mut().debit(100));
        world.set_now(Duration::from_secs(30));

        world.reset();

        assert_eq!(world.store().iter().count(), 0);
        assert_eq!(world.grid().occupied_count(), 0);
        assert_eq!(world.ledger().amount(), 150);
        assert_eq!(world.now(), Duration::ZERO);

        let replanted = world
            .spawn_defender(DefenderKind::WallNut, CellCoord::new(1, 1))
            .expect("cell is free after reset");
        assert_eq!(world.grid().cell_of(replanted), Some(CellCoord::new(1, 1)));
    }
}
