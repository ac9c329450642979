//! Generational entity arena with deferred destruction.

use lawn_defence_core::{
    AttackerProfile, Category, Collectable, Component, ComponentKind, DefenderProfile, EntityId,
    Explosive, Health, PresentationHandle, Projectile, Shooter, SunProducer, TimedLife, Transform,
};

use crate::pool::{PoolKind, PoolSlot};

/// Presentation object bound to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    /// Handle created for this entity and disposed with it.
    Owned(PresentationHandle),
    /// Handle lent by a pool and returned to it when the entity is flushed.
    Pooled {
        /// Pool that lent the handle.
        pool: PoolKind,
        /// Slot to return.
        slot: PoolSlot,
        /// Lent handle, absent when the host has no presentation for the pool.
        handle: Option<PresentationHandle>,
    },
}

impl Presentation {
    /// Handle visible to the host, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<PresentationHandle> {
        match self {
            Self::Owned(handle) => Some(*handle),
            Self::Pooled { handle, .. } => *handle,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ComponentSet {
    transform: Option<Transform>,
    health: Option<Health>,
    defender: Option<DefenderProfile>,
    attacker: Option<AttackerProfile>,
    shooter: Option<Shooter>,
    sun_producer: Option<SunProducer>,
    projectile: Option<Projectile>,
    explosive: Option<Explosive>,
    collectable: Option<Collectable>,
    timed_life: Option<TimedLife>,
}

impl ComponentSet {
    fn has(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Transform => self.transform.is_some(),
            ComponentKind::Health => self.health.is_some(),
            ComponentKind::DefenderProfile => self.defender.is_some(),
            ComponentKind::AttackerProfile => self.attacker.is_some(),
            ComponentKind::Shooter => self.shooter.is_some(),
            ComponentKind::SunProducer => self.sun_producer.is_some(),
            ComponentKind::Projectile => self.projectile.is_some(),
            ComponentKind::Explosive => self.explosive.is_some(),
            ComponentKind::Collectable => self.collectable.is_some(),
            ComponentKind::TimedLife => self.timed_life.is_some(),
        }
    }

    fn insert(&mut self, component: Component) {
        match component {
            Component::Transform(value) => self.transform = Some(value),
            Component::Health(value) => self.health = Some(value),
            Component::DefenderProfile(value) => self.defender = Some(value),
            Component::AttackerProfile(value) => self.attacker = Some(value),
            Component::Shooter(value) => self.shooter = Some(value),
            Component::SunProducer(value) => self.sun_producer = Some(value),
            Component::Projectile(value) => self.projectile = Some(value),
            Component::Explosive(value) => self.explosive = Some(value),
            Component::Collectable(value) => self.collectable = Some(value),
            Component::TimedLife(value) => self.timed_life = Some(value),
        }
    }
}

macro_rules! component_accessors {
    ($($field:ident: $ty:ty => $get:ident, $get_mut:ident;)*) => {
        $(
            #[doc = concat!("Shared access to the [`", stringify!($ty), "`] component.")]
            #[must_use]
            pub fn $get(&self) -> Option<&$ty> {
                self.components.$field.as_ref()
            }

            #[doc = concat!("Mutable access to the [`", stringify!($ty), "`] component.")]
            pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                self.components.$field.as_mut()
            }
        )*
    };
}

/// Entity stored in the arena.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    category: Category,
    active: bool,
    components: ComponentSet,
    presentation: Option<Presentation>,
}

impl Entity {
    /// Handle naming this entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Category assigned at creation.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Reports whether the entity is still live this frame.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Presentation bound to the entity.
    #[must_use]
    pub const fn presentation(&self) -> Option<Presentation> {
        self.presentation
    }

    /// Binds a presentation to the entity, returning any previous binding.
    pub fn set_presentation(&mut self, presentation: Presentation) -> Option<Presentation> {
        self.presentation.replace(presentation)
    }

    /// Attaches a component, replacing any existing value of the same type.
    pub fn insert(&mut self, component: Component) {
        self.components.insert(component);
    }

    /// Reports whether the entity carries a component of the given type.
    #[must_use]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.has(kind)
    }

    component_accessors! {
        transform: Transform => transform, transform_mut;
        health: Health => health, health_mut;
        defender: DefenderProfile => defender, defender_mut;
        attacker: AttackerProfile => attacker, attacker_mut;
        shooter: Shooter => shooter, shooter_mut;
        sun_producer: SunProducer => sun_producer, sun_producer_mut;
        projectile: Projectile => projectile, projectile_mut;
        explosive: Explosive => explosive, explosive_mut;
        collectable: Collectable => collectable, collectable_mut;
        timed_life: TimedLife => timed_life, timed_life_mut;
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Arena of entities addressed through generation-checked handles.
///
/// Destruction is two-phase: [`EntityStore::destroy`] only clears the active
/// flag and queues the entity, and [`EntityStore::flush`] physically removes
/// queued entities once per frame. Queries skip inactive entities, so systems
/// running later in the same frame never act on a destroyed entity, yet its
/// data stays readable until the flush.
#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pending: Vec<EntityId>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an active entity without components.
    pub fn create(&mut self, category: Category) -> EntityId {
        let (index, generation) = match self.free.pop() {
            Some(index) => {
                let generation = self.slots[index as usize].generation;
                (index, generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    entity: None,
                });
                (index, 0)
            }
        };

        let id = EntityId::new(index, generation);
        self.slots[index as usize].entity = Some(Entity {
            id,
            category,
            active: true,
            components: ComponentSet::default(),
            presentation: None,
        });
        id
    }

    /// Resolves a handle, including entities destroyed earlier this frame.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    /// Mutable variant of [`EntityStore::get`].
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Resolves a handle only if the entity is still active.
    #[must_use]
    pub fn get_active(&self, id: EntityId) -> Option<&Entity> {
        self.get(id).filter(|entity| entity.active)
    }

    /// Mutable variant of [`EntityStore::get_active`].
    pub fn get_active_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.get_mut(id).filter(|entity| entity.active)
    }

    /// Reports whether the handle names a live, active entity.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.get_active(id).is_some()
    }

    /// Iterates over active entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots
            .iter()
            .filter_map(|slot| slot.entity.as_ref())
            .filter(|entity| entity.active)
    }

    /// Active entities of a category in slot order.
    #[must_use]
    pub fn query_by_category(&self, category: Category) -> Vec<EntityId> {
        self.iter()
            .filter(|entity| entity.category == category)
            .map(Entity::id)
            .collect()
    }

    /// Active entities carrying every listed component, in slot order.
    #[must_use]
    pub fn query_by_components(&self, kinds: &[ComponentKind]) -> Vec<EntityId> {
        self.iter()
            .filter(|entity| kinds.iter().all(|kind| entity.has(*kind)))
            .map(Entity::id)
            .collect()
    }

    /// Number of active entities of a category.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.iter()
            .filter(|entity| entity.category == category)
            .count()
    }

    /// Marks an entity inactive and queues it for removal.
    ///
    /// Returns `true` only for the call that deactivated the entity; repeated
    /// or stale calls are no-ops.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.get_active_mut(id) else {
            return false;
        };
        entity.active = false;
        self.pending.push(id);
        true
    }

    /// Number of entities waiting for the next flush.
    #[must_use]
    pub fn pending_removals(&self) -> usize {
        self.pending.len()
    }

    /// Physically removes every queued entity.
    ///
    /// Each removed entity is handed to `release` so the caller can dispose
    /// of its presentation and detach it from any index. Slots are recycled
    /// with a bumped generation, which turns outstanding handles stale.
    pub fn flush<F>(&mut self, mut release: F) -> usize
    where
        F: FnMut(Entity),
    {
        let mut removed = 0;
        for id in self.pending.drain(..) {
            let Some(slot) = self.slots.get_mut(id.index() as usize) else {
                continue;
            };
            if slot.generation != id.generation() {
                continue;
            }
            let Some(entity) = slot.entity.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index());
            removed += 1;
            release(entity);
        }
        removed
    }

    /// Destroys every active entity. The caller still has to flush.
    pub fn destroy_all(&mut self) -> usize {
        let ids: Vec<EntityId> = self.iter().map(Entity::id).collect();
        ids.into_iter().filter(|id| self.destroy(*id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn store_with_attacker() -> (EntityStore, EntityId) {
        let mut store = EntityStore::new();
        let id = store.create(Category::Attacker);
        let entity = store.get_mut(id).expect("fresh entity");
        entity.insert(Component::Transform(Transform::at(Vec3::ZERO)));
        entity.insert(Component::Health(Health::full(100)));
        (store, id)
    }

    #[test]
    fn created_entities_are_active_and_queryable() {
        let (mut store, attacker) = store_with_attacker();
        let defender = store.create(Category::Defender);

        assert!(store.is_active(attacker));
        assert_eq!(store.query_by_category(Category::Attacker), vec![attacker]);
        assert_eq!(store.query_by_category(Category::Defender), vec![defender]);
        assert_eq!(
            store.query_by_components(&[ComponentKind::Transform, ComponentKind::Health]),
            vec![attacker]
        );
        assert!(store
            .query_by_components(&[ComponentKind::Health, ComponentKind::Shooter])
            .is_empty());
    }

    #[test]
    fn destroy_is_idempotent_and_hides_entity_from_queries() {
        let (mut store, attacker) = store_with_attacker();

        assert!(store.destroy(attacker));
        assert!(!store.destroy(attacker));
        assert_eq!(store.pending_removals(), 1);
        assert!(store.query_by_category(Category::Attacker).is_empty());

        let entity = store.get(attacker).expect("still stored until flush");
        assert!(!entity.is_active());
        assert_eq!(entity.health().map(Health::current), Some(100));
    }

    #[test]
    fn flush_releases_entities_and_invalidates_handles() {
        let (mut store, attacker) = store_with_attacker();
        let _ = store.destroy(attacker);

        let mut released = Vec::new();
        let removed = store.flush(|entity| released.push(entity.id()));

        assert_eq!(removed, 1);
        assert_eq!(released, vec![attacker]);
        assert!(store.get(attacker).is_none());
        assert_eq!(store.flush(|_| panic!("queue already drained")), 0);
    }

    #[test]
    fn recycled_slot_does_not_resurrect_stale_handle() {
        let (mut store, attacker) = store_with_attacker();
        let _ = store.destroy(attacker);
        let _ = store.flush(|_| {});

        let replacement = store.create(Category::Defender);
        assert_eq!(replacement.index(), attacker.index());
        assert_ne!(replacement.generation(), attacker.generation());
        assert!(store.get(attacker).is_none());
        assert!(!store.destroy(attacker));
        assert!(store.is_active(replacement));
    }

    #[test]
    fn destroy_all_queues_every_active_entity() {
        let (mut store, _) = store_with_attacker();
        let _ = store.create(Category::Pickup);
        let _ = store.create(Category::Projectile);

        assert_eq!(store.destroy_all(), 3);
        assert_eq!(store.flush(|_| {}), 3);
        assert_eq!(store.iter().count(), 0);
    }
}
