//! Pre-allocated presentation handles for high-frequency entities.

use lawn_defence_core::{PresentationHandle, Presenter, Subtype};

/// Pools kept by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Projectile handles.
    Projectiles,
    /// Pickup handles.
    Pickups,
}

/// Index of a slot inside a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolSlot(usize);

impl PoolSlot {
    /// Position of the slot in the pool.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Slot lent out by [`HandlePool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lease {
    /// Slot to hand back to [`HandlePool::release`].
    pub slot: PoolSlot,
    /// Presentation handle stored in the slot, if the host provided one.
    pub handle: Option<PresentationHandle>,
}

/// Fixed-capacity free-list of presentation handles.
///
/// An empty pool is a rate limit, not an error: `acquire` returns `None` and
/// the caller skips whatever it wanted to spawn.
#[derive(Debug)]
pub struct HandlePool {
    kind: PoolKind,
    handles: Vec<Option<PresentationHandle>>,
    lent: Vec<bool>,
    free: Vec<usize>,
}

impl HandlePool {
    /// Pre-allocates `capacity` handles of `subtype` from the presenter.
    pub fn new(
        kind: PoolKind,
        capacity: usize,
        subtype: Subtype,
        presenter: &mut dyn Presenter,
    ) -> Self {
        let handles: Vec<Option<PresentationHandle>> =
            (0..capacity).map(|_| presenter.create(subtype)).collect();
        for handle in handles.iter().flatten() {
            presenter.park(*handle);
        }
        Self {
            kind,
            handles,
            lent: vec![false; capacity],
            free: (0..capacity).rev().collect(),
        }
    }

    /// Pool identity.
    #[must_use]
    pub const fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.handles.len()
    }

    /// Slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Slots currently lent.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity() - self.available()
    }

    /// Lends the lowest free slot, or `None` when the pool is exhausted.
    pub fn acquire(&mut self) -> Option<Lease> {
        let index = self.free.pop()?;
        self.lent[index] = true;
        Some(Lease {
            slot: PoolSlot(index),
            handle: self.handles[index],
        })
    }

    /// Returns a slot to the pool. Releasing a free or foreign slot is a no-op.
    pub fn release(&mut self, slot: PoolSlot) -> bool {
        match self.lent.get_mut(slot.0) {
            Some(lent) if *lent => {
                *lent = false;
                self.free.push(slot.0);
                true
            }
            _ => false,
        }
    }
}
