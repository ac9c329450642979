//! Presentation stand-in for headless hosts and tests.

use std::collections::BTreeSet;

use lawn_defence_core::{EntityId, PresentationHandle, Presenter, Subtype};

/// Presenter that only tracks handle lifetimes.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    next: u64,
    live: BTreeSet<PresentationHandle>,
    attached: usize,
    disposed: usize,
}

impl HeadlessPresenter {
    /// Creates a presenter with no handles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles created and not yet disposed, pooled handles included.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// Number of attach calls observed.
    #[must_use]
    pub const fn attached(&self) -> usize {
        self.attached
    }

    /// Number of handles disposed.
    #[must_use]
    pub const fn disposed(&self) -> usize {
        self.disposed
    }
}

impl Presenter for HeadlessPresenter {
    fn create(&mut self, _subtype: Subtype) -> Option<PresentationHandle> {
        let handle = PresentationHandle::new(self.next);
        self.next += 1;
        let _ = self.live.insert(handle);
        Some(handle)
    }

    fn attach(&mut self, _entity: EntityId, _handle: PresentationHandle) {
        self.attached += 1;
    }

    fn detach_and_dispose(&mut self, handle: PresentationHandle) {
        if self.live.remove(&handle) {
            self.disposed += 1;
        } else {
            log::error!("disposed unknown presentation handle {}", handle.get());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandlePool, PoolKind};
    use lawn_defence_core::DefenderKind;

    #[test]
    fn pooled_handles_stay_live_and_owned_handles_are_disposed_once() {
        let mut presenter = HeadlessPresenter::new();
        let pool = HandlePool::new(PoolKind::Pickups, 4, Subtype::Projectile, &mut presenter);
        assert_eq!(presenter.live_handles(), pool.capacity());
        assert_eq!(presenter.attached(), 0);

        let owned = presenter
            .create(Subtype::Defender(DefenderKind::WallNut))
            .expect("headless presenter always creates");
        presenter.attach(EntityId::new(0, 0), owned);
        assert_eq!(presenter.live_handles(), 5);
        assert_eq!(presenter.attached(), 1);

        presenter.detach_and_dispose(owned);
        presenter.detach_and_dispose(owned);
        assert_eq!(presenter.disposed(), 1);
        assert_eq!(presenter.live_handles(), 4);
    }
}
