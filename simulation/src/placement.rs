//! Player placement rules: selection, preview and per-kind recharge.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use lawn_defence_core::{CellCoord, DefenderKind, PlacementError};
use lawn_defence_world::World;

/// Selection and recharge state of the placement tool.
#[derive(Clone, Debug, Default)]
pub(crate) struct Placement {
    selected: Option<DefenderKind>,
    ready_at: BTreeMap<DefenderKind, Duration>,
}

impl Placement {
    pub(crate) const fn selected(&self) -> Option<DefenderKind> {
        self.selected
    }

    pub(crate) fn select(&mut self, kind: Option<DefenderKind>) {
        self.selected = kind;
    }

    pub(crate) fn reset(&mut self) {
        self.selected = None;
        self.ready_at.clear();
    }

    /// Reports whether the selected defender could stand at `position`,
    /// ignoring cost and recharge.
    pub(crate) fn preview(&self, world: &World, position: Vec3) -> bool {
        self.selected.is_some()
            && world
                .grid()
                .world_to_cell(position)
                .map_or(false, |cell| world.grid().is_empty(cell))
    }

    /// Time until `kind` may be placed again.
    pub(crate) fn recharge_remaining(&self, kind: DefenderKind, now: Duration) -> Duration {
        self.ready_at
            .get(&kind)
            .map_or(Duration::ZERO, |ready| ready.saturating_sub(now))
    }

    /// Runs every check a placement must pass, in the order the player sees
    /// them, and returns the target cell and the cost to debit.
    pub(crate) fn validate(
        &self,
        world: &World,
        position: Vec3,
        kind: DefenderKind,
    ) -> Result<(CellCoord, u32), PlacementError> {
        let cell = world
            .grid()
            .world_to_cell(position)
            .ok_or(PlacementError::InvalidCell)?;
        if !world.grid().is_empty(cell) {
            return Err(PlacementError::Occupied);
        }
        let Some(stats) = world.config().defender(kind) else {
            log::error!("no stats for defender `{}`; placement refused", kind.name());
            return Err(PlacementError::UnknownDefender);
        };
        if !self.recharge_remaining(kind, world.now()).is_zero() {
            return Err(PlacementError::Recharging);
        }
        if !world.ledger().can_afford(stats.cost) {
            return Err(PlacementError::InsufficientSun);
        }
        Ok((cell, stats.cost))
    }

    /// Starts the recharge of `kind` after a successful placement.
    pub(crate) fn placed(&mut self, world: &World, kind: DefenderKind) {
        let recharge = world
            .config()
            .defender(kind)
            .map_or(Duration::ZERO, |stats| stats.recharge);
        let _ = self.ready_at.insert(kind, world.now() + recharge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawn_defence_core::SimConfig;

    fn world() -> World {
        World::headless(SimConfig::standard()).expect("valid")
    }

    #[test]
    fn preview_requires_selection_and_a_free_valid_cell() {
        let mut world = world();
        let mut placement = Placement::default();
        let inside = Vec3::new(1.5, 0.0, 1.5);

        assert!(!placement.preview(&world, inside));
        placement.select(Some(DefenderKind::WallNut));
        assert!(placement.preview(&world, inside));
        assert!(!placement.preview(&world, Vec3::new(-1.0, 0.0, 1.5)));

        let _ = world.spawn_defender(DefenderKind::WallNut, CellCoord::new(1, 1));
        assert!(!placement.preview(&world, inside));
    }

    #[test]
    fn recharge_blocks_the_same_kind_only() {
        let world = world();
        let mut placement = Placement::default();
        placement.placed(&world, DefenderKind::Sunflower);
        let target = Vec3::new(0.5, 0.0, 0.5);

        assert_eq!(
            placement.validate(&world, target, DefenderKind::Sunflower),
            Err(PlacementError::Recharging)
        );
        assert!(placement
            .validate(&world, target, DefenderKind::Peashooter)
            .is_ok());
        assert_eq!(
            placement.recharge_remaining(DefenderKind::Sunflower, Duration::from_secs(5)),
            Duration::from_millis(2_500)
        );
    }

    #[test]
    fn valid_request_reports_cell_and_cost() {
        let world = world();
        let placement = Placement::default();
        assert_eq!(
            placement.validate(&world, Vec3::new(0.5, 0.0, 0.5), DefenderKind::CherryBomb),
            Ok((CellCoord::new(0, 0), 150))
        );
        assert_eq!(
            placement.validate(&world, Vec3::new(50.0, 0.0, 0.5), DefenderKind::CherryBomb),
            Err(PlacementError::InvalidCell)
        );
    }
}
