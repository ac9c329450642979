//! Row/column lawn model and per-cell occupancy.

use glam::Vec3;
use lawn_defence_core::{CellCoord, EntityId, GridConfig};

/// Fixed-size lawn of placement cells laid out along lanes.
///
/// Columns run along the world `x` axis starting at the house edge; rows run
/// along `z`. Each cell keeps a weak handle to the defender standing on it;
/// the entity store owns the entity itself.
#[derive(Clone, Debug)]
pub struct LawnGrid {
    rows: u32,
    columns: u32,
    cell_size: f32,
    origin_x: f32,
    origin_z: f32,
    spawn_offset: f32,
    goal_margin: f32,
    despawn_margin: f32,
    cells: Vec<Option<EntityId>>,
}

impl LawnGrid {
    /// Builds an empty lawn from its configuration.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        let capacity = config.rows as usize * config.columns as usize;
        Self {
            rows: config.rows,
            columns: config.columns,
            cell_size: config.cell_size,
            origin_x: config.origin[0],
            origin_z: config.origin[1],
            spawn_offset: config.spawn_offset,
            goal_margin: config.goal_margin,
            despawn_margin: config.despawn_margin,
            cells: vec![None; capacity],
        }
    }

    /// Number of lanes.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns per lane.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Side length of one cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Maps a world position to the cell containing it.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec3) -> Option<CellCoord> {
        let column = self.axis_index(position.x - self.origin_x, self.columns)?;
        let row = self.axis_index(position.z - self.origin_z, self.rows)?;
        Some(CellCoord::new(row, column))
    }

    /// World position of a cell's center at ground level.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord) -> Vec3 {
        Vec3::new(
            self.origin_x + (cell.column() as f32 + 0.5) * self.cell_size,
            0.0,
            self.lane_z(cell.row()),
        )
    }

    /// World `z` of a lane's center line.
    #[must_use]
    pub fn lane_z(&self, row: u32) -> f32 {
        self.origin_z + (row as f32 + 0.5) * self.cell_size
    }

    /// Reports whether the cell lies on the lawn.
    #[must_use]
    pub const fn is_valid_cell(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Reports whether a valid cell has no occupant. Invalid cells are never empty.
    #[must_use]
    pub fn is_empty(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map_or(false, |index| self.cells[index].is_none())
    }

    /// Defender handle stored for the cell.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<EntityId> {
        self.index(cell).and_then(|index| self.cells[index])
    }

    /// Records a defender on an empty, valid cell. Never overwrites.
    pub fn place(&mut self, cell: CellCoord, entity: EntityId) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        let slot = &mut self.cells[index];
        if slot.is_some() {
            return false;
        }
        *slot = Some(entity);
        true
    }

    /// Clears a cell, returning the handle it held.
    pub fn release(&mut self, cell: CellCoord) -> Option<EntityId> {
        let index = self.index(cell)?;
        self.cells[index].take()
    }

    /// Occupants of a lane ordered by ascending column.
    #[must_use]
    pub fn entities_in_row(&self, row: u32) -> Vec<(u32, EntityId)> {
        if row >= self.rows {
            return Vec::new();
        }
        let start = row as usize * self.columns as usize;
        let end = start + self.columns as usize;
        self.cells[start..end]
            .iter()
            .zip(0..)
            .filter_map(|(cell, column)| cell.map(|entity| (column, entity)))
            .collect()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Finds the cell that holds the given handle.
    #[must_use]
    pub fn cell_of(&self, entity: EntityId) -> Option<CellCoord> {
        let index = self.cells.iter().position(|cell| *cell == Some(entity))?;
        let columns = self.columns as usize;
        let row = u32::try_from(index / columns).ok()?;
        let column = u32::try_from(index % columns).ok()?;
        Some(CellCoord::new(row, column))
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// World `x` of the house-side edge of the lawn.
    #[must_use]
    pub const fn house_x(&self) -> f32 {
        self.origin_x
    }

    /// World `x` of the far edge of the lawn.
    #[must_use]
    pub fn right_edge_x(&self) -> f32 {
        self.origin_x + self.columns as f32 * self.cell_size
    }

    /// World `x` at which attackers appear.
    #[must_use]
    pub fn spawn_x(&self) -> f32 {
        self.right_edge_x() + self.spawn_offset
    }

    /// World `x` an attacker must cross to reach the house.
    #[must_use]
    pub fn goal_x(&self) -> f32 {
        self.house_x() - self.goal_margin
    }

    /// World `x` beyond which projectiles leave the lane.
    #[must_use]
    pub fn far_bound_x(&self) -> f32 {
        self.spawn_x() + self.despawn_margin
    }

    fn axis_index(&self, local: f32, count: u32) -> Option<u32> {
        if !local.is_finite() || local < 0.0 {
            return None;
        }
        let index = (local / self.cell_size).floor();
        if index >= count as f32 {
            return None;
        }
        Some(index as u32)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.is_valid_cell(cell) {
            Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
        } else {
            None
        }
    }
}
