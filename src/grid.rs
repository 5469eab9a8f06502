//! Uniform spatial grid used for neighbour queries and view culling.
//!
//! The grid never owns entities. Each bucket lists the ids of the entities
//! whose floor position lies inside that cell; the world keeps the buckets in
//! step with entity movement once per tick.

use crate::entity::EntityId;
use crate::math::WorldCoordinate;
use tracing::trace;

/// Integer (column, row) address of one grid bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub column: usize,
    pub row: usize,
}

impl GridCell {
    pub fn new(column: usize, row: usize) -> Self {
        GridCell { column, row }
    }
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    columns: usize,
    rows: usize,
    cell_size: f64,
    buckets: Vec<Vec<EntityId>>,
}

impl SpatialGrid {
    pub fn new(columns: usize, rows: usize, cell_size: f64) -> Self {
        SpatialGrid {
            columns,
            rows,
            cell_size,
            buckets: vec![Vec::new(); columns * rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn index(&self, cell: GridCell) -> usize {
        cell.row * self.columns + cell.column
    }

    /// Cell containing `position`, or `None` outside the grid
    pub fn cell_for(&self, position: WorldCoordinate) -> Option<GridCell> {
        let column = (position.x / self.cell_size).floor();
        let row = (position.y / self.cell_size).floor();
        self.checked_cell(column as i64, row as i64)
    }

    /// Cell at signed coordinates, or `None` when outside the grid
    pub fn checked_cell(&self, column: i64, row: i64) -> Option<GridCell> {
        if column < 0 || row < 0 || column >= self.columns as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(GridCell::new(column as usize, row as usize))
    }

    pub fn insert(&mut self, id: EntityId, cell: GridCell) {
        let index = self.index(cell);
        self.buckets[index].push(id);
    }

    /// Removes `id` from `cell`. Returns whether it was there.
    pub fn remove(&mut self, id: EntityId, cell: GridCell) -> bool {
        let index = self.index(cell);
        let bucket = &mut self.buckets[index];
        match bucket.iter().position(|&other| other == id) {
            Some(at) => {
                bucket.remove(at);
                true
            }
            None => false,
        }
    }

    /// Re-indexes `id` after it moved to `position`.
    ///
    /// Returns the cell the entity is indexed under afterwards. A position
    /// outside the grid leaves the entity where it was (or absent, if it never
    /// had a cell).
    pub fn relocate(
        &mut self,
        id: EntityId,
        current: Option<GridCell>,
        position: WorldCoordinate,
    ) -> Option<GridCell> {
        let Some(target) = self.cell_for(position) else {
            return current;
        };
        if current == Some(target) {
            return current;
        }
        if let Some(old) = current {
            self.remove(id, old);
        }
        self.insert(id, target);
        trace!(id = id.0, column = target.column, row = target.row, "entity changed cell");
        Some(target)
    }

    pub fn entities_in(&self, cell: GridCell) -> &[EntityId] {
        &self.buckets[self.index(cell)]
    }

    /// `cell` and its (up to) eight neighbours, row by row
    pub fn neighborhood(&self, cell: GridCell) -> impl Iterator<Item = GridCell> + '_ {
        let (column, row) = (cell.column as i64, cell.row as i64);
        self.cells_in_range(column - 1, row - 1, column + 1, row + 1)
    }

    /// Every in-bounds cell of the inclusive range, row-major
    pub fn cells_in_range(
        &self,
        min_column: i64,
        min_row: i64,
        max_column: i64,
        max_row: i64,
    ) -> impl Iterator<Item = GridCell> + '_ {
        (min_row..=max_row).flat_map(move |row| {
            (min_column..=max_column).filter_map(move |column| self.checked_cell(column, row))
        })
    }

    /// Cells that list `id`; at most one for a consistent grid
    pub fn cells_containing(&self, id: EntityId) -> Vec<GridCell> {
        let mut found = Vec::new();
        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = GridCell::new(column, row);
                if self.entities_in(cell).contains(&id) {
                    found.push(cell);
                }
            }
        }
        found
    }

    /// Total number of indexed entries
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}
