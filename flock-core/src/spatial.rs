use crate::{Agent, Bounds, Vector2D};

/// Upper bound on cells per axis; tiny perception radii on large surfaces
/// get coarser cells instead of a huge table.
const MAX_CELLS_PER_AXIS: usize = 512;

/// Uniform grid over the surface for neighbor candidate queries.
///
/// Cells are at least `perception_radius` wide, so every agent closer than
/// the radius lies in the same cell or one of the 8 surrounding cells.
/// Rebuilt from scratch every tick.
#[derive(Debug, Default)]
pub struct NeighborGrid {
    cell_size: f32,
    columns: usize,
    rows: usize,
    /// Agent indices per cell, row-major. Buckets keep their allocation
    /// between rebuilds.
    cells: Vec<Vec<usize>>,
}

impl NeighborGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, agents: &[Agent], bounds: Bounds, perception_radius: f32) {
        for bucket in &mut self.cells {
            bucket.clear();
        }

        if !(perception_radius > 0.0) {
            self.cell_size = 0.0;
            return;
        }

        let longest = bounds.width().max(bounds.height());
        self.cell_size = perception_radius.max(longest / MAX_CELLS_PER_AXIS as f32);
        self.columns = ((bounds.width() / self.cell_size).ceil() as usize).max(1);
        self.rows = ((bounds.height() / self.cell_size).ceil() as usize).max(1);

        let needed = self.columns * self.rows;
        if self.cells.len() < needed {
            self.cells.resize_with(needed, Vec::new);
        }

        for (index, agent) in agents.iter().enumerate() {
            let (column, row) = self.cell_of(agent.position);
            self.cells[row * self.columns + column].push(index);
        }
    }

    /// Writes the indices of every agent in the 3x3 block of cells around
    /// `position` into `out`, in ascending (population) order.
    pub fn candidates_into(&self, position: Vector2D, out: &mut Vec<usize>) {
        out.clear();
        if self.cell_size <= 0.0 {
            return;
        }

        let (column, row) = self.cell_of(position);
        let first_row = row.saturating_sub(1);
        let last_row = (row + 1).min(self.rows - 1);
        let first_column = column.saturating_sub(1);
        let last_column = (column + 1).min(self.columns - 1);

        for r in first_row..=last_row {
            for c in first_column..=last_column {
                out.extend_from_slice(&self.cells[r * self.columns + c]);
            }
        }
        out.sort_unstable();
    }

    /// Positions off the surface clamp to the border cells, which keeps
    /// neighboring positions in neighboring cells.
    fn cell_of(&self, position: Vector2D) -> (usize, usize) {
        let clamp = |value: f32, cells: usize| -> usize {
            let cell = (value / self.cell_size).floor();
            if cell.is_nan() || cell < 0.0 {
                0
            } else {
                (cell as usize).min(cells - 1)
            }
        };
        (
            clamp(position.x, self.columns),
            clamp(position.y, self.rows),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> Agent {
        Agent::new(Vector2D::new(x, y), Vector2D::zero())
    }

    #[test]
    fn test_candidates_cover_adjacent_cells_only() {
        let agents = [at(5.0, 5.0), at(15.0, 5.0), at(95.0, 95.0), at(25.0, 25.0)];
        let bounds = Bounds::new(100.0, 100.0).unwrap();
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, bounds, 10.0);

        let mut out = Vec::new();
        grid.candidates_into(Vector2D::new(5.0, 5.0), &mut out);

        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn test_candidates_are_in_population_order() {
        let agents = [at(12.0, 12.0), at(1.0, 1.0), at(8.0, 15.0), at(18.0, 2.0)];
        let bounds = Bounds::new(100.0, 100.0).unwrap();
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, bounds, 10.0);

        let mut out = Vec::new();
        grid.candidates_into(Vector2D::new(12.0, 12.0), &mut out);

        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_off_surface_positions_clamp_to_border() {
        let agents = [at(-30.0, 50.0), at(2.0, 50.0)];
        let bounds = Bounds::new(100.0, 100.0).unwrap();
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, bounds, 10.0);

        let mut out = Vec::new();
        grid.candidates_into(Vector2D::new(2.0, 50.0), &mut out);

        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn test_zero_radius_yields_no_candidates() {
        let agents = [at(1.0, 1.0), at(1.0, 1.0)];
        let bounds = Bounds::new(100.0, 100.0).unwrap();
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, bounds, 0.0);

        let mut out = vec![7];
        grid.candidates_into(Vector2D::new(1.0, 1.0), &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn test_rebuild_after_shrink_reuses_buckets() {
        let agents = [at(150.0, 150.0)];
        let mut grid = NeighborGrid::new();
        grid.rebuild(&agents, Bounds::new(200.0, 200.0).unwrap(), 10.0);
        grid.rebuild(&agents, Bounds::new(50.0, 50.0).unwrap(), 10.0);

        let mut out = Vec::new();
        grid.candidates_into(Vector2D::new(45.0, 45.0), &mut out);

        assert_eq!(out, vec![0]);
    }
}
