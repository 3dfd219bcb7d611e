//! Static level geometry: the buildable grid and the path enemies follow.

use std::collections::BTreeSet;

use thiserror::Error;
use tower_defense_core::{CellCoord, Vec2};

const PATH_SAMPLE_STEP: f32 = 0.25;

/// Immutable per-level map loaded once per session.
#[derive(Clone, Debug)]
pub struct Map {
    columns: u32,
    rows: u32,
    waypoints: Vec<Vec2>,
    cumulative: Vec<f32>,
    path_cells: BTreeSet<CellCoord>,
    blocked: BTreeSet<CellCoord>,
}

impl Map {
    /// Builds a map from grid dimensions, path waypoints and blocked cells.
    ///
    /// Waypoints are cell coordinates; enemies walk between their centres.
    pub fn new(
        columns: u32,
        rows: u32,
        path: &[CellCoord],
        blocked: &[CellCoord],
    ) -> Result<Self, MapError> {
        if columns == 0 || rows == 0 {
            return Err(MapError::EmptyGrid);
        }
        if path.len() < 2 {
            return Err(MapError::PathTooShort);
        }
        for cell in path.iter().chain(blocked) {
            if cell.column() >= columns || cell.row() >= rows {
                return Err(MapError::OutOfBounds { cell: *cell });
            }
        }

        let waypoints: Vec<Vec2> = path.iter().map(|cell| cell.center()).collect();
        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut travelled = 0.0;
        cumulative.push(travelled);
        for pair in waypoints.windows(2) {
            travelled += pair[0].distance(pair[1]);
            cumulative.push(travelled);
        }
        if travelled <= 0.0 {
            return Err(MapError::DegeneratePath);
        }

        let path_cells = trace_path_cells(&waypoints, columns, rows);

        Ok(Self {
            columns,
            rows,
            waypoints,
            cumulative,
            path_cells,
            blocked: blocked.iter().copied().collect(),
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether a tower may be built on the cell, ignoring other towers.
    #[must_use]
    pub fn is_buildable(&self, cell: CellCoord) -> bool {
        self.contains(cell) && !self.path_cells.contains(&cell) && !self.blocked.contains(&cell)
    }

    /// Ordered waypoints enemies traverse, in world units.
    #[must_use]
    pub fn path(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Total length of the path in world units.
    #[must_use]
    pub fn path_length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position reached after travelling `progress` units along the path.
    ///
    /// Progress outside `0..=path_length` is clamped to the path ends.
    #[must_use]
    pub fn point_at(&self, progress: f32) -> Vec2 {
        let progress = progress.clamp(0.0, self.path_length());
        let index = self.cumulative.partition_point(|distance| *distance < progress);
        if index == 0 {
            return self.waypoints[0];
        }
        if index >= self.waypoints.len() {
            return self.waypoints[self.waypoints.len() - 1];
        }

        let start = self.cumulative[index - 1];
        let span = self.cumulative[index] - start;
        let t = (progress - start) / span;
        self.waypoints[index - 1].lerp(self.waypoints[index], t)
    }
}

/// Errors raised while building a [`Map`] from level data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MapError {
    /// The grid has no columns or no rows.
    #[error("map grid must have at least one column and one row")]
    EmptyGrid,
    /// Fewer than two waypoints were supplied.
    #[error("path needs at least two waypoints")]
    PathTooShort,
    /// A waypoint or blocked cell lies outside the grid.
    #[error("cell {cell} lies outside the grid")]
    OutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
    /// Every waypoint sits on the same spot.
    #[error("path has zero length")]
    DegeneratePath,
}

fn trace_path_cells(waypoints: &[Vec2], columns: u32, rows: u32) -> BTreeSet<CellCoord> {
    let mut cells = BTreeSet::new();
    for pair in waypoints.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let steps = (from.distance(to) / PATH_SAMPLE_STEP).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let point = from.lerp(to, step as f32 / steps as f32);
            if point.x < 0.0 || point.y < 0.0 {
                continue;
            }
            let cell = CellCoord::new(point.x.floor() as u32, point.y.floor() as u32);
            if cell.column() < columns && cell.row() < rows {
                let _ = cells.insert(cell);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shaped() -> Map {
        Map::new(
            6,
            5,
            &[
                CellCoord::new(0, 1),
                CellCoord::new(4, 1),
                CellCoord::new(4, 4),
            ],
            &[CellCoord::new(0, 4)],
        )
        .expect("valid map")
    }

    #[test]
    fn path_length_sums_segments() {
        let map = l_shaped();
        assert!((map.path_length() - 7.0).abs() < 1e-5);
        assert_eq!(map.path().len(), 3);
    }

    #[test]
    fn path_cells_are_not_buildable() {
        let map = l_shaped();
        for column in 0..=4 {
            assert!(!map.is_buildable(CellCoord::new(column, 1)));
        }
        for row in 1..=4 {
            assert!(!map.is_buildable(CellCoord::new(4, row)));
        }
        assert!(map.is_buildable(CellCoord::new(2, 3)));
    }

    #[test]
    fn blocked_and_outside_cells_are_not_buildable() {
        let map = l_shaped();
        assert!(!map.is_buildable(CellCoord::new(0, 4)));
        assert!(!map.is_buildable(CellCoord::new(6, 0)));
        assert!(!map.is_buildable(CellCoord::new(0, 5)));
    }

    fn assert_near(actual: Vec2, expected: Vec2) {
        assert!(
            actual.distance(expected) < 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn point_at_interpolates_and_clamps() {
        let map = l_shaped();
        assert_near(map.point_at(0.0), Vec2::new(0.5, 1.5));
        assert_near(map.point_at(2.0), Vec2::new(2.5, 1.5));
        assert_near(map.point_at(5.0), Vec2::new(4.5, 2.5));
        assert_near(map.point_at(99.0), Vec2::new(4.5, 4.5));
        assert_near(map.point_at(-3.0), Vec2::new(0.5, 1.5));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert_eq!(
            Map::new(0, 3, &[CellCoord::new(0, 0), CellCoord::new(1, 0)], &[]).err(),
            Some(MapError::EmptyGrid)
        );
        assert_eq!(
            Map::new(3, 3, &[CellCoord::new(0, 0)], &[]).err(),
            Some(MapError::PathTooShort)
        );
        assert_eq!(
            Map::new(3, 3, &[CellCoord::new(0, 0), CellCoord::new(3, 0)], &[]).err(),
            Some(MapError::OutOfBounds {
                cell: CellCoord::new(3, 0)
            })
        );
        assert_eq!(
            Map::new(3, 3, &[CellCoord::new(1, 1), CellCoord::new(1, 1)], &[]).err(),
            Some(MapError::DegeneratePath)
        );
    }
}
