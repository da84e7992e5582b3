//! Boolean passability map for path planning.
//!
//! A `PassabilityMap` answers one question per cell: may a particular entity
//! stand here right now? The simulation derives one from the occupancy grid
//! each time an entity (re)plans, so the map is a snapshot and never tracks
//! later grid changes.

#![warn(missing_docs)]

use core::fmt;

use gridsim_pose::DiscretePoint;

use crate::error::NavigationError;

/// Two-dimensional grid of passable / blocked cells.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassabilityMap {
    /// Size in cells along x.
    width: usize,
    /// Size in cells along y.
    height: usize,
    /// Row-major cell storage, `true` meaning passable.
    data: Vec<bool>,
}

impl PassabilityMap {
    /// Creates a map of the given size with every cell passable.
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The map, or `InvalidDimensions` if either size is zero
    pub fn new(width: usize, height: usize) -> Result<Self, NavigationError> {
        if width == 0 || height == 0 {
            return Err(NavigationError::InvalidDimensions(
                "All dimensions must be non-zero",
            ));
        }

        let total_cells = width
            .checked_mul(height)
            .ok_or(NavigationError::InvalidDimensions(
                "Map dimensions too large, would cause overflow",
            ))?;

        Ok(PassabilityMap {
            width,
            height,
            data: vec![true; total_cells],
        })
    }

    /// Builds a map from `rows[y][x]`.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self, NavigationError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut map = PassabilityMap::new(width, height)?;

        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(NavigationError::InvalidDimensions(
                    "All rows must have the same length",
                ));
            }
            for (x, &passable) in row.iter().enumerate() {
                let index = map.index_unchecked(x, y);
                map.data[index] = passable;
            }
        }

        Ok(map)
    }

    /// Gets the width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Gets the height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Gets the total number of cells.
    pub fn total_cells(&self) -> usize {
        self.data.len()
    }

    fn index_unchecked(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn index(&self, point: &DiscretePoint) -> Option<usize> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        if x < self.width && y < self.height {
            Some(self.index_unchecked(x, y))
        } else {
            None
        }
    }

    fn out_of_bounds(&self, point: &DiscretePoint) -> NavigationError {
        NavigationError::OutOfBounds {
            point: *point,
            width: self.width,
            height: self.height,
        }
    }

    /// Returns `true` if `point` lies inside the map.
    pub fn in_bounds(&self, point: &DiscretePoint) -> bool {
        self.index(point).is_some()
    }

    /// Returns `true` if `point` is inside the map and passable.
    pub fn is_passable(&self, point: &DiscretePoint) -> bool {
        self.index(point).is_some_and(|index| self.data[index])
    }

    /// Gets the passability of a cell.
    pub fn get(&self, point: &DiscretePoint) -> Result<bool, NavigationError> {
        self.index(point)
            .map(|index| self.data[index])
            .ok_or_else(|| self.out_of_bounds(point))
    }

    /// Sets the passability of a cell.
    pub fn set(&mut self, point: &DiscretePoint, passable: bool) -> Result<(), NavigationError> {
        let index = self.index(point).ok_or_else(|| self.out_of_bounds(point))?;
        self.data[index] = passable;
        Ok(())
    }

    /// Sets every cell to `passable`.
    pub fn fill(&mut self, passable: bool) {
        self.data.fill(passable);
    }

    /// Number of passable cells.
    pub fn passable_count(&self) -> usize {
        self.data.iter().filter(|&&passable| passable).count()
    }
}

impl fmt::Display for PassabilityMap {
    /// Rows are printed top (highest y) first: `.` passable, `#` blocked.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let glyph = if self.data[self.index_unchecked(x, y)] {
                    '.'
                } else {
                    '#'
                };
                write!(f, "{}", glyph)?;
            }
            if y > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
