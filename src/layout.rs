//! Text bitmaps describing where static obstacles go.
//!
//! One character per cell. `#`, `X` and `@` are obstacles; `.` and space are
//! free. The last line of the text is row `y = 0`, so the file reads the way
//! the map is drawn.

use std::fs;
use std::path::{Path, PathBuf};

use gridsim_navigation::{DiscretePoint, NavigationError, PassabilityMap, Pose};
use rand::Rng;
use tracing::{info, warn};

use crate::entity::Entity;
use crate::grid::Grid;

/// Errors raised while reading a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to read layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("layout has no rows")]
    Empty,
    #[error("layout row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph { glyph: char, row: usize, column: usize },
}

/// Orientation given to each placed obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Every obstacle faces 0°.
    #[default]
    Fixed,
    /// Each obstacle gets a random multiple of 90°.
    RandomQuarterTurns,
}

impl Rotation {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Rotation::Fixed => 0.0,
            Rotation::RandomQuarterTurns => 90.0 * f64::from(rng.random_range(0..4u8)),
        }
    }
}

/// A parsed obstacle bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    width: usize,
    height: usize,
    /// `y * width + x`, `true` for an obstacle.
    obstacles: Vec<bool>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        // Blank lines around the bitmap are ignored; blank rows inside it are ragged.
        let first = lines.iter().position(|line| !line.is_empty());
        let last = lines.iter().rposition(|line| !line.is_empty());
        let rows = match (first, last) {
            (Some(first), Some(last)) => &lines[first..=last],
            _ => &[][..],
        };
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        if height == 0 || width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut obstacles = vec![false; width * height];
        // Text rows run top to bottom, y runs bottom to top.
        for (y, row) in rows.iter().rev().enumerate() {
            let text_row = height - 1 - y;
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    row: text_row,
                    found,
                    expected: width,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                obstacles[y * width + x] = match glyph {
                    '#' | 'X' | '@' => true,
                    '.' | ' ' => false,
                    glyph => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph,
                            row: text_row,
                            column: x,
                        });
                    }
                };
            }
        }

        Ok(Layout {
            width,
            height,
            obstacles,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = Layout::parse(&text)?;
        info!(
            path = %path.display(),
            width = layout.width,
            height = layout.height,
            obstacles = layout.obstacle_count(),
            "Loaded layout"
        );
        Ok(layout)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_obstacle(&self, point: &DiscretePoint) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) else {
            return false;
        };
        x < self.width && y < self.height && self.obstacles[y * self.width + x]
    }

    /// Obstacle cells, bottom row first, left to right.
    pub fn obstacles(&self) -> impl Iterator<Item = DiscretePoint> + '_ {
        self.obstacles
            .iter()
            .enumerate()
            .filter(|(_, obstacle)| **obstacle)
            .map(|(index, _)| {
                DiscretePoint::new((index % self.width) as i32, (index / self.width) as i32)
            })
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|obstacle| **obstacle).count()
    }

    /// Free cells are passable, obstacles are not.
    pub fn to_passability(&self) -> Result<PassabilityMap, NavigationError> {
        let rows: Vec<Vec<bool>> = self
            .obstacles
            .chunks(self.width)
            .map(|row| row.iter().map(|obstacle| !obstacle).collect())
            .collect();
        PassabilityMap::from_rows(&rows)
    }

    /// Adds one entity per obstacle cell, built by `factory` from the cell's
    /// pose. Cells the grid rejects are logged and skipped. Returns the
    /// number of entities placed.
    pub fn populate<F, R>(&self, grid: &mut Grid, mut factory: F, rotation: Rotation, rng: &mut R) -> usize
    where
        F: FnMut(Pose) -> Entity,
        R: Rng + ?Sized,
    {
        let mut placed = 0;
        for point in self.obstacles() {
            let pose = Pose::new(f64::from(point.x), f64::from(point.y), rotation.sample(rng));
            match grid.add(factory(pose)) {
                Ok(_) => placed += 1,
                Err(e) => warn!(%point, error = %e, "Skipping layout cell"),
            }
        }
        placed
    }
}
