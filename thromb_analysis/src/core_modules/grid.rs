// THEORY:
// The `Grid` module is the storage layer every pass works on. A `Grid<T>` is a
// "dumb" row-major container with fixed extents (width = numX, height = numY);
// it knows how to index itself and how to enumerate neighbors, nothing more.
//
// Three instantiations carry the whole data model:
//   - `IntensityGrid` (`Grid<f64>`): the decoded scan, read-only input.
//   - `Mask` (`Grid<bool>`): foreground / boundary / local sub-masks.
//   - `LabelMap` (`Grid<Label>`, see `component`): component identity per cell.
//
// `Connectivity` describes which neighbors count as adjacent. It is a separate
// parameter for labeling, boundary detection and mask cleaning so the three
// choices never get conflated.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A fixed-size, row-major 2-D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// Raw scan intensities.
pub type IntensityGrid = Grid<f64>;

/// Binary image; `true` marks foreground.
pub type Mask = Grid<bool>;

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Wraps a row-major buffer. Fails if the buffer length is not `width * height`.
    pub fn from_vec(width: usize, height: usize, cells: Vec<T>) -> Result<Self> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(AnalysisError::DimensionMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a grid by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        (x < self.width && y < self.height).then(|| &self.cells[y * self.width + x])
    }

    pub fn same_extents<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Returns an error unless `other` has the same width and height.
    pub fn ensure_same_extents<U>(&self, other: &Grid<U>) -> Result<()> {
        if self.same_extents(other) {
            Ok(())
        } else {
            Err(AnalysisError::ExtentMismatch {
                left_width: self.width,
                left_height: self.height,
                right_width: other.width,
                right_height: other.height,
            })
        }
    }

    /// Iterates `(x, y, &cell)` in row-major order (y outer, x inner).
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i % width, i / width, cell))
    }

    /// Applies `f` to every cell, keeping the extents.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        &self.cells[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        &mut self.cells[y * self.width + x]
    }
}

impl IntensityGrid {
    /// Smallest intensity in the grid, ignoring NaN. `None` for an empty grid.
    pub fn min_value(&self) -> Option<f64> {
        self.cells
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::min)
    }

    /// Largest intensity in the grid, ignoring NaN. `None` for an empty grid.
    pub fn max_value(&self) -> Option<f64> {
        self.cells
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }
}

impl Mask {
    pub fn count_true(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Neighbor adjacency rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Up, down, left, right.
    Four,
    /// The four direct neighbors plus diagonals.
    Eight,
}

const FOUR_OFFSETS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
const EIGHT_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl Connectivity {
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR_OFFSETS,
            Connectivity::Eight => &EIGHT_OFFSETS,
        }
    }

    /// Neighbors of `(x, y)` clipped to `[0, width) x [0, height)`.
    pub fn neighbors(
        self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.offsets().iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            (nx < width && ny < height).then_some((nx, ny))
        })
    }
}
