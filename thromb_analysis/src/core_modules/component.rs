// THEORY:
// The `component` module holds the vocabulary shared by every pass: what a
// label is, what a bounding box is, and what a finished `Component` looks like.
//
// Key architectural principles:
// 1.  **Tagged Labels**: A cell is either `Label::Background` or
//     `Label::Component(id)`. The 1-based id only exists inside
//     `ComponentId`; per-component arrays are indexed through `index()`,
//     so the "0 means background" integer convention never leaks into
//     indexing code. Integers appear only at file boundaries (`to_raw`).
// 2.  **Sentinel Boxes**: A `BoundingBox` starts out "inverted"
//     (min = extent, max = -1) so that the first `include` call snaps it onto
//     the first pixel without a special case.
// 3.  **Frozen Output**: `Component` is a "dumb" data container assembled once
//     every pass has finished. Nothing mutates it afterwards.

use crate::core_modules::grid::Grid;
use std::fmt;
use std::num::NonZeroUsize;

/// Identifier of a connected component, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(NonZeroUsize);

impl ComponentId {
    /// Returns `None` for 0, which is reserved for background.
    pub fn new(id: usize) -> Option<Self> {
        NonZeroUsize::new(id).map(Self)
    }

    /// The id whose 0-based array slot is `index`.
    pub fn from_index(index: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(index))
    }

    /// The 1-based identifier.
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// The 0-based slot in per-component arrays.
    pub fn index(self) -> usize {
        self.0.get() - 1
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single cell in a `LabelMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
    #[default]
    Background,
    Component(ComponentId),
}

impl Label {
    pub fn is_background(self) -> bool {
        matches!(self, Label::Background)
    }

    pub fn component(self) -> Option<ComponentId> {
        match self {
            Label::Background => None,
            Label::Component(id) => Some(id),
        }
    }

    /// Integer form used by file formats: 0 for background, the id otherwise.
    pub fn to_raw(self) -> usize {
        self.component().map_or(0, ComponentId::get)
    }

    pub fn from_raw(raw: usize) -> Self {
        ComponentId::new(raw).map_or(Label::Background, Label::Component)
    }
}

/// Component identity per cell.
pub type LabelMap = Grid<Label>;

/// Tightest axis-aligned rectangle around a component, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl BoundingBox {
    /// The "nothing seen yet" sentinel for a grid of the given extents.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            min_x: width as i64,
            max_x: -1,
            min_y: height as i64,
            max_y: -1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Grows the box so it covers `(x, y)`.
    pub fn include(&mut self, x: usize, y: usize) {
        let (x, y) = (x as i64, y as i64);
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_x - self.min_x + 1) as usize
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_y - self.min_y + 1) as usize
        }
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Top-left corner `(min_x, min_y)`, or `None` for an empty box.
    pub fn start(&self) -> Option<(usize, usize)> {
        (!self.is_empty()).then(|| (self.min_x as usize, self.min_y as usize))
    }

    /// Bottom-right corner `(max_x, max_y)`, or `None` for an empty box.
    pub fn stop(&self) -> Option<(usize, usize)> {
        (!self.is_empty()).then(|| (self.max_x as usize, self.max_y as usize))
    }
}

/// Everything the analysis learned about one connected component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: ComponentId,
    pub bounding_box: BoundingBox,
    /// Pixels at the global maximum intensity.
    pub core_pixels: usize,
    /// Remaining pixels of the component.
    pub tail_pixels: usize,
    /// Pixels with a differently-labeled neighbor.
    pub boundary_pixels: usize,
    /// Disjoint regions of core pixels inside the bounding box, after cleaning.
    pub bright_components: usize,
    /// Disjoint regions of tail pixels inside the bounding box, after cleaning.
    pub dark_components: usize,
}

impl Component {
    pub fn area(&self) -> usize {
        self.core_pixels + self.tail_pixels
    }
}
