// THEORY:
// The `SubRegionClassifier` looks inside a single component. Thrombi often
// show several disjoint saturated cores separated by dimmer material, and the
// number of those pieces is a shape descriptor in its own right.
//
// For one component:
// 1.  **Crop**: A local mask the size of the component's bounding box is
//     built. Cells that belong to another component (or to background) get
//     a caller-chosen background value.
// 2.  **Split**: Member cells go to the "bright" sub-mask if they sit at the
//     global maximum (same tolerance rule as the core/tail split) and to the
//     "dark" sub-mask otherwise.
// 3.  **Clean**: Regions smaller than a minimum size are removed. Single-pixel
//     speckles from quantization would otherwise each count as a region.
// 4.  **Count**: The global `ComponentLabeler` is re-run on each cleaned
//     sub-mask; its label count is the bright/dark sub-component count.
//
// Work per component is proportional to its bounding-box area, so the whole
// pass stays bounded by the total component area rather than N times the
// image size.

use crate::core_modules::component::{BoundingBox, ComponentId, Label, LabelMap};
use crate::core_modules::component_labeler::component_labeler::label_components;
use crate::core_modules::descriptor_builder::MaxIntensity;
use crate::core_modules::grid::{Connectivity, IntensityGrid, Mask};
use crate::error::{AnalysisError, Result};

/// Which half of a component a sub-mask describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubRegionKind {
    /// Members at the global maximum intensity.
    Bright,
    /// All other members.
    Dark,
}

impl SubRegionKind {
    pub fn name(self) -> &'static str {
        match self {
            SubRegionKind::Bright => "Bright",
            SubRegionKind::Dark => "Dark",
        }
    }
}

/// Receives every sub-mask before cleaning, e.g. to persist it for debugging.
pub trait SubMaskSink {
    fn accept(&mut self, id: ComponentId, kind: SubRegionKind, mask: &Mask);
}

/// A sink that drops every sub-mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSubMasks;

impl SubMaskSink for DiscardSubMasks {
    fn accept(&mut self, _id: ComponentId, _kind: SubRegionKind, _mask: &Mask) {}
}

/// Bright and dark sub-component counts of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubRegionCounts {
    pub bright_components: usize,
    pub dark_components: usize,
}

/// Tunables of the sub-region pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRegionSettings {
    /// Value written for cells of the box that are not part of the component.
    pub background_value: bool,
    /// Regions with fewer pixels than this are removed before counting.
    pub min_region_size: usize,
    /// Adjacency used when measuring regions for cleaning.
    pub cleaning: Connectivity,
    /// Adjacency used when counting the cleaned regions.
    pub labeling: Connectivity,
}

impl Default for SubRegionSettings {
    fn default() -> Self {
        Self {
            background_value: false,
            min_region_size: 2,
            cleaning: Connectivity::Four,
            labeling: Connectivity::Four,
        }
    }
}

/// Borrowed view over the global pass outputs used to classify components one at a time.
pub struct SubRegionClassifier<'a> {
    grid: &'a IntensityGrid,
    label_map: &'a LabelMap,
    max_intensity: MaxIntensity,
    settings: SubRegionSettings,
}

impl<'a> SubRegionClassifier<'a> {
    pub fn new(
        grid: &'a IntensityGrid,
        label_map: &'a LabelMap,
        max_intensity: MaxIntensity,
        settings: SubRegionSettings,
    ) -> Result<Self> {
        grid.ensure_same_extents(label_map)?;
        Ok(Self {
            grid,
            label_map,
            max_intensity,
            settings,
        })
    }

    /// Crops `bounding_box` and keeps the `kind` half of component `id`.
    pub fn local_mask(
        &self,
        id: ComponentId,
        bounding_box: &BoundingBox,
        kind: SubRegionKind,
    ) -> Result<Mask> {
        let (start_x, start_y) = self.checked_start(id, bounding_box)?;
        let member = Label::Component(id);

        Ok(Mask::from_fn(
            bounding_box.width(),
            bounding_box.height(),
            |x, y| {
                let cell = (x + start_x, y + start_y);
                if self.label_map[cell] != member {
                    return self.settings.background_value;
                }
                let bright = self.max_intensity.matches(self.grid[cell]);
                match kind {
                    SubRegionKind::Bright => bright,
                    SubRegionKind::Dark => !bright,
                }
            },
        ))
    }

    /// Counts the bright and dark sub-components of component `id`.
    pub fn classify(
        &self,
        id: ComponentId,
        bounding_box: &BoundingBox,
        sink: &mut dyn SubMaskSink,
    ) -> Result<SubRegionCounts> {
        Ok(SubRegionCounts {
            bright_components: self.count(id, bounding_box, SubRegionKind::Bright, sink)?,
            dark_components: self.count(id, bounding_box, SubRegionKind::Dark, sink)?,
        })
    }

    fn count(
        &self,
        id: ComponentId,
        bounding_box: &BoundingBox,
        kind: SubRegionKind,
        sink: &mut dyn SubMaskSink,
    ) -> Result<usize> {
        let local = self.local_mask(id, bounding_box, kind)?;
        sink.accept(id, kind, &local);
        let cleaned = clean_mask(&local, self.settings.min_region_size, self.settings.cleaning);
        Ok(label_components(&cleaned, self.settings.labeling).num_labels)
    }

    fn checked_start(&self, id: ComponentId, bounding_box: &BoundingBox) -> Result<(usize, usize)> {
        let (Some(start), Some((stop_x, stop_y))) = (bounding_box.start(), bounding_box.stop())
        else {
            return Err(AnalysisError::invariant(format!(
                "component {id} has an empty bounding box"
            )));
        };
        if stop_x >= self.grid.width() || stop_y >= self.grid.height() {
            return Err(AnalysisError::invariant(format!(
                "bounding box of component {id} leaves the {}x{} grid",
                self.grid.width(),
                self.grid.height()
            )));
        }
        Ok(start)
    }
}

/// Removes every connected region of `mask` with fewer than `min_region_size` pixels.
pub fn clean_mask(mask: &Mask, min_region_size: usize, connectivity: Connectivity) -> Mask {
    if min_region_size <= 1 {
        return mask.clone();
    }
    let labeling = label_components(mask, connectivity);
    let sizes = labeling.component_sizes();
    labeling
        .label_map
        .map(|label| label.component().is_some_and(|id| sizes[id.index()] >= min_region_size))
}
