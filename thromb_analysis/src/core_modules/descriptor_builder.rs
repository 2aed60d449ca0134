// THEORY:
// The descriptor builder consumes the global label map in a single row-major
// scan and, per label, accumulates the bounding box together with the
// core/tail split. A "core" pixel sits at the scan's global maximum intensity
// (a saturated thrombus core); everything else in the component is "tail".
//
// "At the maximum" is an absolute-tolerance comparison, captured by
// `MaxIntensity` so the sub-region classifier applies the exact same rule.

use crate::core_modules::component::{BoundingBox, LabelMap};
use crate::core_modules::grid::IntensityGrid;
use crate::error::{AnalysisError, Result};

/// Decides whether an intensity counts as the global maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxIntensity {
    pub max: f64,
    pub tolerance: f64,
}

impl MaxIntensity {
    /// Uses `grid`'s own maximum; an empty grid yields a rule that never matches.
    pub fn of_grid(grid: &IntensityGrid, tolerance: f64) -> Self {
        Self {
            max: grid.max_value().unwrap_or(f64::NAN),
            tolerance,
        }
    }

    pub fn matches(&self, value: f64) -> bool {
        (value - self.max).abs() <= self.tolerance
    }
}

/// Geometry and photometry of one label after the first scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentDescriptor {
    pub bounding_box: BoundingBox,
    pub core_pixels: usize,
    pub tail_pixels: usize,
}

impl ComponentDescriptor {
    fn empty(width: usize, height: usize) -> Self {
        Self {
            bounding_box: BoundingBox::empty(width, height),
            core_pixels: 0,
            tail_pixels: 0,
        }
    }
}

/// Builds one descriptor per label `1..=num_labels`, indexed by `ComponentId::index`.
pub fn build_descriptors(
    grid: &IntensityGrid,
    label_map: &LabelMap,
    num_labels: usize,
    max_intensity: MaxIntensity,
) -> Result<Vec<ComponentDescriptor>> {
    grid.ensure_same_extents(label_map)?;

    let (width, height) = (label_map.width(), label_map.height());
    let mut descriptors = vec![ComponentDescriptor::empty(width, height); num_labels];

    for (x, y, label) in label_map.iter_cells() {
        let Some(id) = label.component() else {
            continue;
        };
        let descriptor = descriptors.get_mut(id.index()).ok_or_else(|| {
            AnalysisError::invariant(format!(
                "label {id} at ({x}, {y}) exceeds label count {num_labels}"
            ))
        })?;

        descriptor.bounding_box.include(x, y);
        if max_intensity.matches(grid[(x, y)]) {
            descriptor.core_pixels += 1;
        } else {
            descriptor.tail_pixels += 1;
        }
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::component_labeler::component_labeler::label_components;
    use crate::core_modules::grid::{Connectivity, Grid};
    use crate::core_modules::thresholder::threshold_above_minimum;

    fn describe(grid: &IntensityGrid) -> Vec<ComponentDescriptor> {
        let labeling = label_components(&threshold_above_minimum(grid), Connectivity::Four);
        let rule = MaxIntensity::of_grid(grid, 1e-10);
        build_descriptors(grid, &labeling.label_map, labeling.num_labels, rule).unwrap()
    }

    #[test]
    fn corner_block_has_tight_box_and_only_core_pixels() {
        let grid = Grid::from_fn(5, 5, |x, y| if x < 3 && y < 3 { 1.0 } else { 0.0 });
        let descriptors = describe(&grid);

        assert_eq!(descriptors.len(), 1);
        assert_eq!(
            descriptors[0].bounding_box,
            BoundingBox {
                min_x: 0,
                max_x: 2,
                min_y: 0,
                max_y: 2
            }
        );
        assert_eq!(descriptors[0].core_pixels, 9);
        assert_eq!(descriptors[0].tail_pixels, 0);
    }

    #[test]
    fn core_and_tail_sum_to_area() {
        // One component with a bright center and a dimmer rim, one dim dot.
        let grid = Grid::from_vec(
            5,
            3,
            vec![
                0.0, 0.5, 0.5, 0.0, 0.0, //
                0.0, 0.5, 1.0, 0.0, 0.3, //
                0.0, 0.5, 0.5, 0.0, 0.0, //
            ],
        )
        .unwrap();
        let descriptors = describe(&grid);

        assert_eq!(descriptors.len(), 2);
        assert_eq!((descriptors[0].core_pixels, descriptors[0].tail_pixels), (1, 5));
        assert_eq!((descriptors[1].core_pixels, descriptors[1].tail_pixels), (0, 1));
        assert_eq!(descriptors[1].bounding_box.area(), 1);
    }

    #[test]
    fn tolerance_widens_the_core() {
        let rule = MaxIntensity {
            max: 1.0,
            tolerance: 0.05,
        };
        assert!(rule.matches(0.96));
        assert!(!rule.matches(0.94));
    }

    #[test]
    fn mismatched_extents_are_rejected() {
        let grid = IntensityGrid::filled(3, 3, 0.0);
        let labels = LabelMap::filled(2, 3, Default::default());
        let rule = MaxIntensity::of_grid(&grid, 0.0);
        assert!(matches!(
            build_descriptors(&grid, &labels, 0, rule),
            Err(AnalysisError::ExtentMismatch { .. })
        ));
    }
}
