// THEORY:
// The `BoundaryDetector` is the second pass over the global label map. A
// foreground pixel lies on its component's boundary when anything in its
// neighborhood carries a different label, background included.
//
// Key architectural principles:
// 1.  **Clipped Neighborhood**: Neighbors outside the grid are not examined at
//     all. The image border therefore never forces a boundary on its own; a
//     component filling the whole grid has no boundary pixels.
// 2.  **Independent Neighborhood**: The neighborhood (8 by default) is chosen
//     separately from the 4-connectivity used to form regions. Two regions
//     touching only diagonally are distinct components, and each still sees
//     the other as "different" through the diagonal.
// 3.  **Single Output Pass**: The boundary mask and the per-component boundary
//     counts are produced together; the label map is not touched.

use crate::core_modules::component::LabelMap;
use crate::core_modules::grid::{Connectivity, Mask};
use crate::error::{AnalysisError, Result};

pub mod boundary_detector {
    use super::*;

    /// Boundary classification of every pixel plus per-component totals.
    #[derive(Debug, Clone, PartialEq)]
    pub struct BoundaryMap {
        pub mask: Mask,
        /// Boundary pixel count per component, indexed by `ComponentId::index`.
        pub boundary_pixels: Vec<usize>,
    }

    /// Flags every labeled pixel with a differently-labeled neighbor.
    pub fn detect_boundaries(
        label_map: &LabelMap,
        num_labels: usize,
        neighborhood: Connectivity,
    ) -> Result<BoundaryMap> {
        let (width, height) = (label_map.width(), label_map.height());
        let mut mask = Mask::filled(width, height, false);
        let mut boundary_pixels = vec![0; num_labels];

        for y in 0..height {
            for x in 0..width {
                let label = label_map[(x, y)];
                // Skip background pixels
                let Some(id) = label.component() else {
                    continue;
                };

                let on_boundary = neighborhood
                    .neighbors(x, y, width, height)
                    .any(|neighbor| label_map[neighbor] != label);
                if !on_boundary {
                    continue;
                }

                let count = boundary_pixels.get_mut(id.index()).ok_or_else(|| {
                    AnalysisError::invariant(format!(
                        "label {id} at ({x}, {y}) exceeds label count {num_labels}"
                    ))
                })?;
                *count += 1;
                mask[(x, y)] = true;
            }
        }

        Ok(BoundaryMap {
            mask,
            boundary_pixels,
        })
    }
}
