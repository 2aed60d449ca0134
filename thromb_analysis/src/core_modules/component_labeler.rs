// THEORY:
// The `ComponentLabeler` turns a binary mask into a label map. It is the
// workhorse of the crate and runs at two scales: once over the whole scan, and
// once per bright/dark sub-mask inside every component's bounding box.
//
// Algorithm:
// 1.  **Row-Major Seeding**: Cells are visited y-outer, x-inner. The first
//     unlabeled foreground cell found becomes the seed of a new component and
//     receives the next id (starting at 1). Ids therefore increase with the
//     row-major position of each component's first pixel, which makes the
//     output fully deterministic.
// 2.  **Region Growing**: From the seed, every foreground cell reachable under
//     the requested `Connectivity` is claimed using an explicit worklist. No
//     recursion is involved, so large regions cannot exhaust the call stack.
// 3.  **Stateless Utility**: The labeler keeps no state between calls; the
//     worklist buffer is reused within one call only.

use crate::core_modules::component::{ComponentId, Label, LabelMap};
use crate::core_modules::grid::{Connectivity, Mask};

pub mod component_labeler {
    use super::*;

    /// Output of one labeling run.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Labeling {
        pub label_map: LabelMap,
        /// Number of components N; ids run `1..=N`.
        pub num_labels: usize,
    }

    impl Labeling {
        /// Pixel count per component, indexed by `ComponentId::index`.
        pub fn component_sizes(&self) -> Vec<usize> {
            let mut sizes = vec![0; self.num_labels];
            for id in self.label_map.cells().iter().filter_map(|l| l.component()) {
                sizes[id.index()] += 1;
            }
            sizes
        }
    }

    /// Labels every connected foreground region of `mask`.
    pub fn label_components(mask: &Mask, connectivity: Connectivity) -> Labeling {
        let (width, height) = (mask.width(), mask.height());
        let mut label_map = LabelMap::filled(width, height, Label::Background);
        let mut worklist: Vec<(usize, usize)> = Vec::new();
        let mut num_labels = 0;

        for y in 0..height {
            for x in 0..width {
                if !mask[(x, y)] || !label_map[(x, y)].is_background() {
                    continue;
                }

                let id = ComponentId::from_index(num_labels);
                num_labels += 1;
                flood_fill(mask, &mut label_map, &mut worklist, (x, y), id, connectivity);
            }
        }

        Labeling {
            label_map,
            num_labels,
        }
    }

    /// Number of connected foreground regions of `mask`.
    pub fn count_components(mask: &Mask, connectivity: Connectivity) -> usize {
        label_components(mask, connectivity).num_labels
    }

    fn flood_fill(
        mask: &Mask,
        label_map: &mut LabelMap,
        worklist: &mut Vec<(usize, usize)>,
        seed: (usize, usize),
        id: ComponentId,
        connectivity: Connectivity,
    ) {
        let (width, height) = (mask.width(), mask.height());
        label_map[seed] = Label::Component(id);
        worklist.push(seed);

        while let Some((x, y)) = worklist.pop() {
            for neighbor in connectivity.neighbors(x, y, width, height) {
                if mask[neighbor] && label_map[neighbor].is_background() {
                    label_map[neighbor] = Label::Component(id);
                    worklist.push(neighbor);
                }
            }
        }
    }
}
