// THEORY:
// The `pipeline` module is the top-level API of the analysis engine. It runs
// every pass in order over one scan and hands back a frozen `Report`.
//
// Passes, each a pure function of the previous outputs:
//   1. threshold        IntensityGrid      -> Mask
//   2. label            Mask               -> LabelMap, N
//   3. describe         Grid + LabelMap    -> boxes, core/tail counts
//   4. boundaries       LabelMap           -> boundary Mask, counts
//   5. sub-regions      per component crop -> bright/dark counts
//   6. assemble         everything above   -> Vec<Component>
//
// The run is strictly sequential: every pass needs the complete output of the
// one before it. Nothing here touches the filesystem except
// `PipelineConfig::from_json_file`; sub-mask persistence is delegated to a
// caller-supplied `SubMaskSink`.

use crate::core_modules::boundary_detector::boundary_detector;
use crate::core_modules::component::{Component, ComponentId, LabelMap};
use crate::core_modules::component_labeler::component_labeler;
use crate::core_modules::descriptor_builder::{MaxIntensity, build_descriptors};
use crate::core_modules::grid::{Connectivity, IntensityGrid, Mask};
use crate::core_modules::statistics::StatisticsTable;
use crate::core_modules::sub_region_classifier::{
    DiscardSubMasks, SubMaskSink, SubRegionClassifier, SubRegionSettings,
};
use crate::core_modules::thresholder::threshold_above_minimum;
use crate::error::{AnalysisError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export key data structures for the public API.
pub use crate::core_modules::component::{BoundingBox, Label};
pub use crate::core_modules::sub_region_classifier::SubRegionKind;

/// Absolute tolerance for "equal to the maximum intensity".
pub const DEFAULT_TOLERANCE: f64 = 1e-10;
/// Sub-regions smaller than this many pixels are treated as noise.
pub const DEFAULT_MIN_SUB_REGION_SIZE: usize = 2;
/// Seed of the label color table.
pub const DEFAULT_COLOR_SEED: u64 = 0;

/// Configuration for the ThrombPipeline, allowing for tunable behavior.
///
/// The defaults reproduce the reference behavior: 4-connected regions,
/// 8-neighborhood boundaries, 4-connected cleaning of regions below 2 pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute epsilon for the core/bright classification.
    pub tolerance: f64,
    /// Adjacency that forms components, globally and inside sub-masks.
    pub labeling_connectivity: Connectivity,
    /// Neighborhood inspected for boundary membership.
    pub boundary_connectivity: Connectivity,
    /// Adjacency used to measure regions when cleaning sub-masks.
    pub cleaning_connectivity: Connectivity,
    /// Minimum pixel count of a bright/dark sub-region.
    pub min_sub_region_size: usize,
    /// Value given to cells of a component's box that belong to something else.
    pub sub_mask_background: bool,
    /// Seed for the label color table used by renderers.
    pub color_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            labeling_connectivity: Connectivity::Four,
            boundary_connectivity: Connectivity::Eight,
            cleaning_connectivity: Connectivity::Four,
            min_sub_region_size: DEFAULT_MIN_SUB_REGION_SIZE,
            sub_mask_background: false,
            color_seed: DEFAULT_COLOR_SEED,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AnalysisError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| AnalysisError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AnalysisError::invalid_config("tolerance", self.tolerance));
        }
        if self.min_sub_region_size == 0 {
            return Err(AnalysisError::invalid_config(
                "min_sub_region_size",
                self.min_sub_region_size,
            ));
        }
        Ok(())
    }

    fn sub_region_settings(&self) -> SubRegionSettings {
        SubRegionSettings {
            background_value: self.sub_mask_background,
            min_region_size: self.min_sub_region_size,
            cleaning: self.cleaning_connectivity,
            labeling: self.labeling_connectivity,
        }
    }
}

/// The frozen result of analyzing one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub width: usize,
    pub height: usize,
    /// Foreground mask produced by the thresholder.
    pub foreground: Mask,
    pub label_map: LabelMap,
    pub boundary_mask: Mask,
    /// One entry per component, `components[i].id.index() == i`.
    pub components: Vec<Component>,
}

impl Report {
    /// Number of components N.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn foreground_pixels(&self) -> usize {
        self.foreground.count_true()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    pub fn bounding_boxes(&self) -> impl Iterator<Item = (ComponentId, &BoundingBox)> {
        self.components.iter().map(|c| (c.id, &c.bounding_box))
    }

    pub fn statistics(&self) -> StatisticsTable {
        StatisticsTable::from_components(&self.components)
    }
}

/// The main, top-level struct for the analysis engine.
#[derive(Debug, Clone)]
pub struct ThrombPipeline {
    config: PipelineConfig,
}

impl ThrombPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every pass over `grid`, discarding the intermediate sub-masks.
    pub fn analyze(&self, grid: &IntensityGrid) -> Result<Report> {
        self.analyze_with_sink(grid, &mut DiscardSubMasks)
    }

    /// Runs every pass over `grid`, handing each bright/dark sub-mask to `sink`
    /// before it is cleaned.
    pub fn analyze_with_sink(
        &self,
        grid: &IntensityGrid,
        sink: &mut dyn SubMaskSink,
    ) -> Result<Report> {
        // Stage 1: Foreground
        let foreground = threshold_above_minimum(grid);

        // Stage 2: Global Labeling
        let labeling =
            component_labeler::label_components(&foreground, self.config.labeling_connectivity);
        info!("Found {} components.", labeling.num_labels);

        // Stage 3: Bounding Boxes and Core/Tail Split
        let max_intensity = MaxIntensity::of_grid(grid, self.config.tolerance);
        let descriptors = build_descriptors(
            grid,
            &labeling.label_map,
            labeling.num_labels,
            max_intensity,
        )?;

        // Stage 4: Boundaries
        let boundaries = boundary_detector::detect_boundaries(
            &labeling.label_map,
            labeling.num_labels,
            self.config.boundary_connectivity,
        )?;

        // Stage 5: Bright/Dark Sub-Regions
        let classifier = SubRegionClassifier::new(
            grid,
            &labeling.label_map,
            max_intensity,
            self.config.sub_region_settings(),
        )?;

        // Stage 6: Assembly
        let mut components = Vec::with_capacity(labeling.num_labels);
        for (index, descriptor) in descriptors.iter().enumerate() {
            let id = ComponentId::from_index(index);
            let counts = classifier.classify(id, &descriptor.bounding_box, sink)?;
            let component = Component {
                id,
                bounding_box: descriptor.bounding_box,
                core_pixels: descriptor.core_pixels,
                tail_pixels: descriptor.tail_pixels,
                boundary_pixels: boundaries.boundary_pixels[index],
                bright_components: counts.bright_components,
                dark_components: counts.dark_components,
            };
            debug!(
                "component {id}: box {:?}, core {}, tail {}, boundary {}, bright {}, dark {}",
                component.bounding_box,
                component.core_pixels,
                component.tail_pixels,
                component.boundary_pixels,
                component.bright_components,
                component.dark_components
            );
            components.push(component);
        }

        let label_map = labeling.label_map;
        Ok(Report {
            width: grid.width(),
            height: grid.height(),
            foreground,
            label_map,
            boundary_mask: boundaries.mask,
            components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::grid::Grid;

    fn corner_block() -> IntensityGrid {
        Grid::from_fn(5, 5, |x, y| if x < 3 && y < 3 { 255.0 } else { 0.0 })
    }

    fn pipeline() -> ThrombPipeline {
        ThrombPipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn corner_block_scenario() {
        let report = pipeline().analyze(&corner_block()).unwrap();

        assert_eq!(report.num_components(), 1);
        let component = &report.components[0];
        assert_eq!(
            component.bounding_box,
            BoundingBox {
                min_x: 0,
                max_x: 2,
                min_y: 0,
                max_y: 2
            }
        );
        assert_eq!(component.core_pixels, 9);
        assert_eq!(component.tail_pixels, 0);
        // The two rim sides on the image edge have no outside neighbors.
        assert_eq!(component.boundary_pixels, 5);
        assert_eq!(component.bright_components, 1);
        assert_eq!(component.dark_components, 0);
        assert!(!report.boundary_mask[(0, 0)]);
        assert!(!report.boundary_mask[(1, 1)]);
        assert!(report.boundary_mask[(2, 2)]);
    }

    #[test]
    fn interior_block_scenario() {
        let grid = Grid::from_fn(5, 5, |x, y| {
            if (1..4).contains(&x) && (1..4).contains(&y) { 255.0 } else { 0.0 }
        });
        let report = pipeline().analyze(&grid).unwrap();

        assert_eq!(report.num_components(), 1);
        let component = &report.components[0];
        assert_eq!(component.area(), 9);
        assert_eq!(component.boundary_pixels, 8);
        assert!(!report.boundary_mask[(2, 2)]);
    }

    #[test]
    fn two_far_apart_pixels() {
        let grid = Grid::from_fn(20, 10, |x, y| match (x, y) {
            (2, 1) | (17, 8) => 1.0,
            _ => 0.0,
        });
        let report = pipeline().analyze(&grid).unwrap();

        assert_eq!(report.num_components(), 2);
        for component in &report.components {
            assert_eq!(component.bounding_box.area(), 1);
            assert_eq!(component.boundary_pixels, 1);
            // A single bright pixel is cleaned away as noise.
            assert_eq!(component.bright_components, 0);
        }
        assert_eq!(report.components[0].bounding_box.start(), Some((2, 1)));
        assert_eq!(report.components[1].bounding_box.start(), Some((17, 8)));
    }

    #[test]
    fn empty_and_constant_grids_have_no_components() {
        let report = pipeline().analyze(&IntensityGrid::filled(0, 0, 0.0)).unwrap();
        assert_eq!(report.num_components(), 0);

        let report = pipeline().analyze(&IntensityGrid::filled(6, 4, 3.0)).unwrap();
        assert_eq!(report.num_components(), 0);
        assert_eq!(report.statistics().len(), 0);
    }

    #[test]
    fn table_accounts_for_every_foreground_pixel() {
        let grid = Grid::from_fn(31, 23, |x, y| ((x * 13 + y * 7) % 11) as f64);
        let report = pipeline().analyze(&grid).unwrap();
        let table = report.statistics();

        assert_eq!(table.len(), report.num_components());
        assert_eq!(table.foreground_pixels(), report.foreground_pixels());
        for component in &report.components {
            let area = report
                .label_map
                .cells()
                .iter()
                .filter(|l| l.component() == Some(component.id))
                .count();
            assert_eq!(component.area(), area);
        }
    }

    #[test]
    fn boxes_are_tight() {
        let grid = Grid::from_fn(40, 30, |x, y| ((x / 3 + y / 4) % 3 == 0) as u8 as f64);
        let report = pipeline().analyze(&grid).unwrap();

        for (id, bbox) in report.bounding_boxes() {
            let pixels: Vec<(usize, usize)> = report
                .label_map
                .iter_cells()
                .filter(|(_, _, l)| l.component() == Some(id))
                .map(|(x, y, _)| (x, y))
                .collect();
            assert!(pixels.iter().all(|&(x, y)| bbox.contains(x, y)));
            assert!(pixels.iter().any(|&(x, _)| x as i64 == bbox.min_x));
            assert!(pixels.iter().any(|&(x, _)| x as i64 == bbox.max_x));
            assert!(pixels.iter().any(|&(_, y)| y as i64 == bbox.min_y));
            assert!(pixels.iter().any(|&(_, y)| y as i64 == bbox.max_y));
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let grid = Grid::from_fn(25, 25, |x, y| ((x * x + y * 3) % 7) as f64);
        let first = pipeline().analyze(&grid).unwrap();
        let second = pipeline().analyze(&grid).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sink_sees_both_masks_of_every_component() {
        #[derive(Default)]
        struct Count(Vec<(ComponentId, SubRegionKind)>);
        impl SubMaskSink for Count {
            fn accept(&mut self, id: ComponentId, kind: SubRegionKind, _mask: &Mask) {
                self.0.push((id, kind));
            }
        }

        let grid = Grid::from_fn(9, 3, |x, _| if x % 4 == 0 { 2.0 } else { 0.0 });
        let mut sink = Count::default();
        let report = pipeline().analyze_with_sink(&grid, &mut sink).unwrap();

        assert_eq!(report.num_components(), 3);
        assert_eq!(sink.0.len(), 6);
        assert_eq!(sink.0[0], (ComponentId::from_index(0), SubRegionKind::Bright));
        assert_eq!(sink.0[5], (ComponentId::from_index(2), SubRegionKind::Dark));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            tolerance: -1.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            ThrombPipeline::new(config),
            Err(AnalysisError::InvalidConfig { .. })
        ));

        let config = PipelineConfig {
            min_sub_region_size: 0,
            ..PipelineConfig::default()
        };
        assert!(ThrombPipeline::new(config).is_err());
    }

    #[test]
    fn config_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "tolerance": 0.5, "boundary_connectivity": "four" }"#)
            .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.tolerance, 0.5);
        assert_eq!(config.boundary_connectivity, Connectivity::Four);
        assert_eq!(config.labeling_connectivity, Connectivity::Four);
        assert_eq!(config.min_sub_region_size, DEFAULT_MIN_SUB_REGION_SIZE);
    }

    #[test]
    fn config_file_errors_keep_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            PipelineConfig::from_json_file(&missing),
            Err(AnalysisError::ConfigIo { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ tolerance: }").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&broken),
            Err(AnalysisError::ConfigParse { .. })
        ));
    }
}
