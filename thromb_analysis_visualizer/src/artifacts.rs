// THEORY:
// `ArtifactWriter` is the output stage of a run. Every artifact is written
// independently: a failure is logged with its full error chain, remembered as
// "skipped", and the remaining artifacts are still produced. The in-memory
// report is never affected by output problems.
//
// `ComponentMaskWriter` plugs into the analysis as a `SubMaskSink` and
// persists each component's bright/dark sub-mask, named by the 0-based
// component index.

use crate::color_table::ColorTable;
use crate::image_helper::{save_label_meta_image, save_label_tiff, save_mask, save_png};
use crate::render::{render_labels, render_labels_with_boxes};
use crate::{RenderError, Result, error_chain};
use log::{error, info};
use std::path::{Path, PathBuf};
use thromb_analysis::core_modules::component::ComponentId;
use thromb_analysis::core_modules::grid::Mask;
use thromb_analysis::core_modules::sub_region_classifier::{SubMaskSink, SubRegionKind};
use thromb_analysis::pipeline::Report;

pub const BOUNDARY_FILE: &str = "boundary.pgm";
pub const COLORED_COMPONENTS_FILE: &str = "componentsCol.png";
pub const COLORED_BOXES_FILE: &str = "componentsBBCol.png";
pub const LABEL_TIFF_FILE: &str = "components.tif";
pub const LABEL_META_IMAGE_STEM: &str = "components";
pub const STATISTICS_FILE: &str = "stat.csv";
pub const COMPONENT_MASK_DIR: &str = "components";

/// Writes run artifacts into one directory, tolerating individual failures.
#[derive(Debug)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    written: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            written: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Runs `write` for the artifact `name`. Returns whether it succeeded.
    pub fn write(&mut self, name: &str, write: impl FnOnce(&Path) -> Result<()>) -> bool {
        let path = self.path(name);
        match write(&path) {
            Ok(()) => {
                info!("Wrote \"{}\".", path.display());
                self.written.push(path);
                true
            }
            Err(err) => {
                error!("Unable to write \"{}\": {}", path.display(), error_chain(&err));
                self.skipped.push(path);
                false
            }
        }
    }

    /// Writes every standard artifact of `report`.
    pub fn write_report(&mut self, report: &Report, colors: &ColorTable) {
        self.write(BOUNDARY_FILE, |path| save_mask(path, &report.boundary_mask));

        self.write(COLORED_COMPONENTS_FILE, |path| {
            save_png(path, &render_labels(&report.label_map, colors)?)
        });

        self.write(COLORED_BOXES_FILE, |path| {
            let image = render_labels_with_boxes(&report.label_map, &report.components, colors)?;
            save_png(path, &image)
        });

        self.write(LABEL_TIFF_FILE, |path| save_label_tiff(path, &report.label_map));

        let directory = self.output_dir.clone();
        self.write(&format!("{LABEL_META_IMAGE_STEM}.mhd"), |_| {
            save_label_meta_image(&directory, LABEL_META_IMAGE_STEM, &report.label_map)
        });

        let table = report.statistics();
        self.write(STATISTICS_FILE, |path| {
            table.save(path).map_err(|e| RenderError::io(path, e))
        });
    }
}

/// File name of a component's debug sub-mask, e.g. `componentBright-007.pgm`.
pub fn component_mask_file_name(id: ComponentId, kind: SubRegionKind) -> String {
    format!("component{}-{:03}.pgm", kind.name(), id.index())
}

/// Persists bright/dark sub-masks handed over by the analysis.
#[derive(Debug)]
pub struct ComponentMaskWriter {
    directory: PathBuf,
    written: usize,
    failed: usize,
}

impl ComponentMaskWriter {
    /// Creates `<output_dir>/components` if needed.
    pub fn create(output_dir: &Path) -> Result<Self> {
        let directory = output_dir.join(COMPONENT_MASK_DIR);
        std::fs::create_dir_all(&directory).map_err(|e| RenderError::io(&directory, e))?;
        Ok(Self {
            directory,
            written: 0,
            failed: 0,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl SubMaskSink for ComponentMaskWriter {
    fn accept(&mut self, id: ComponentId, kind: SubRegionKind, mask: &Mask) {
        let path = self.directory.join(component_mask_file_name(id, kind));
        match save_mask(&path, mask) {
            Ok(()) => self.written += 1,
            Err(err) => {
                error!("Unable to write \"{}\": {}", path.display(), error_chain(&err));
                self.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thromb_analysis::core_modules::grid::Grid;
    use thromb_analysis::pipeline::{PipelineConfig, ThrombPipeline};

    fn report() -> Report {
        let grid = Grid::from_fn(12, 8, |x, y| match (x, y) {
            (1..=3, 1..=3) => 10.0,
            (7..=9, 4..=6) => 5.0,
            _ => 0.0,
        });
        ThrombPipeline::new(PipelineConfig::default())
            .unwrap()
            .analyze(&grid)
            .unwrap()
    }

    #[test]
    fn writes_every_standard_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();
        let colors = ColorTable::seeded(report.num_components(), 1);

        let mut writer = ArtifactWriter::new(dir.path());
        writer.write_report(&report, &colors);

        assert!(writer.skipped().is_empty());
        for name in [
            BOUNDARY_FILE,
            COLORED_COMPONENTS_FILE,
            COLORED_BOXES_FILE,
            LABEL_TIFF_FILE,
            "components.mhd",
            "components.raw",
            STATISTICS_FILE,
        ] {
            assert!(dir.path().join(name).is_file(), "{name} missing");
        }

        let stats = std::fs::read_to_string(dir.path().join(STATISTICS_FILE)).unwrap();
        assert_eq!(stats.lines().count(), 1 + report.num_components());
    }

    #[test]
    fn failures_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();
        let colors = ColorTable::seeded(report.num_components(), 1);

        let mut writer = ArtifactWriter::new(dir.path().join("does-not-exist"));
        writer.write_report(&report, &colors);

        assert!(writer.written().is_empty());
        assert_eq!(writer.skipped().len(), 6);
    }

    #[test]
    fn component_masks_use_zero_padded_indices() {
        let dir = tempfile::tempdir().unwrap();
        let mut masks = ComponentMaskWriter::create(dir.path()).unwrap();
        let grid = Grid::from_fn(12, 8, |x, y| match (x, y) {
            (1..=3, 1..=3) => 10.0,
            (7..=9, 4..=6) => 5.0,
            _ => 0.0,
        });
        ThrombPipeline::new(PipelineConfig::default())
            .unwrap()
            .analyze_with_sink(&grid, &mut masks)
            .unwrap();

        assert_eq!(masks.written(), 4);
        assert_eq!(masks.failed(), 0);
        for name in [
            "componentBright-000.pgm",
            "componentDark-000.pgm",
            "componentBright-001.pgm",
            "componentDark-001.pgm",
        ] {
            assert!(masks.directory().join(name).is_file(), "{name} missing");
        }
    }
}
