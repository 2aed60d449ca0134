// THEORY:
// This file is the main entry point for the `thromb_analysis` library crate.
// It exposes the `ThrombPipeline` and its associated data structures
// (`PipelineConfig`, `Report`, `Component`, ...) as the high-level interface
// for analyzing a single-channel scan.
//
// The pipeline is a strict sequence of passes over immutable data:
//   intensity grid -> foreground mask -> label map -> per-component
//   descriptors -> boundary mask -> bright/dark sub-region counts -> table.
// Every pass lives in `core_modules` as a free function (or a small borrowed
// helper struct) so each stage can be exercised on its own. File formats and
// rendering are left to the `thromb_analysis_visualizer` crate.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use error::{AnalysisError, Result};
