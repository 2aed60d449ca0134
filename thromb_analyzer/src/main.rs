use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::Logger;
use log::{error, info};
use std::path::PathBuf;
use thromb_analysis::core_modules::grid::IntensityGrid;
use thromb_analysis::pipeline::{PipelineConfig, Report, ThrombPipeline};
use thromb_analysis_visualizer::loader::load_grid;
use thromb_analysis_visualizer::{ArtifactWriter, ColorTable, ComponentMaskWriter, error_chain};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Label bright regions of a single-channel scan and export shape statistics"
)]
struct Args {
    /// Input raster (any format the `image` crate decodes)
    input_path: PathBuf,

    /// Also write every component's bright/dark sub-mask into `components/`
    #[arg(long = "saveComponentMasks")]
    save_component_masks: bool,

    /// Directory receiving all artifacts
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// JSON file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the label colors (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Absolute tolerance for "equal to the maximum intensity" (overrides the config file)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();
    let _logger = Logger::try_with_env_or_str(if args.verbose { "debug" } else { "info" })
        .context("invalid log specification")?
        .start()
        .context("logger initialization failed")?;

    // --- 2. Pipeline Configuration ---
    let config = build_config(&args)?;
    let pipeline = ThrombPipeline::new(config).context("invalid pipeline configuration")?;

    // --- 3. Input Decoding ---
    info!("Loading file \"{}\" ...", args.input_path.display());
    let grid = load_grid(&args.input_path)
        .with_context(|| format!("cannot load \"{}\"", args.input_path.display()))?;
    info!("Loaded {}x{} grid.", grid.width(), grid.height());

    if let Err(err) = std::fs::create_dir_all(&args.output_dir) {
        error!(
            "Unable to create output directory \"{}\": {}",
            args.output_dir.display(),
            err
        );
    }

    // --- 4. Analysis ---
    let report = analyze(&pipeline, &grid, &args)?;

    // --- 5. Artifacts ---
    let colors = ColorTable::seeded(report.num_components(), pipeline.config().color_seed);
    let mut artifacts = ArtifactWriter::new(&args.output_dir);
    artifacts.write_report(&report, &colors);

    info!(
        "Done: {} components, {} artifacts written, {} skipped.",
        report.num_components(),
        artifacts.written().len(),
        artifacts.skipped().len()
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("cannot use configuration \"{}\"", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.color_seed = seed;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    Ok(config)
}

fn analyze(pipeline: &ThrombPipeline, grid: &IntensityGrid, args: &Args) -> Result<Report> {
    if !args.save_component_masks {
        return pipeline.analyze(grid).context("analysis failed");
    }

    match ComponentMaskWriter::create(&args.output_dir) {
        Ok(mut masks) => {
            let report = pipeline
                .analyze_with_sink(grid, &mut masks)
                .context("analysis failed")?;
            info!(
                "Wrote {} component masks into \"{}\" ({} failed).",
                masks.written(),
                masks.directory().display(),
                masks.failed()
            );
            Ok(report)
        }
        Err(err) => {
            error!("Component masks disabled: {}", error_chain(&err));
            pipeline.analyze(grid).context("analysis failed")
        }
    }
}
