use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use printview::{init_logging, preview_file, LayerProgress, Preview, ViewerConfig};

/// Layer-by-layer preview of FDM printer G-code
#[derive(Parser, Debug)]
#[command(name = "printview", version = printview::VERSION)]
struct Args {
    /// G-code file to analyze
    file: PathBuf,

    /// Configuration file (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mesh build threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Perimeter vertices per tube cross-section
    #[arg(long)]
    subdivisions: Option<usize>,

    /// Tube diameter in mm, overrides the nozzle diameter
    #[arg(long)]
    thickness: Option<f64>,

    /// Bytes already sent to the printer, to report print progress
    #[arg(long)]
    progress_offset: Option<usize>,

    /// Write the analyzed document as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

impl Args {
    fn apply_to(&self, config: &mut ViewerConfig) {
        if let Some(threads) = self.threads {
            config.workers.threads = threads;
        }
        if let Some(subdivisions) = self.subdivisions {
            config.render.circle_subdivisions = subdivisions;
        }
        if self.thickness.is_some() {
            config.render.thickness = self.thickness;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;
    tracing::debug!("printview {} built {}", printview::VERSION, printview::BUILD_DATE);

    let mut config = ViewerConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let preview = preview_file(&args.file, &config)
        .with_context(|| format!("Failed to preview {}", args.file.display()))?;

    print_summary(&preview, config.render.model_scale);

    if let Some(offset) = args.progress_offset {
        print_progress(&preview, offset);
    }

    if let Some(path) = &args.json {
        let json = preview.document.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote report to {}", path.display());
    }

    Ok(())
}

fn print_summary(preview: &Preview, model_scale: f64) {
    let document = &preview.document;
    println!("Lines:          {}", document.line_count);
    println!("Layers:         {}", document.layers.len());
    println!("Segments:       {}", document.segment_count());
    println!("Nozzle:         {} mm", document.nozzle_diameter);
    println!("Tube thickness: {} mm", preview.thickness);
    println!("Dwell time:     {:.1} s", document.estimated_time);

    if let Some(bounds) = document.bounds() {
        let (w, d, h) = bounds.size();
        println!("Extents:        {:.2} x {:.2} x {:.2} mm", w, d, h);
        println!(
            "Scene size:     {:.3} x {:.3} x {:.3} units",
            w * model_scale,
            h * model_scale,
            d * model_scale
        );
    }

    println!(
        "Meshes:         {} layers, {} vertices, {} bytes",
        preview.meshes.len(),
        preview.meshes.total_vertices(),
        preview.meshes.total_bytes()
    );
    for (index, error) in preview.meshes.failures() {
        println!("  layer {} skipped: {}", index, error);
    }

    if !document.diagnostics.is_empty() {
        println!("Malformed numbers: {}", document.diagnostics.len());
    }
}

fn print_progress(preview: &Preview, offset: usize) {
    let document = &preview.document;
    let progress = document.layer_progress(offset);
    let printed = progress
        .iter()
        .filter(|p| **p == LayerProgress::Printed)
        .count();

    match document.layer_at_offset(offset) {
        Some(index) => println!(
            "Printing layer {} of {} (z={}), {} done",
            index + 1,
            progress.len(),
            document.layers[index].z(),
            printed
        ),
        None => println!("Print not started at offset {}", offset),
    }
}
