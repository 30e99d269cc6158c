//! # PrintView
//!
//! Layer-by-layer 3D preview of FDM printer G-code:
//! - Slicer output is analyzed into per-layer extrusion segments
//! - Every layer becomes a tube mesh ready for GPU upload
//! - Print progress maps a byte offset to the layer being printed
//!
//! ## Architecture
//!
//! PrintView is organized as a workspace with multiple crates:
//!
//! 1. **printview-core** - Error types and shared constants
//! 2. **printview-visualizer** - G-code analysis and tube mesh generation
//! 3. **printview-settings** - Viewer configuration
//! 4. **printview** - Pipeline glue and the command-line binary

use std::path::Path;

use printview_core::GcodeError;
use tracing::{debug, info, trace};

pub use printview_core::{constants, Error, MeshError, Result};
pub use printview_settings::{SettingsError, ViewerConfig};
pub use printview_visualizer::{
    analyze, deliver, AnalyzedDocument, GcodeAnalyzer, GcodeFileReader, LayerMesh,
    LayerMeshCollection, LayerProgress, MeshBufferSink, RenderScheduler, TubeMesh,
    TubeMeshBuilder,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// An analyzed document together with its uploaded layer meshes
#[derive(Debug, Clone)]
pub struct Preview {
    pub document: AnalyzedDocument,
    pub meshes: LayerMeshCollection,
    /// Tube diameter the meshes were built with
    pub thickness: f64,
}

/// Analyze `text` and build every layer mesh as configured
///
/// Layers that cannot be meshed are recorded in `meshes.failures()`; only
/// an invalid configuration or a cancelled batch fails the whole preview.
pub fn preview(text: &str, config: &ViewerConfig) -> Result<Preview> {
    let document =
        GcodeAnalyzer::with_nozzle_diameter(config.parse.default_nozzle_diameter).analyze(text);

    let builder = TubeMeshBuilder::new(config.render.circle_subdivisions)?;
    let thickness = config.render.thickness_for(document.nozzle_diameter);
    let scheduler = RenderScheduler::new(builder, config.workers.threads);
    debug!(
        "Meshing {} layers: subdivisions={}, thickness={}, threads={}",
        document.layers.len(),
        builder.subdivisions(),
        thickness,
        scheduler.threads()
    );

    let built = scheduler.build_all_with_progress(&document, thickness, |done, total| {
        trace!("Meshed {}/{} layers", done, total);
    })?;

    let mut meshes = LayerMeshCollection::new();
    let uploaded = deliver(&built, &mut meshes);
    info!(
        "Preview ready: {} of {} layers, {} vertices",
        uploaded,
        built.len(),
        meshes.total_vertices()
    );

    Ok(Preview {
        document,
        meshes,
        thickness,
    })
}

/// Load a G-code file and build its preview
pub fn preview_file(path: &Path, config: &ViewerConfig) -> Result<Preview> {
    let reader = GcodeFileReader::new(path).map_err(file_error)?;
    let (text, stats) = reader.read_all().map_err(file_error)?;
    debug!("Loaded {} bytes in {}ms", stats.bytes_read, stats.read_time_ms);

    preview(&text, config)
}

/// I/O failures keep their source; anything else is a G-code file error
fn file_error(err: anyhow::Error) -> Error {
    match err.downcast::<std::io::Error>() {
        Ok(io) => Error::Io(io),
        Err(err) => GcodeError::FileError {
            reason: err.to_string(),
        }
        .into(),
    }
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatted output on stderr, so stdout stays free for reports
/// - RUST_LOG environment variable support (defaults to `info`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_file_error_keeps_io_source() {
        let err = Err::<(), _>(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ))
        .context("Failed to read job.gcode")
        .unwrap_err();
        match file_error(err) {
            Error::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("expected Error::Io, got {:?}", other),
        }

        let err = anyhow::anyhow!("Path is not a file: /tmp");
        assert!(matches!(
            file_error(err),
            Error::Gcode(GcodeError::FileError { reason }) if reason == "Path is not a file: /tmp"
        ));
    }
}
