//! Error handling for PrintView
//!
//! Provides error types for the two processing stages:
//! - G-code errors (reading and interpreting programs)
//! - Mesh errors (building per-layer tube geometry)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-code error type
///
/// The interpreter itself is permissive and never fails a parse; these
/// errors cover getting the program text in the first place.
#[derive(Error, Debug, Clone)]
pub enum GcodeError {
    /// File could not be read or decoded
    #[error("File error: {reason}")]
    FileError {
        /// The reason for the file error.
        reason: String,
    },
}

/// Mesh error type
///
/// Raised per layer by the tube mesh builder, or per batch by the
/// render scheduler. A failed layer never prevents other layers from
/// being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The layer needs more vertices than a `u16` index buffer can address
    #[error("Layer needs {required} vertices, limit is {limit}")]
    GeometryOverflow {
        /// Vertices the layer would need.
        required: usize,
        /// Highest addressable vertex count.
        limit: usize,
    },

    /// Circle subdivision count outside the buildable range
    #[error("Invalid circle subdivision count {subdivisions} (allowed {minimum}..={maximum})")]
    InvalidSubdivisions {
        /// Requested subdivision count.
        subdivisions: usize,
        /// Smallest accepted count.
        minimum: usize,
        /// Largest count whose circles fit in one layer mesh.
        maximum: usize,
    },

    /// The caller cancelled the batch before every layer was built
    #[error("Mesh build cancelled after {completed} of {total} layers")]
    Cancelled {
        /// Layers finished before cancellation was observed.
        completed: usize,
        /// Layers requested.
        total: usize,
    },
}

impl MeshError {
    /// Check if this is a vertex overflow
    pub fn is_overflow(&self) -> bool {
        matches!(self, MeshError::GeometryOverflow { .. })
    }
}

/// Main error type for PrintView
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Mesh error
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a mesh error
    pub fn is_mesh_error(&self) -> bool {
        matches!(self, Error::Mesh(_))
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
