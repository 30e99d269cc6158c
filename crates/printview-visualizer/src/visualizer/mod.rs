//! 3D layer preview
//!
//! This module provides:
//! - Tube mesh generation for extrusion segments (tube_mesh)
//! - The hand-off interface to rendering backends (sink)
//! - Parallel per-layer mesh building (scheduler)
//! - Bounding boxes for framing the model (bounds)

pub mod bounds;
pub mod scheduler;
pub mod sink;
pub mod tube_mesh;

pub use bounds::Bounds;
pub use scheduler::{deliver, LayerMesh, RenderScheduler};
pub use sink::{CollectedLayer, LayerMeshCollection, MeshBufferSink};
pub use tube_mesh::{TubeMesh, TubeMeshBuilder};
