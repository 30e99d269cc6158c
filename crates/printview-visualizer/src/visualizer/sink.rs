//! Mesh buffer sinks
//!
//! A sink is the hand-off point to a rendering backend. The backend uploads
//! `vertices`/`normals` as vertex attributes and draws `fan_indices` as
//! triangle fans and `strip_indices` as triangle strips, both with `u16`
//! indices and `0xFFFF` primitive restart.

use printview_core::MeshError;
use tracing::warn;

use super::tube_mesh::TubeMesh;

/// Receiver of finished layer meshes, called in layer order
pub trait MeshBufferSink {
    /// A layer mesh is ready for upload
    fn upload_layer(&mut self, layer_index: usize, z: f64, mesh: &TubeMesh);

    /// A layer could not be built; the remaining layers are still delivered
    fn layer_failed(&mut self, layer_index: usize, z: f64, error: &MeshError) {
        warn!("Skipping layer {} at z={}: {}", layer_index, z, error);
    }
}

/// A mesh kept by `LayerMeshCollection`
#[derive(Debug, Clone)]
pub struct CollectedLayer {
    pub index: usize,
    pub z: f64,
    pub mesh: TubeMesh,
}

/// In-memory sink that keeps every uploaded mesh
#[derive(Debug, Clone, Default)]
pub struct LayerMeshCollection {
    layers: Vec<CollectedLayer>,
    failures: Vec<(usize, MeshError)>,
}

impl LayerMeshCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[CollectedLayer] {
        &self.layers
    }

    pub fn failures(&self) -> &[(usize, MeshError)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn total_vertices(&self) -> usize {
        self.layers.iter().map(|l| l.mesh.vertex_count()).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.layers.iter().map(|l| l.mesh.byte_size()).sum()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.failures.clear();
    }
}

impl MeshBufferSink for LayerMeshCollection {
    fn upload_layer(&mut self, layer_index: usize, z: f64, mesh: &TubeMesh) {
        self.layers.push(CollectedLayer {
            index: layer_index,
            z,
            mesh: mesh.clone(),
        });
    }

    fn layer_failed(&mut self, layer_index: usize, z: f64, error: &MeshError) {
        warn!("Layer {} at z={} failed: {}", layer_index, z, error);
        self.failures.push((layer_index, error.clone()));
    }
}
