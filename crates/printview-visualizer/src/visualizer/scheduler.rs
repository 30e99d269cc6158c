//! Parallel layer mesh scheduling
//!
//! Layer meshes are independent, so the scheduler spreads them over scoped
//! worker threads pulling from a shared counter. Results come back in
//! completion order and are re-sorted by layer index before delivery.
//! Cancellation is advisory: workers check the flag between layers.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use printview_core::MeshError;
use tracing::debug;

use super::sink::MeshBufferSink;
use super::tube_mesh::{TubeMesh, TubeMeshBuilder};
use crate::gcode::AnalyzedDocument;

/// Outcome of building one layer
#[derive(Debug, Clone)]
pub struct LayerMesh {
    pub index: usize,
    pub z: f64,
    pub result: Result<TubeMesh, MeshError>,
}

/// Builds all layer meshes of a document on worker threads
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    builder: TubeMeshBuilder,
    threads: usize,
    cancel: Arc<AtomicBool>,
}

impl RenderScheduler {
    /// Create a scheduler; `threads == 0` uses the available parallelism
    pub fn new(builder: TubeMeshBuilder, threads: usize) -> Self {
        let threads = if threads == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            threads
        };

        Self {
            builder,
            threads,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn builder(&self) -> &TubeMeshBuilder {
        &self.builder
    }

    /// Flag that stops a running batch when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Clear a previous cancellation so the scheduler can run again
    pub fn reset(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    pub fn build_all(
        &self,
        document: &AnalyzedDocument,
        thickness: f64,
    ) -> Result<Vec<LayerMesh>, MeshError> {
        self.build_all_with_progress(document, thickness, |_, _| {})
    }

    /// Build every layer, reporting `(completed, total)` after each one
    ///
    /// Per-layer failures are returned in the layer's `result`. The batch
    /// only fails as a whole when it is cancelled.
    pub fn build_all_with_progress<P>(
        &self,
        document: &AnalyzedDocument,
        thickness: f64,
        progress: P,
    ) -> Result<Vec<LayerMesh>, MeshError>
    where
        P: Fn(usize, usize) + Sync,
    {
        let layers = document.layers.as_slice();
        let total = layers.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let workers = self.threads.clamp(1, total);
        let started = Instant::now();
        debug!("Building {} layer meshes on {} workers", total, workers);

        let next = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let next = &next;
        let completed = &completed;
        let progress = &progress;
        let builder = &self.builder;
        let cancel = self.cancel.as_ref();

        let mut meshes: Vec<LayerMesh> = std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(scope.spawn(move || {
                    let mut built = Vec::new();
                    while !cancel.load(Ordering::SeqCst) {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(layer) = layers.get(index) else {
                            break;
                        };
                        built.push(LayerMesh {
                            index,
                            z: layer.z(),
                            result: builder.build(layer, thickness),
                        });
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        progress(done, total);
                    }
                    built
                }));
            }

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });

        if meshes.len() < total {
            debug!("Mesh build cancelled after {} of {} layers", meshes.len(), total);
            return Err(MeshError::Cancelled {
                completed: meshes.len(),
                total,
            });
        }

        meshes.sort_by_key(|mesh| mesh.index);
        debug!(
            "Built {} layer meshes in {:.1}ms",
            total,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(meshes)
    }
}

/// Hand built layers to a sink in layer order
///
/// Returns the number of layers uploaded.
pub fn deliver(meshes: &[LayerMesh], sink: &mut dyn MeshBufferSink) -> usize {
    let mut uploaded = 0;
    for mesh in meshes {
        match &mesh.result {
            Ok(buffers) => {
                sink.upload_layer(mesh.index, mesh.z, buffers);
                uploaded += 1;
            }
            Err(error) => sink.layer_failed(mesh.index, mesh.z, error),
        }
    }
    uploaded
}
