//! # PrintView Visualizer
//!
//! G-code layer analysis and 3D tube mesh generation for PrintView.
//! Includes the line scanner, motion state machine, layer model, tube mesh
//! builder and the interface to rendering backends.

pub mod gcode;
pub mod utils;
pub mod visualizer;

pub use gcode::{
    analyze, AnalyzedDocument, AxisLimits, GcodeAnalyzer, Kinematics, Layer, LayerProgress,
    LineScanner, MachineState, ParseDiagnostic, ScannedLine, Segment, Words,
};

pub use visualizer::{
    deliver, Bounds, CollectedLayer, LayerMesh, LayerMeshCollection, MeshBufferSink,
    RenderScheduler, TubeMesh, TubeMeshBuilder,
};

pub use utils::{FileEncoding, FileReadStats, GcodeFileReader};
