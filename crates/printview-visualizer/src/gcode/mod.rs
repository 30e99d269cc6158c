//! G-code analysis
//!
//! This module provides:
//! - Line scanning with source byte offsets
//! - Parameter word parsing
//! - The motion state machine
//! - The per-layer document model

pub mod document;
pub mod interpreter;
pub mod scanner;
pub mod state;
pub mod words;

pub use document::{AnalyzedDocument, Layer, LayerProgress, ParseDiagnostic, Segment};
pub use interpreter::{analyze, GcodeAnalyzer};
pub use scanner::{LineScanner, Lines, ScannedLine};
pub use state::{AxisLimits, Kinematics, MachineState};
pub use words::{parse_number, Words};
