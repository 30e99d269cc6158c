//! G-code analyzer
//!
//! Folds the scanned lines of a document through one exclusively owned
//! `MachineState` and produces the `AnalyzedDocument`. Every call works on
//! its own state, so independent documents can be analyzed on separate
//! threads.

use tracing::{debug, warn};

use super::document::AnalyzedDocument;
use super::scanner::LineScanner;
use super::state::MachineState;

/// Line-at-a-time analyzer for one G-code document
#[derive(Debug, Clone)]
pub struct GcodeAnalyzer {
    state: MachineState,
    document: AnalyzedDocument,
}

impl Default for GcodeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl GcodeAnalyzer {
    pub fn new() -> Self {
        Self::from_state(MachineState::new())
    }

    /// Start with a different nozzle diameter than the built-in default
    pub fn with_nozzle_diameter(nozzle_diameter: f64) -> Self {
        Self::from_state(MachineState::with_nozzle_diameter(nozzle_diameter))
    }

    fn from_state(state: MachineState) -> Self {
        let document = AnalyzedDocument::new(state.nozzle_diameter);
        Self { state, document }
    }

    /// Feed one line and its byte offset
    pub fn process_line(&mut self, line: &str, byte_offset: usize) {
        self.document.line_count += 1;
        self.state.process_line(line, byte_offset, &mut self.document);
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn document(&self) -> &AnalyzedDocument {
        &self.document
    }

    /// Feed a complete document
    pub fn analyze(self, text: &str) -> AnalyzedDocument {
        debug!("Starting G-code analysis, input size: {} bytes", text.len());

        LineScanner::new(text)
            .lines()
            .fold(self, |mut analyzer, line| {
                analyzer.process_line(line.text, line.offset);
                analyzer
            })
            .finish()
    }

    /// Consume the analyzer and hand out the document
    pub fn finish(self) -> AnalyzedDocument {
        let document = self.document;

        debug!(
            "Analysis complete: lines={}, layers={}, segments={}, nozzle={}, dwell={:.1}s",
            document.line_count,
            document.layers.len(),
            document.segment_count(),
            document.nozzle_diameter,
            document.estimated_time
        );
        if !document.diagnostics.is_empty() {
            warn!(
                "{} malformed numeric words read as NaN (first at offset {})",
                document.diagnostics.len(),
                document.diagnostics[0].offset
            );
        }

        document
    }
}

/// Analyze a complete G-code document with default settings
pub fn analyze(text: &str) -> AnalyzedDocument {
    GcodeAnalyzer::new().analyze(text)
}
