//! Layer model produced by the G-code analyzer

use serde::Serialize;

use crate::visualizer::bounds::Bounds;

/// A 2D extrusion segment on a layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// True if `next` starts exactly where this segment ends
    pub fn continues_into(&self, next: &Segment) -> bool {
        self.x1 == next.x0 && self.y1 == next.y0
    }
}

/// Extrusion segments sharing one Z height, in emission order
///
/// Every segment is paired with the byte offset of the G-code line that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    z: f64,
    segments: Vec<Segment>,
    source_offsets: Vec<usize>,
}

impl Layer {
    /// Create an empty layer at height `z`
    pub fn new(z: f64) -> Self {
        Self {
            z,
            segments: Vec::new(),
            source_offsets: Vec::new(),
        }
    }

    /// Build a layer from `(segment, source offset)` pairs
    pub fn from_segments(z: f64, segments: impl IntoIterator<Item = (Segment, usize)>) -> Self {
        let mut layer = Self::new(z);
        for (segment, offset) in segments {
            layer.push_segment(segment, offset);
        }
        layer
    }

    pub fn push_segment(&mut self, segment: Segment, source_offset: usize) {
        self.segments.push(segment);
        self.source_offsets.push(source_offset);
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn source_offsets(&self) -> &[usize] {
        &self.source_offsets
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of separate extrusion runs
    ///
    /// A run starts at the first segment and at every segment that does not
    /// begin where the previous one ended.
    pub fn separate_runs(&self) -> usize {
        if self.segments.is_empty() {
            return 0;
        }
        1 + self
            .segments
            .windows(2)
            .filter(|pair| !pair[0].continues_into(&pair[1]))
            .count()
    }
}

/// A numeric word that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    /// Byte offset of the line holding the token
    pub offset: usize,
    /// The offending token as written
    pub token: String,
}

/// Print state of a layer relative to a file position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerProgress {
    Printed,
    Printing,
    Pending,
}

/// Result of analyzing a complete G-code program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedDocument {
    pub layers: Vec<Layer>,
    /// Nozzle diameter in mm
    pub nozzle_diameter: f64,
    /// Seconds, from dwell commands only
    pub estimated_time: f64,
    /// Malformed numeric words met while parsing
    pub diagnostics: Vec<ParseDiagnostic>,
    /// Number of scanned lines
    pub line_count: usize,
}

impl AnalyzedDocument {
    pub fn new(nozzle_diameter: f64) -> Self {
        Self {
            layers: Vec::new(),
            nozzle_diameter,
            estimated_time: 0.0,
            diagnostics: Vec::new(),
            line_count: 0,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Index of the layer being printed once `offset` bytes have been sent
    ///
    /// This is the layer holding the latest segment whose source line starts
    /// at or before `offset`. Layers without segments are never current.
    pub fn layer_at_offset(&self, offset: usize) -> Option<usize> {
        self.layers
            .iter()
            .enumerate()
            .filter_map(|(index, layer)| layer.source_offsets().first().map(|&o| (index, o)))
            .take_while(|&(_, first)| first <= offset)
            .last()
            .map(|(index, _)| index)
    }

    /// Classify every layer against a print position
    pub fn layer_progress(&self, offset: usize) -> Vec<LayerProgress> {
        let current = self.layer_at_offset(offset);
        (0..self.layers.len())
            .map(|index| match current {
                Some(c) if index < c => LayerProgress::Printed,
                Some(c) if index == c => LayerProgress::Printing,
                _ => LayerProgress::Pending,
            })
            .collect()
    }

    /// Bounding box of all extrusion, `None` if nothing was extruded
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = Bounds::new();
        for layer in &self.layers {
            for segment in layer.segments() {
                bounds.update(segment.x0, segment.y0, layer.z());
                bounds.update(segment.x1, segment.y1, layer.z());
            }
        }
        bounds.is_valid().then_some(bounds)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
