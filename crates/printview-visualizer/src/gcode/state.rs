//! Machine state and the per-line motion state machine
//!
//! `MachineState` tracks the tool and extruder position plus the positioning
//! modes, and turns extruding moves into layer segments. Kinematic settings
//! (feedrates, accelerations, jerk) are tracked so a time estimator can use
//! them later; they never influence segment emission.

use printview_core::constants::{DEFAULT_NOZZLE_DIAMETER, NOZZLE_DIAMETER_DIRECTIVE};
use serde::Serialize;
use tracing::{debug, trace};

use super::document::{AnalyzedDocument, Layer, ParseDiagnostic, Segment};
use super::words::{parse_number, Words};

/// Per-axis values for X, Y, Z and E
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisLimits {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

impl AxisLimits {
    pub const fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    fn apply(&mut self, words: &Words) {
        if let Some(x) = words.x {
            self.x = x;
        }
        if let Some(y) = words.y {
            self.y = y;
        }
        if let Some(z) = words.z {
            self.z = z;
        }
        if let Some(e) = words.e {
            self.e = e;
        }
    }
}

/// Motion parameters announced by the program
///
/// Defaults follow common Marlin firmware defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kinematics {
    /// Last commanded feedrate (mm/min)
    pub feedrate: f64,
    /// Maximum feedrate per axis (mm/s), M203
    pub max_feedrate: AxisLimits,
    /// Maximum acceleration per axis (mm/s²), M201
    pub max_acceleration: AxisLimits,
    /// Printing acceleration (mm/s²), M204 P
    pub print_acceleration: f64,
    /// Retract acceleration (mm/s²), M204 R
    pub retract_acceleration: f64,
    /// Travel acceleration (mm/s²), M204 T
    pub travel_acceleration: f64,
    /// XY jerk (mm/s), M205 X/Y
    pub xy_jerk: f64,
    /// Z jerk (mm/s), M205 Z
    pub z_jerk: f64,
    /// E jerk (mm/s), M205 E
    pub e_jerk: f64,
    /// Minimum printing feedrate (mm/s), M205 S
    pub min_feedrate: f64,
    /// Minimum travel feedrate (mm/s), M205 T
    pub min_travel_feedrate: f64,
    /// Extrusion multiplier, M221 S (percent / 100)
    pub extrude_factor: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            feedrate: 0.0,
            max_feedrate: AxisLimits::new(300.0, 300.0, 5.0, 25.0),
            max_acceleration: AxisLimits::new(3000.0, 3000.0, 100.0, 10000.0),
            print_acceleration: 3000.0,
            retract_acceleration: 3000.0,
            travel_acceleration: 3000.0,
            xy_jerk: 10.0,
            z_jerk: 0.3,
            e_jerk: 5.0,
            min_feedrate: 0.0,
            min_travel_feedrate: 0.0,
            extrude_factor: 1.0,
        }
    }
}

/// Interpreter state threaded through a single parse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
    /// Z of the last layer that received extrusion; `None` before the first
    pub last_print_z: Option<f64>,
    /// G91 active
    pub relative_xyz: bool,
    /// M83 active
    pub relative_e: bool,
    pub nozzle_diameter: f64,
    pub kinematics: Kinematics,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::with_nozzle_diameter(DEFAULT_NOZZLE_DIAMETER)
    }
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nozzle_diameter(nozzle_diameter: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            e: 0.0,
            last_print_z: None,
            relative_xyz: false,
            relative_e: false,
            nozzle_diameter,
            kinematics: Kinematics::default(),
        }
    }

    /// Interpret one source line
    ///
    /// `byte_offset` is the position of the line in the source and is
    /// attached to any segment the line produces. Unknown commands are
    /// ignored; malformed numbers read as NaN and are reported in
    /// `document.diagnostics`.
    pub fn process_line(&mut self, line: &str, byte_offset: usize, document: &mut AnalyzedDocument) {
        // Must be checked before comments are stripped
        if let Some(value) = line.strip_prefix(NOZZLE_DIAMETER_DIRECTIVE) {
            self.nozzle_diameter = parse_number(value);
            document.nozzle_diameter = self.nozzle_diameter;
            if self.nozzle_diameter.is_nan() {
                debug!("Malformed nozzle diameter '{}' at offset {}", value.trim(), byte_offset);
                document.diagnostics.push(ParseDiagnostic {
                    offset: byte_offset,
                    token: value.trim().to_string(),
                });
            } else {
                debug!("Nozzle diameter set to {} by slicer", self.nozzle_diameter);
            }
        }

        let code = line.find(';').map_or(line, |sep| &line[..sep]).trim();
        let mut tokens = code.split_whitespace();
        let Some(command) = tokens.next() else {
            return;
        };

        match command.to_ascii_uppercase().as_str() {
            "G0" | "G00" | "G1" | "G01" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.linear_move(&words, byte_offset, document);
            }
            "G4" | "G04" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.dwell(&words, document);
            }
            "G90" => self.relative_xyz = false,
            "G91" => self.relative_xyz = true,
            "G92" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.set_position(&words);
            }
            "M82" => self.relative_e = false,
            "M83" => self.relative_e = true,
            "M201" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.kinematics.max_acceleration.apply(&words);
            }
            "M203" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.kinematics.max_feedrate.apply(&words);
            }
            "M204" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.set_accelerations(&words);
            }
            "M205" => {
                let words = Self::read_words(tokens, byte_offset, document);
                self.set_advanced(&words);
            }
            "M221" => {
                let words = Self::read_words(tokens, byte_offset, document);
                if let Some(percent) = words.s {
                    self.kinematics.extrude_factor = percent / 100.0;
                }
            }
            other => trace!("Ignoring command {} at offset {}", other, byte_offset),
        }
    }

    fn read_words<'a>(
        tokens: impl Iterator<Item = &'a str>,
        byte_offset: usize,
        document: &mut AnalyzedDocument,
    ) -> Words {
        let words = Words::parse(tokens);
        for token in &words.malformed {
            debug!("Malformed number in '{}' at offset {}", token, byte_offset);
            document.diagnostics.push(ParseDiagnostic {
                offset: byte_offset,
                token: token.clone(),
            });
        }
        words
    }

    fn linear_move(&mut self, words: &Words, byte_offset: usize, document: &mut AnalyzedDocument) {
        let origin = |current: f64| if self.relative_xyz { current } else { 0.0 };
        let new_x = words.x.map_or(self.x, |v| origin(self.x) + v);
        let new_y = words.y.map_or(self.y, |v| origin(self.y) + v);
        let new_z = words.z.map_or(self.z, |v| origin(self.z) + v);

        let mut extruding = false;
        if let Some(e) = words.e {
            if self.relative_e {
                self.e += e;
                extruding = e > 0.0;
            } else {
                extruding = e > self.e;
                self.e = e;
            }
        }

        if let Some(feedrate) = words.f {
            self.kinematics.feedrate = feedrate;
        }

        if extruding {
            if self.last_print_z != Some(new_z) {
                trace!("New layer at z={} (offset {})", new_z, byte_offset);
                document.layers.push(Layer::new(new_z));
                self.last_print_z = Some(new_z);
            }

            if self.x != new_x || self.y != new_y {
                if let Some(layer) = document.layers.last_mut() {
                    layer.push_segment(Segment::new(self.x, self.y, new_x, new_y), byte_offset);
                }
            }
        }

        self.x = new_x;
        self.y = new_y;
        self.z = new_z;
    }

    fn dwell(&mut self, words: &Words, document: &mut AnalyzedDocument) {
        let seconds = match (words.p, words.s) {
            (Some(millis), _) => millis / 1000.0,
            (None, Some(seconds)) => seconds,
            (None, None) => 0.0,
        };
        document.estimated_time += seconds;
    }

    fn set_position(&mut self, words: &Words) {
        if let Some(x) = words.x {
            self.x = x;
        }
        if let Some(y) = words.y {
            self.y = y;
        }
        if let Some(z) = words.z {
            self.z = z;
        }
        if let Some(e) = words.e {
            self.e = e;
        }
    }

    fn set_accelerations(&mut self, words: &Words) {
        // Legacy S sets print and travel together
        if let Some(s) = words.s {
            self.kinematics.print_acceleration = s;
            self.kinematics.travel_acceleration = s;
        }
        if let Some(p) = words.p {
            self.kinematics.print_acceleration = p;
        }
        if let Some(r) = words.r {
            self.kinematics.retract_acceleration = r;
        }
        if let Some(t) = words.t {
            self.kinematics.travel_acceleration = t;
        }
    }

    fn set_advanced(&mut self, words: &Words) {
        if let Some(jerk) = words.x.or(words.y) {
            self.kinematics.xy_jerk = jerk;
        }
        if let Some(jerk) = words.z {
            self.kinematics.z_jerk = jerk;
        }
        if let Some(jerk) = words.e {
            self.kinematics.e_jerk = jerk;
        }
        if let Some(feedrate) = words.s {
            self.kinematics.min_feedrate = feedrate;
        }
        if let Some(feedrate) = words.t {
            self.kinematics.min_travel_feedrate = feedrate;
        }
    }
}
