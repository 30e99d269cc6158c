//! Shared constants for parsing and mesh generation.

/// Index value that ends one primitive and starts the next in a `u16`
/// index buffer.
pub const PRIMITIVE_RESTART: u16 = 0xFFFF;

/// Highest number of vertices a single layer mesh may address.
///
/// Indices run from `0` to `MAX_LAYER_VERTICES - 1`; `PRIMITIVE_RESTART`
/// is never a vertex index.
pub const MAX_LAYER_VERTICES: usize = PRIMITIVE_RESTART as usize - 1;

/// Nozzle diameter assumed until a slicer directive says otherwise (mm).
pub const DEFAULT_NOZZLE_DIAMETER: f64 = 0.4;

/// Number of perimeter vertices on each tube cross-section circle.
pub const DEFAULT_CIRCLE_SUBDIVISIONS: usize = 10;

/// Fewest perimeter vertices that still describe a closed tube.
pub const MIN_CIRCLE_SUBDIVISIONS: usize = 3;

/// Most perimeter vertices per circle; one segment's two circles must fit in
/// a layer mesh.
pub const MAX_CIRCLE_SUBDIVISIONS: usize = MAX_LAYER_VERTICES / 2 - 1;

/// Millimetres per scene unit used by the preview renderer.
pub const MM_PER_SCENE_UNIT: f64 = 200.0;

/// Slicer comment announcing the nozzle diameter (Slic3r family).
pub const NOZZLE_DIAMETER_DIRECTIVE: &str = "; nozzle_diameter = ";
