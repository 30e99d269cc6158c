//! # Tube Mesh Builder
//!
//! Turns the 2D extrusion segments of one layer into a 3D tube mesh. Each
//! segment becomes a cylinder of the extrusion width: a capped disc at both
//! ends (triangle fans) joined by a ring of triangles (triangle strip).
//! Where a segment starts exactly at the previous segment's end, an extra
//! ring joins the two so the extrusion looks continuous.
//!
//! Coordinates map G-code `(x, y)` on layer height `z` to the render frame
//! `(x, z, -y)`: Y is up and the G-code Y axis points into the screen.
//!
//! Index buffers are `u16` with `PRIMITIVE_RESTART` separating primitives,
//! so a layer can address at most `MAX_LAYER_VERTICES` vertices. All
//! buffers are sized exactly before generation starts.

use std::f64::consts::TAU;

use glam::DVec3;
use printview_core::constants::{
    DEFAULT_CIRCLE_SUBDIVISIONS, MAX_CIRCLE_SUBDIVISIONS, MAX_LAYER_VERTICES,
    MIN_CIRCLE_SUBDIVISIONS, PRIMITIVE_RESTART,
};
use printview_core::MeshError;
use tracing::trace;

use crate::gcode::Layer;

/// Renderable buffers for one layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    /// Vertex positions, xyz triples
    pub vertices: Vec<f32>,
    /// Vertex normals, xyz triples, one per vertex
    pub normals: Vec<f32>,
    /// Triangle fan indices (end caps)
    pub fan_indices: Vec<u16>,
    /// Triangle strip indices (tube walls)
    pub strip_indices: Vec<u16>,
}

impl TubeMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Each triangle fan as its own index list
    pub fn fans(&self) -> impl Iterator<Item = &[u16]> + '_ {
        split_primitives(&self.fan_indices)
    }

    /// Each triangle strip as its own index list
    pub fn strips(&self) -> impl Iterator<Item = &[u16]> + '_ {
        split_primitives(&self.strip_indices)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn fan_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fan_indices)
    }

    pub fn strip_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.strip_indices)
    }

    /// Total size of all buffers in bytes
    pub fn byte_size(&self) -> usize {
        self.vertex_bytes().len()
            + self.normal_bytes().len()
            + self.fan_index_bytes().len()
            + self.strip_index_bytes().len()
    }
}

fn split_primitives(indices: &[u16]) -> impl Iterator<Item = &[u16]> + '_ {
    indices
        .split(|&index| index == PRIMITIVE_RESTART)
        .filter(|primitive| !primitive.is_empty())
}

/// Builds tube meshes with a fixed circle resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TubeMeshBuilder {
    subdivisions: usize,
}

impl Default for TubeMeshBuilder {
    fn default() -> Self {
        Self {
            subdivisions: DEFAULT_CIRCLE_SUBDIVISIONS,
        }
    }
}

impl TubeMeshBuilder {
    /// Create a builder with `subdivisions` perimeter vertices per circle
    ///
    /// The count must leave room for at least one segment per layer, so it
    /// is capped at `MAX_CIRCLE_SUBDIVISIONS`.
    pub fn new(subdivisions: usize) -> Result<Self, MeshError> {
        if !(MIN_CIRCLE_SUBDIVISIONS..=MAX_CIRCLE_SUBDIVISIONS).contains(&subdivisions) {
            return Err(MeshError::InvalidSubdivisions {
                subdivisions,
                minimum: MIN_CIRCLE_SUBDIVISIONS,
                maximum: MAX_CIRCLE_SUBDIVISIONS,
            });
        }
        Ok(Self { subdivisions })
    }

    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Vertices needed for `segments` segments, `None` on arithmetic overflow
    pub fn vertex_count(&self, segments: usize) -> Option<usize> {
        self.circle_span(1)
            .and_then(|per_circle| per_circle.checked_mul(2))
            .and_then(|per_segment| per_segment.checked_mul(segments))
    }

    /// Fan indices: per circle a center, N perimeter, one closing index and a restart
    pub fn fan_index_count(&self, segments: usize) -> Option<usize> {
        self.circle_span(3)
            .and_then(|per_circle| per_circle.checked_mul(2))
            .and_then(|per_segment| per_segment.checked_mul(segments))
    }

    /// Strip indices: one ring per segment plus one per continuous joint
    ///
    /// `None` on arithmetic overflow or if `separate_runs` exceeds `segments`.
    pub fn strip_index_count(&self, segments: usize, separate_runs: usize) -> Option<usize> {
        let rings = segments.checked_mul(2)?.checked_sub(separate_runs)?;
        rings.checked_mul(self.ring_stride()?)
    }

    /// Slots reserved for each connecting ring
    fn ring_stride(&self) -> Option<usize> {
        self.circle_span(3)?.checked_mul(2)
    }

    /// `N + extra`, checked
    fn circle_span(&self, extra: usize) -> Option<usize> {
        self.subdivisions.checked_add(extra)
    }

    /// Build the tube mesh for one layer
    ///
    /// `thickness` is the tube diameter. Fails with
    /// `MeshError::GeometryOverflow` when the layer needs more vertices than
    /// `u16` indices can address; nothing is generated in that case.
    pub fn build(&self, layer: &Layer, thickness: f64) -> Result<TubeMesh, MeshError> {
        let segments = layer.segments();
        if segments.is_empty() {
            return Ok(TubeMesh::default());
        }

        let required = self.vertex_count(segments.len()).unwrap_or(usize::MAX);
        if required > MAX_LAYER_VERTICES {
            return Err(MeshError::GeometryOverflow {
                required,
                limit: MAX_LAYER_VERTICES,
            });
        }

        // Cannot fail once the vertex count fits
        let separate_runs = layer.separate_runs();
        let overflow = MeshError::GeometryOverflow {
            required,
            limit: MAX_LAYER_VERTICES,
        };
        let fan_len = self.fan_index_count(segments.len()).ok_or(overflow.clone())?;
        let strip_len = self
            .strip_index_count(segments.len(), separate_runs)
            .ok_or(overflow.clone())?;
        let ring_stride = self.ring_stride().ok_or(overflow)?;

        let mut writer = MeshWriter::new(
            self.subdivisions,
            thickness / 2.0,
            required,
            fan_len,
            strip_len,
            ring_stride,
        );

        let z = layer.z();
        let mut previous_end: Option<u16> = None;

        for (i, segment) in segments.iter().enumerate() {
            let start = DVec3::new(segment.x0, z, -segment.y0);
            let end = DVec3::new(segment.x1, z, -segment.y1);
            let direction = (end - start).try_normalize().unwrap_or(DVec3::X);
            let basis = direction.any_orthonormal_pair();

            let start_ring = writer.circle(start, -direction, basis, 1.0);
            if let Some(previous) = previous_end {
                if segments[i - 1].continues_into(segment) {
                    writer.connect(previous, start_ring);
                }
            }

            let end_ring = writer.circle(end, direction, basis, -1.0);
            writer.connect(start_ring, end_ring);
            previous_end = Some(end_ring);
        }

        let mesh = writer.finish();
        trace!(
            "Layer z={}: {} segments, {} runs, {} vertices",
            z,
            segments.len(),
            separate_runs,
            mesh.vertex_count()
        );
        Ok(mesh)
    }
}

/// Appends geometry into exactly-sized buffers
struct MeshWriter {
    subdivisions: usize,
    radius: f64,
    ring_stride: usize,
    fan_len: usize,
    strip_cursor: usize,
    mesh: TubeMesh,
}

impl MeshWriter {
    fn new(
        subdivisions: usize,
        radius: f64,
        vertex_count: usize,
        fan_len: usize,
        strip_len: usize,
        ring_stride: usize,
    ) -> Self {
        Self {
            subdivisions,
            radius,
            ring_stride,
            fan_len,
            strip_cursor: 0,
            mesh: TubeMesh {
                vertices: Vec::with_capacity(vertex_count * 3),
                normals: Vec::with_capacity(vertex_count * 3),
                fan_indices: Vec::with_capacity(fan_len),
                // Slots a ring does not use stay restart markers
                strip_indices: vec![PRIMITIVE_RESTART; strip_len],
            },
        }
    }

    fn next_index(&self) -> u16 {
        (self.mesh.vertices.len() / 3) as u16
    }

    fn push_vertex(&mut self, position: DVec3, normal: DVec3) {
        let position = position.as_vec3();
        let normal = normal.as_vec3();
        self.mesh
            .vertices
            .extend_from_slice(&[position.x, position.y, position.z]);
        self.mesh
            .normals
            .extend_from_slice(&[normal.x, normal.y, normal.z]);
    }

    /// Emit a capped circle and return the index of its first perimeter vertex
    ///
    /// `sign` sets the winding: start caps go one way, end caps the other,
    /// so both face outwards along `facing`.
    fn circle(&mut self, center: DVec3, facing: DVec3, (u, v): (DVec3, DVec3), sign: f64) -> u16 {
        let center_index = self.next_index();
        self.push_vertex(center, facing);
        self.mesh.fan_indices.push(center_index);

        for k in 0..self.subdivisions {
            let angle = sign * TAU * k as f64 / self.subdivisions as f64;
            let radial = u * angle.cos() + v * angle.sin();
            let index = self.next_index();
            self.push_vertex(center + radial * self.radius, radial);
            self.mesh.fan_indices.push(index);
        }

        let first_perimeter = center_index + 1;
        self.mesh.fan_indices.push(first_perimeter);
        self.mesh.fan_indices.push(PRIMITIVE_RESTART);
        first_perimeter
    }

    /// Join two circles of opposite winding with a triangle strip
    ///
    /// Perimeter vertex `k` of `prev` sits at the same angle as vertex
    /// `(N - k) % N` of `next`, so pairing them keeps the strip untwisted.
    /// The last pair repeats the first to close the ring.
    fn connect(&mut self, prev: u16, next: u16) {
        let n = self.subdivisions;
        let strip = &mut self.mesh.strip_indices[self.strip_cursor..self.strip_cursor + self.ring_stride];

        let mut slot = 0;
        for i in 0..=n {
            let k = i % n;
            strip[slot] = prev + k as u16;
            strip[slot + 1] = next + ((n - k) % n) as u16;
            slot += 2;
        }
        strip[slot] = PRIMITIVE_RESTART;

        self.strip_cursor += self.ring_stride;
    }

    fn finish(self) -> TubeMesh {
        debug_assert_eq!(self.strip_cursor, self.mesh.strip_indices.len());
        debug_assert_eq!(self.mesh.fan_indices.len(), self.fan_len);
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::Segment;

    const N: usize = DEFAULT_CIRCLE_SUBDIVISIONS;

    fn square_layer() -> Layer {
        Layer::from_segments(
            0.2,
            [
                (Segment::new(0.0, 0.0, 10.0, 0.0), 0),
                (Segment::new(10.0, 0.0, 10.0, 10.0), 1),
                (Segment::new(10.0, 10.0, 0.0, 10.0), 2),
                // travel gap before this one
                (Segment::new(20.0, 20.0, 30.0, 20.0), 3),
            ],
        )
    }

    fn vertex(mesh: &TubeMesh, index: u16) -> glam::Vec3 {
        let i = index as usize * 3;
        glam::Vec3::new(mesh.vertices[i], mesh.vertices[i + 1], mesh.vertices[i + 2])
    }

    fn normal(mesh: &TubeMesh, index: u16) -> glam::Vec3 {
        let i = index as usize * 3;
        glam::Vec3::new(mesh.normals[i], mesh.normals[i + 1], mesh.normals[i + 2])
    }

    #[test]
    fn test_buffer_sizes_match_formulas() {
        let layer = square_layer();
        let mesh = TubeMeshBuilder::default().build(&layer, 0.4).expect("mesh");

        let k = 4;
        let m = 2;
        assert_eq!(mesh.vertex_count(), 2 * k * (N + 1));
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert_eq!(mesh.fan_indices.len(), 2 * k * (N + 3));
        assert_eq!(mesh.strip_indices.len(), (2 * k - m) * (N + 3) * 2);
    }

    #[test]
    fn test_indices_stay_in_range() {
        let mesh = TubeMeshBuilder::default()
            .build(&square_layer(), 0.4)
            .expect("mesh");
        let count = mesh.vertex_count();
        for &index in mesh.fan_indices.iter().chain(&mesh.strip_indices) {
            assert!(index == PRIMITIVE_RESTART || (index as usize) < count);
        }
    }

    #[test]
    fn test_sub_primitive_views() {
        let mesh = TubeMeshBuilder::default()
            .build(&square_layer(), 0.4)
            .expect("mesh");

        let fans: Vec<_> = mesh.fans().collect();
        assert_eq!(fans.len(), 8);
        assert!(fans.iter().all(|fan| fan.len() == N + 2));
        // Fans close on their first perimeter vertex
        assert!(fans.iter().all(|fan| fan[1] == fan[N + 1]));

        let strips: Vec<_> = mesh.strips().collect();
        assert_eq!(strips.len(), 6);
        assert!(strips.iter().all(|strip| strip.len() == 2 * (N + 1)));
        assert!(strips
            .iter()
            .all(|strip| strip[0] == strip[2 * N] && strip[1] == strip[2 * N + 1]));
    }

    #[test]
    fn test_geometry_of_single_segment() {
        let layer = Layer::from_segments(1.5, [(Segment::new(0.0, 0.0, 0.0, 10.0), 0)]);
        let mesh = TubeMeshBuilder::default().build(&layer, 0.4).expect("mesh");

        // Start center at (0, z, 0), end center at (0, z, -10)
        let start_center = 0;
        let end_center = (N + 1) as u16;
        assert_eq!(vertex(&mesh, start_center), glam::Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(vertex(&mesh, end_center), glam::Vec3::new(0.0, 1.5, -10.0));

        // Caps face away from the tube
        assert!((normal(&mesh, start_center) - glam::Vec3::Z).length() < 1e-6);
        assert!((normal(&mesh, end_center) + glam::Vec3::Z).length() < 1e-6);

        for k in 1..=N as u16 {
            let offset = vertex(&mesh, k) - vertex(&mesh, start_center);
            assert!((offset.length() - 0.2).abs() < 1e-5);
            assert!(offset.z.abs() < 1e-6, "perimeter lies in the cap plane");

            // Perimeter normals point radially outwards
            let n = normal(&mesh, k);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!((n - offset / 0.2).length() < 1e-4);
        }
    }

    #[test]
    fn test_ring_pairs_vertices_at_same_angle() {
        let layer = Layer::from_segments(0.0, [(Segment::new(0.0, 0.0, 5.0, 0.0), 0)]);
        let mesh = TubeMeshBuilder::default().build(&layer, 1.0).expect("mesh");
        let strip = mesh.strips().next().expect("strip");

        for pair in strip.chunks(2) {
            let a = vertex(&mesh, pair[0]);
            let b = vertex(&mesh, pair[1]);
            // Same point on the cross-section, shifted along the tube axis
            assert!((a.y - b.y).abs() < 1e-5);
            assert!((a.z - b.z).abs() < 1e-5);
            assert!((b.x - a.x - 5.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_layer_gives_empty_mesh() {
        let mesh = TubeMeshBuilder::default()
            .build(&Layer::new(0.2), 0.4)
            .expect("mesh");
        assert!(mesh.is_empty());
        assert!(mesh.fan_indices.is_empty());
        assert!(mesh.strip_indices.is_empty());
        assert_eq!(mesh.byte_size(), 0);
    }

    #[test]
    fn test_overflow_is_reported() {
        let builder = TubeMeshBuilder::default();
        let per_segment = 2 * (N + 1);
        let fits = MAX_LAYER_VERTICES / per_segment;

        let layer = |count: usize| {
            Layer::from_segments(
                0.0,
                (0..count).map(|i| (Segment::new(i as f64, 0.0, i as f64 + 1.0, 0.0), i)),
            )
        };

        let mesh = builder.build(&layer(fits), 0.4).expect("largest layer fits");
        assert!(mesh.vertex_count() <= MAX_LAYER_VERTICES);
        assert!(mesh
            .fan_indices
            .iter()
            .chain(&mesh.strip_indices)
            .all(|&i| i == PRIMITIVE_RESTART || (i as usize) < mesh.vertex_count()));

        let err = builder.build(&layer(fits + 1), 0.4).unwrap_err();
        assert_eq!(
            err,
            MeshError::GeometryOverflow {
                required: (fits + 1) * per_segment,
                limit: MAX_LAYER_VERTICES,
            }
        );
    }

    #[test]
    fn test_rebuild_is_bit_identical() {
        let builder = TubeMeshBuilder::new(16).expect("builder");
        let a = builder.build(&square_layer(), 0.45).expect("mesh");
        let b = builder.build(&square_layer(), 0.45).expect("mesh");
        assert_eq!(a.vertex_bytes(), b.vertex_bytes());
        assert_eq!(a.normal_bytes(), b.normal_bytes());
        assert_eq!(a.fan_indices, b.fan_indices);
        assert_eq!(a.strip_indices, b.strip_indices);
    }

    #[test]
    fn test_degenerate_segment_still_builds() {
        let layer = Layer::from_segments(0.0, [(Segment::new(1.0, 1.0, 1.0, 1.0), 0)]);
        let mesh = TubeMeshBuilder::default().build(&layer, 0.4).expect("mesh");
        assert_eq!(mesh.vertex_count(), 2 * (N + 1));
        assert!(mesh.vertices.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_subdivision_range() {
        assert!(TubeMeshBuilder::new(3).is_ok());
        let rejected = |subdivisions| {
            Err(MeshError::InvalidSubdivisions {
                subdivisions,
                minimum: MIN_CIRCLE_SUBDIVISIONS,
                maximum: MAX_CIRCLE_SUBDIVISIONS,
            })
        };
        assert_eq!(TubeMeshBuilder::new(2), rejected(2));
        assert_eq!(
            TubeMeshBuilder::new(MAX_CIRCLE_SUBDIVISIONS + 1),
            rejected(MAX_CIRCLE_SUBDIVISIONS + 1)
        );
        assert_eq!(TubeMeshBuilder::new(usize::MAX), rejected(usize::MAX));
    }

    #[test]
    fn test_largest_subdivision_builds_one_segment() {
        let builder = TubeMeshBuilder::new(MAX_CIRCLE_SUBDIVISIONS).expect("builder");
        let one = Layer::from_segments(0.0, [(Segment::new(0.0, 0.0, 1.0, 0.0), 0)]);
        let mesh = builder.build(&one, 0.4).expect("mesh");
        assert_eq!(mesh.vertex_count(), MAX_LAYER_VERTICES);
        assert!(mesh
            .fan_indices
            .iter()
            .chain(&mesh.strip_indices)
            .all(|&i| i == PRIMITIVE_RESTART || (i as usize) < MAX_LAYER_VERTICES));

        let two = Layer::from_segments(
            0.0,
            [
                (Segment::new(0.0, 0.0, 1.0, 0.0), 0),
                (Segment::new(1.0, 0.0, 2.0, 0.0), 1),
            ],
        );
        assert!(builder.build(&two, 0.4).unwrap_err().is_overflow());
    }

    #[test]
    fn test_size_helpers_report_overflow() {
        let builder = TubeMeshBuilder::default();
        assert_eq!(builder.vertex_count(usize::MAX), None);
        assert_eq!(builder.fan_index_count(usize::MAX), None);
        assert_eq!(builder.strip_index_count(usize::MAX, 1), None);
        assert_eq!(builder.strip_index_count(1, 3), None);
        assert_eq!(builder.strip_index_count(4, 2), Some(6 * (N + 3) * 2));
    }
}
