//! Mesh decimation by greedy edge collapse.
//!
//! Candidates live in a min-heap keyed by collapse cost. Entries are never
//! removed when the mesh changes around them; instead each carries the
//! version stamps of its endpoints and is discarded on pop if either vertex
//! has changed since it was queued.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashSet;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
use tracing::{debug, info, trace};

use crate::adjacency::{MeshAdjacency, edge_key};
use crate::error::{MeshError, MeshResult};
use crate::{Mesh, Vertex};

/// How collapse candidates are scored and placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CollapseCost {
    /// Cost is the edge length; the merged vertex sits at the midpoint.
    #[default]
    ShortestEdge,
    /// Garland-Heckbert plane quadrics with an optimal merged position.
    Quadric,
}

/// Parameters for mesh decimation.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DecimateParams {
    /// Target number of triangles. If None, uses target_ratio instead.
    pub target_triangles: Option<usize>,
    /// Target ratio of triangles to keep (0.0 to 1.0). Default: 0.5
    pub target_ratio: f64,
    /// Collapse scoring. Default: `ShortestEdge`
    pub cost: CollapseCost,
    /// Never collapse boundary edges, and never move boundary vertices.
    /// Default: false
    pub preserve_boundary: bool,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_triangles: None,
            target_ratio: 0.5,
            cost: CollapseCost::default(),
            preserve_boundary: false,
        }
    }
}

impl DecimateParams {
    /// Create params targeting a specific triangle count.
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            target_triangles: Some(count),
            ..Default::default()
        }
    }

    /// Create params targeting a ratio of original triangles.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Triangle count to stop at for a mesh with `face_count` faces.
    pub fn target_for(&self, face_count: usize) -> usize {
        self.target_triangles
            .unwrap_or_else(|| ((face_count as f64) * self.target_ratio).ceil() as usize)
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> MeshResult<()> {
        if self.target_triangles.is_none() && !(0.0..=1.0).contains(&self.target_ratio) {
            return Err(MeshError::invalid_argument(
                "decimate.target_ratio",
                format!("must lie in [0, 1], got {}", self.target_ratio),
            ));
        }
        Ok(())
    }
}

/// Result of mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateResult {
    /// The decimated mesh.
    pub mesh: Mesh,
    /// Number of triangles in original mesh.
    pub original_triangles: usize,
    /// Number of triangles in decimated mesh.
    pub final_triangles: usize,
    /// Number of edge collapses performed.
    pub collapses_performed: usize,
    /// Number of edge collapses rejected by a legality check.
    pub collapses_rejected: usize,
}

/// Quadric error matrix `Σ p pᵀ` over planes `p = [a, b, c, d]`.
#[derive(Debug, Clone, Copy)]
struct Quadric(Matrix4<f64>);

impl Default for Quadric {
    fn default() -> Self {
        Self(Matrix4::zeros())
    }
}

impl Quadric {
    /// Create a quadric from a plane equation (ax + by + cz + d = 0).
    fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        let p = Vector4::new(a, b, c, d);
        Self(p * p.transpose())
    }

    fn add(&mut self, other: &Quadric) {
        self.0 += other.0;
    }

    fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let v = p.to_homogeneous();
        v.dot(&(self.0 * v))
    }

    /// Point minimising the error, or None if the quadric is singular.
    fn optimal_point(&self) -> Option<Point3<f64>> {
        let a: Matrix3<f64> = self.0.fixed_view::<3, 3>(0, 0).into_owned();
        let b: Vector3<f64> = self.0.fixed_view::<3, 1>(0, 3).into_owned();
        if a.determinant().abs() < 1e-10 {
            return None;
        }
        a.try_inverse().map(|inv| Point3::from(-(inv * b)))
    }
}

/// An edge collapse candidate in the priority queue.
#[derive(Debug, Clone)]
struct EdgeCollapse {
    /// Edge endpoints, `v1 < v2`.
    v1: u32,
    v2: u32,
    /// Endpoint versions when the candidate was scored.
    stamp: (u32, u32),
    cost: f64,
    position: Point3<f64>,
}

impl PartialEq for EdgeCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EdgeCollapse {}

impl PartialOrd for EdgeCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour; lower vertex indices win ties.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| (other.v1, other.v2).cmp(&(self.v1, self.v2)))
    }
}

/// Why a popped candidate was not collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    BoundaryEdge,
    LinkCondition,
    BoundaryPinch,
    FoldOver,
    DuplicateFace,
}

/// Working state of one decimation run.
struct DecimationState {
    positions: Vec<Point3<f64>>,
    faces: Vec<Option<[u32; 3]>>,
    /// Faces touching each vertex; may hold dead faces until pruned.
    incident: Vec<Vec<u32>>,
    removed: Vec<bool>,
    version: Vec<u32>,
    on_boundary: Vec<bool>,
    quadrics: Vec<Quadric>,
    active_faces: usize,
}

impl DecimationState {
    fn new(mesh: &Mesh, cost: CollapseCost) -> Self {
        let n = mesh.vertices.len();
        let mut incident = vec![Vec::new(); n];
        for (fi, face) in mesh.faces.iter().enumerate() {
            for &v in face {
                incident[v as usize].push(fi as u32);
            }
        }

        let adjacency = MeshAdjacency::build(&mesh.faces);
        let mut on_boundary = vec![false; n];
        for (a, b) in adjacency.boundary_edges() {
            on_boundary[a as usize] = true;
            on_boundary[b as usize] = true;
        }

        let quadrics = match cost {
            CollapseCost::Quadric => compute_vertex_quadrics(mesh),
            CollapseCost::ShortestEdge => Vec::new(),
        };

        Self {
            positions: mesh.vertices.iter().map(|v| v.position).collect(),
            faces: mesh.faces.iter().copied().map(Some).collect(),
            incident,
            removed: vec![false; n],
            version: vec![0; n],
            on_boundary,
            quadrics,
            active_faces: mesh.faces.len(),
        }
    }

    fn live_faces(&self, v: u32) -> impl Iterator<Item = (u32, [u32; 3])> + '_ {
        self.incident[v as usize]
            .iter()
            .filter_map(|&fi| self.faces[fi as usize].map(|f| (fi, f)))
    }

    /// Sorted, deduplicated one-ring of `v`.
    fn neighbors(&self, v: u32) -> Vec<u32> {
        let mut ring: Vec<u32> = self
            .live_faces(v)
            .flat_map(|(_, f)| f)
            .filter(|&u| u != v)
            .collect();
        ring.sort_unstable();
        ring.dedup();
        ring
    }

    /// Live faces containing both `a` and `b`.
    fn edge_faces(&self, a: u32, b: u32) -> Vec<(u32, [u32; 3])> {
        self.live_faces(a).filter(|(_, f)| f.contains(&b)).collect()
    }

    fn candidate(&self, a: u32, b: u32, params: &DecimateParams) -> Option<EdgeCollapse> {
        let (v1, v2) = edge_key(a, b);
        if params.preserve_boundary && self.edge_faces(v1, v2).len() == 1 {
            return None;
        }

        let p1 = self.positions[v1 as usize];
        let p2 = self.positions[v2 as usize];
        let pinned = if params.preserve_boundary {
            match (self.on_boundary[v1 as usize], self.on_boundary[v2 as usize]) {
                (true, false) => Some(p1),
                (false, true) => Some(p2),
                _ => None,
            }
        } else {
            None
        };

        let (cost, position) = match params.cost {
            CollapseCost::ShortestEdge => (
                (p2 - p1).norm(),
                pinned.unwrap_or_else(|| Point3::from((p1.coords + p2.coords) * 0.5)),
            ),
            CollapseCost::Quadric => {
                let mut combined = self.quadrics[v1 as usize];
                combined.add(&self.quadrics[v2 as usize]);
                let position = pinned.or_else(|| combined.optimal_point()).unwrap_or_else(|| {
                    let midpoint = Point3::from((p1.coords + p2.coords) * 0.5);
                    [midpoint, p1, p2]
                        .into_iter()
                        .min_by(|x, y| combined.evaluate(x).total_cmp(&combined.evaluate(y)))
                        .unwrap_or(midpoint)
                });
                (combined.evaluate(&position).max(0.0), position)
            }
        };

        Some(EdgeCollapse {
            v1,
            v2,
            stamp: (self.version[v1 as usize], self.version[v2 as usize]),
            cost,
            position,
        })
    }

    fn is_stale(&self, c: &EdgeCollapse) -> bool {
        self.removed[c.v1 as usize]
            || self.removed[c.v2 as usize]
            || (self.version[c.v1 as usize], self.version[c.v2 as usize]) != c.stamp
    }

    fn check_collapse(
        &self,
        c: &EdgeCollapse,
        shared: &[(u32, [u32; 3])],
        params: &DecimateParams,
    ) -> Result<(), Rejection> {
        let (a, b) = (c.v1, c.v2);

        if params.preserve_boundary && shared.len() == 1 {
            return Err(Rejection::BoundaryEdge);
        }

        // Link condition: the endpoints may only share the opposite corners
        // of the faces on the edge.
        let mut opposite: Vec<u32> = shared
            .iter()
            .filter_map(|(_, f)| f.iter().copied().find(|&v| v != a && v != b))
            .collect();
        opposite.sort_unstable();
        let ring_b = self.neighbors(b);
        let common: Vec<u32> = self
            .neighbors(a)
            .into_iter()
            .filter(|v| *v != b && ring_b.binary_search(v).is_ok())
            .collect();
        if common != opposite {
            return Err(Rejection::LinkCondition);
        }

        if shared.len() == 2 && self.on_boundary[a as usize] && self.on_boundary[b as usize] {
            return Err(Rejection::BoundaryPinch);
        }

        let mut survivors: HashSet<[u32; 3]> = HashSet::new();
        for v in [a, b] {
            for (_, face) in self.live_faces(v) {
                if face.contains(&a) && face.contains(&b) {
                    continue;
                }

                let before = face.map(|u| self.positions[u as usize]);
                let after = face.map(|u| {
                    if u == a || u == b {
                        c.position
                    } else {
                        self.positions[u as usize]
                    }
                });
                let n_before = (before[1] - before[0]).cross(&(before[2] - before[0]));
                let n_after = (after[1] - after[0]).cross(&(after[2] - after[0]));
                let scale = (after[1] - after[0])
                    .norm_squared()
                    .max((after[2] - after[1]).norm_squared())
                    .max((after[0] - after[2]).norm_squared());

                if n_after.norm() <= f64::EPSILON * scale {
                    return Err(Rejection::FoldOver);
                }
                if n_before.dot(&n_after) < 0.0 {
                    return Err(Rejection::FoldOver);
                }

                let mut key = face.map(|u| if u == b { a } else { u });
                key.sort_unstable();
                if !survivors.insert(key) {
                    return Err(Rejection::DuplicateFace);
                }
            }
        }

        Ok(())
    }

    /// Merge `c.v2` into `c.v1`.
    fn collapse(&mut self, c: &EdgeCollapse) {
        let (keep, gone) = (c.v1, c.v2);

        self.positions[keep as usize] = c.position;
        if !self.quadrics.is_empty() {
            let q = self.quadrics[gone as usize];
            self.quadrics[keep as usize].add(&q);
        }
        self.on_boundary[keep as usize] |= self.on_boundary[gone as usize];

        let moved = std::mem::take(&mut self.incident[gone as usize]);
        for fi in moved {
            let Some(face) = self.faces[fi as usize].as_mut() else {
                continue;
            };
            if face.contains(&keep) {
                self.faces[fi as usize] = None;
                self.active_faces -= 1;
            } else {
                for v in face.iter_mut() {
                    if *v == gone {
                        *v = keep;
                    }
                }
                self.incident[keep as usize].push(fi);
            }
        }

        let faces = &self.faces;
        self.incident[keep as usize].retain(|&fi| faces[fi as usize].is_some());
        self.removed[gone as usize] = true;
        self.version[keep as usize] += 1;
        self.version[gone as usize] += 1;
        for v in self.neighbors(keep) {
            self.version[v as usize] += 1;
        }
    }

    /// Queue a fresh candidate for every edge touching `keep` or its
    /// one-ring, the only edges whose legality a collapse can change.
    fn requeue_around(
        &self,
        keep: u32,
        params: &DecimateParams,
        heap: &mut BinaryHeap<EdgeCollapse>,
    ) {
        let mut queued: HashSet<(u32, u32)> = HashSet::new();
        for v in std::iter::once(keep).chain(self.neighbors(keep)) {
            for u in self.neighbors(v) {
                if queued.insert(edge_key(v, u))
                    && let Some(c) = self.candidate(v, u, params)
                {
                    heap.push(c);
                }
            }
        }
    }

    /// Drop unreferenced vertices, keep vertex and face order.
    fn into_mesh(self) -> MeshResult<Mesh> {
        let mut remap = vec![u32::MAX; self.positions.len()];
        for face in self.faces.iter().flatten() {
            for &v in face {
                if self.removed[v as usize] {
                    return Err(MeshError::decimation_failed(format!(
                        "face {:?} still references collapsed vertex {}",
                        face, v
                    )));
                }
                remap[v as usize] = 0;
            }
        }

        let mut vertices = Vec::new();
        for (old, slot) in remap.iter_mut().enumerate() {
            if *slot == 0 {
                *slot = vertices.len() as u32;
                vertices.push(Vertex::new(self.positions[old]));
            }
        }

        let faces = self
            .faces
            .iter()
            .flatten()
            .map(|f| f.map(|v| remap[v as usize]))
            .collect();

        Ok(Mesh { vertices, faces })
    }
}

/// Compute quadric error matrices for each vertex.
fn compute_vertex_quadrics(mesh: &Mesh) -> Vec<Quadric> {
    let mut quadrics = vec![Quadric::default(); mesh.vertices.len()];

    for (face, tri) in mesh.faces.iter().zip(mesh.triangles()) {
        // Skip degenerate triangles
        let Some(n) = tri.normal() else { continue };
        let d = -n.dot(&tri.v0.coords);
        let q = Quadric::from_plane(n.x, n.y, n.z, d);

        for &vi in face {
            quadrics[vi as usize].add(&q);
        }
    }

    quadrics
}

/// Decimate a mesh by greedy edge collapse.
///
/// Stops once the face count is at or below the target, or when no legal
/// collapse remains. An interior collapse removes two faces, so the result
/// can land one below the target. If the mesh is already at or below the
/// target it is returned unchanged.
///
/// # Errors
/// - [`MeshError::InvalidArgument`] for a target ratio outside `[0, 1]`.
/// - [`MeshError::InvalidVertexIndex`] if a face references a missing vertex.
/// - [`MeshError::DecimationFailed`] if the collapse loop leaves a face on a
///   removed vertex.
///
/// # Example
/// ```
/// use mesh_inpaint::{Mesh, decimate_mesh, DecimateParams};
///
/// let mesh = Mesh::from_positions(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// );
///
/// let result = decimate_mesh(&mesh, &DecimateParams::with_target_triangles(5)).unwrap();
/// assert_eq!(result.final_triangles, 1);
/// ```
pub fn decimate_mesh(mesh: &Mesh, params: &DecimateParams) -> MeshResult<DecimateResult> {
    params.validate()?;

    let original_triangles = mesh.faces.len();
    let target = params.target_for(original_triangles);

    // Don't decimate if already at or below target
    if original_triangles <= target {
        debug!(
            faces = original_triangles,
            target = target,
            "Mesh already within face budget"
        );
        return Ok(DecimateResult {
            mesh: mesh.clone(),
            original_triangles,
            final_triangles: original_triangles,
            collapses_performed: 0,
            collapses_rejected: 0,
        });
    }

    let vertex_count = mesh.vertices.len();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(MeshError::invalid_vertex_index(face_index, bad, vertex_count));
        }
    }

    let mut state = DecimationState::new(mesh, params.cost);

    let mut heap = BinaryHeap::new();
    let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(original_triangles * 3 / 2 + 3);
    for &[v0, v1, v2] in &mesh.faces {
        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            if seen.insert(edge_key(a, b))
                && let Some(c) = state.candidate(a, b, params)
            {
                heap.push(c);
            }
        }
    }

    debug!(
        faces = original_triangles,
        target = target,
        candidates = heap.len(),
        cost = ?params.cost,
        "Starting decimation"
    );

    let mut collapses_performed = 0;
    let mut collapses_rejected = 0;

    while state.active_faces > target {
        let Some(collapse) = heap.pop() else {
            break;
        };

        if state.is_stale(&collapse) {
            continue;
        }
        let shared = state.edge_faces(collapse.v1, collapse.v2);
        if shared.is_empty() {
            continue;
        }

        if let Err(reason) = state.check_collapse(&collapse, &shared, params) {
            trace!(v1 = collapse.v1, v2 = collapse.v2, ?reason, "Collapse rejected");
            collapses_rejected += 1;
            continue;
        }

        state.collapse(&collapse);
        collapses_performed += 1;

        state.requeue_around(collapse.v1, params, &mut heap);
    }

    let final_triangles = state.active_faces;
    let final_mesh = state.into_mesh()?;

    info!(
        "Decimated {} -> {} triangles ({} collapses, {} rejected)",
        original_triangles, final_triangles, collapses_performed, collapses_rejected
    );

    Ok(DecimateResult {
        mesh: final_mesh,
        original_triangles,
        final_triangles,
        collapses_performed,
        collapses_rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subdivide::upsample_mesh;
    use proptest::prelude::*;

    /// `n x n` vertex grid on the unit square, normals along +Z.
    fn make_grid(n: usize) -> Mesh {
        let mut positions = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                let s = (n - 1) as f64;
                positions.push([i as f64 / s, j as f64 / s, 0.0]);
            }
        }
        let mut faces = Vec::new();
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let a = (j * n + i) as u32;
                faces.push([a, a + 1, a + n as u32 + 1]);
                faces.push([a, a + n as u32 + 1, a + n as u32]);
            }
        }
        Mesh::from_positions(&positions, &faces)
    }

    fn make_tetrahedron() -> Mesh {
        Mesh::from_positions(
            &[
                [1.0, 1.0, 1.0],
                [1.0, -1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0],
            ],
            &[[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]],
        )
    }

    fn assert_valid(mesh: &Mesh) {
        for face in &mesh.faces {
            assert!(face.iter().all(|&v| (v as usize) < mesh.vertex_count()));
            assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
        let adjacency = MeshAdjacency::build(&mesh.faces);
        assert!(adjacency.is_manifold());
        assert!(adjacency.inconsistent_edges(&mesh.faces).is_empty());
        assert_eq!(mesh.referenced_vertex_count(), mesh.vertex_count());
    }

    #[test]
    fn test_decimate_empty_mesh() {
        let mesh = Mesh::default();
        let result = decimate_mesh(&mesh, &DecimateParams::default()).unwrap();
        assert_eq!(result.original_triangles, 0);
        assert_eq!(result.final_triangles, 0);
        assert_eq!(result.collapses_performed, 0);
    }

    #[test]
    fn test_decimate_already_at_target() {
        let mesh = make_grid(4);
        // Target more than current count - should not decimate
        let params = DecimateParams::with_target_triangles(20);
        let result = decimate_mesh(&mesh, &params).unwrap();

        assert_eq!(result.original_triangles, 18);
        assert_eq!(result.final_triangles, 18);
        assert_eq!(result.collapses_performed, 0);
        assert_eq!(result.mesh, mesh);
    }

    #[test]
    fn test_decimate_grid_to_target() {
        let mesh = make_grid(9);
        assert_eq!(mesh.face_count(), 128);

        let result = decimate_mesh(&mesh, &DecimateParams::with_target_triangles(64)).unwrap();

        assert!(result.final_triangles <= 64);
        assert!(result.final_triangles >= 63);
        assert_eq!(result.final_triangles, result.mesh.face_count());
        assert_valid(&result.mesh);
        for tri in result.mesh.triangles() {
            let n = tri.normal().expect("no degenerate faces");
            assert!(n.z > 0.0, "face flipped: {:?}", n);
        }
    }

    #[test]
    fn test_decimate_preserve_boundary_keeps_outline() {
        let mesh = make_grid(7);
        let params = DecimateParams {
            target_triangles: Some(10),
            preserve_boundary: true,
            ..Default::default()
        };
        let result = decimate_mesh(&mesh, &params).unwrap();

        assert!(result.collapses_performed > 0);
        assert!(result.final_triangles < mesh.face_count());
        assert_valid(&result.mesh);

        // Boundary edges never collapse and boundary vertices never move,
        // so the planar outline and its area survive.
        let adjacency = MeshAdjacency::build(&result.mesh.faces);
        assert_eq!(adjacency.boundary_edge_count(), 24);
        assert!((result.mesh.surface_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_decimate_closed_mesh_stays_closed() {
        let mesh = upsample_mesh(&make_tetrahedron(), 2).mesh;
        assert_eq!(mesh.face_count(), 64);

        for cost in [CollapseCost::ShortestEdge, CollapseCost::Quadric] {
            let params = DecimateParams {
                target_triangles: Some(40),
                cost,
                ..Default::default()
            };
            let result = decimate_mesh(&mesh, &params).unwrap();

            assert!(result.final_triangles <= 40, "{:?}", cost);
            assert_valid(&result.mesh);
            let adjacency = MeshAdjacency::build(&result.mesh.faces);
            assert!(adjacency.is_watertight());
            assert!(result.mesh.signed_volume() > 0.0);
        }
    }

    #[test]
    fn test_tetrahedron_cannot_collapse() {
        let mesh = make_tetrahedron();
        let result = decimate_mesh(&mesh, &DecimateParams::with_target_triangles(2)).unwrap();

        assert_eq!(result.final_triangles, 4);
        assert_eq!(result.collapses_performed, 0);
        assert_eq!(result.collapses_rejected, 6);
    }

    #[test]
    fn test_interior_edge_between_boundary_vertices_is_kept() {
        let mesh = Mesh::from_positions(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [1.5, 1.0, 0.0],
            ],
            &[[0, 1, 2], [1, 3, 2]],
        );
        let params = DecimateParams {
            target_triangles: Some(1),
            preserve_boundary: true,
            ..Default::default()
        };
        let result = decimate_mesh(&mesh, &params).unwrap();
        assert_eq!(result.final_triangles, 2);
        assert_eq!(result.collapses_performed, 0);
        assert_eq!(result.collapses_rejected, 1);

        // Without boundary preservation an outer edge may go.
        let result = decimate_mesh(&mesh, &DecimateParams::with_target_triangles(1)).unwrap();
        assert_eq!(result.final_triangles, 1);
        assert_eq!(result.mesh.vertex_count(), 3);
    }

    #[test]
    fn test_shortest_edge_goes_first() {
        // Fan around vertex 0 with one much shorter spoke to vertex 1.
        let mesh = Mesh::from_positions(
            &[
                [0.0, 0.0, 0.0],
                [0.1, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, -1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]],
        );
        let result = decimate_mesh(&mesh, &DecimateParams::with_target_triangles(3)).unwrap();
        assert_eq!(result.collapses_performed, 1);
        assert_eq!(result.final_triangles, 2);
        // Vertex 0 moved to the midpoint of the collapsed spoke.
        assert!((result.mesh.vertices[0].position - Point3::new(0.05, 0.0, 0.0)).norm() < 1e-12);
    }

    /// Every remaining edge of `mesh` fails the collapse checks.
    fn assert_no_legal_collapse(mesh: &Mesh, params: &DecimateParams) {
        let state = DecimationState::new(mesh, params.cost);
        let adjacency = MeshAdjacency::build(&mesh.faces);
        for &(a, b) in adjacency.edge_to_faces.keys() {
            let Some(c) = state.candidate(a, b, params) else {
                continue;
            };
            let shared = state.edge_faces(c.v1, c.v2);
            assert!(
                state.check_collapse(&c, &shared, params).is_err(),
                "edge ({}, {}) could still collapse",
                a,
                b
            );
        }
    }

    #[test]
    fn test_stopping_above_target_leaves_no_legal_collapse() {
        let meshes = [
            make_tetrahedron(),
            upsample_mesh(&make_tetrahedron(), 1).mesh,
            make_grid(4),
            make_grid(6),
        ];
        for mesh in &meshes {
            for preserve_boundary in [false, true] {
                let params = DecimateParams {
                    target_triangles: Some(1),
                    preserve_boundary,
                    ..Default::default()
                };
                let result = decimate_mesh(mesh, &params).unwrap();
                assert_valid(&result.mesh);
                if result.final_triangles > 1 {
                    assert_no_legal_collapse(&result.mesh, &params);
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn proptest_early_stop_means_stuck(
            n in 3usize..=6,
            heights in prop::collection::vec(-0.2..0.2f64, 36),
            fraction in 0.0..0.5f64,
            preserve_boundary in any::<bool>(),
        ) {
            let mut mesh = make_grid(n);
            for (v, h) in mesh.vertices.iter_mut().zip(&heights) {
                v.position.z = *h;
            }
            let target = (mesh.face_count() as f64 * fraction) as usize;
            let params = DecimateParams {
                target_triangles: Some(target),
                preserve_boundary,
                ..Default::default()
            };

            let result = decimate_mesh(&mesh, &params).unwrap();
            if result.final_triangles > target {
                assert_no_legal_collapse(&result.mesh, &params);
            }
        }
    }

    #[test]
    fn test_target_for() {
        assert_eq!(DecimateParams::with_target_triangles(7).target_for(100), 7);
        assert_eq!(DecimateParams::with_target_ratio(0.25).target_for(10), 3);
        assert_eq!(DecimateParams::default().target_for(9), 5);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let params = DecimateParams {
            target_ratio: 1.5,
            ..Default::default()
        };
        let err = decimate_mesh(&make_grid(3), &params).unwrap_err();
        assert!(matches!(err, MeshError::InvalidArgument { .. }));
    }

    #[test]
    fn test_quadric_from_plane() {
        let q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);

        // Points on the z=0 plane should have zero error
        assert!(q.evaluate(&Point3::new(0.0, 0.0, 0.0)).abs() < 1e-10);
        assert!(q.evaluate(&Point3::new(1.0, 2.0, 0.0)).abs() < 1e-10);

        // Points off the plane should have non-zero error
        assert!((q.evaluate(&Point3::new(0.0, 0.0, 1.0)) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_quadric_optimal_point() {
        // Three orthogonal planes meeting at (1, 2, 3).
        let mut q = Quadric::from_plane(1.0, 0.0, 0.0, -1.0);
        q.add(&Quadric::from_plane(0.0, 1.0, 0.0, -2.0));
        q.add(&Quadric::from_plane(0.0, 0.0, 1.0, -3.0));

        let opt = q.optimal_point().expect("non-singular");
        assert!((opt - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-9);

        // A single plane leaves the point undetermined.
        assert!(Quadric::from_plane(0.0, 0.0, 1.0, 0.0).optimal_point().is_none());
    }

    #[test]
    fn test_candidate_ordering_is_deterministic() {
        let a = EdgeCollapse {
            v1: 0,
            v2: 5,
            stamp: (0, 0),
            cost: 1.0,
            position: Point3::origin(),
        };
        let b = EdgeCollapse { v1: 1, ..a.clone() };
        let c = EdgeCollapse { cost: 0.5, v1: 3, ..a.clone() };

        let mut heap = BinaryHeap::from(vec![b, a, c]);
        assert_eq!(heap.pop().map(|e| e.v1), Some(3));
        assert_eq!(heap.pop().map(|e| e.v1), Some(0));
        assert_eq!(heap.pop().map(|e| e.v1), Some(1));
    }
}
