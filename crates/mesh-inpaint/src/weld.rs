//! Fusing a patch with the mesh it covers.
//!
//! The fused mesh starts as an exact copy of the patch. Faces of the
//! original mesh are then appended one by one; each original vertex is
//! resolved once, either to the first fused vertex closer than `epsilon` or
//! to a freshly appended copy of itself. The resolution is recorded in a
//! [`WeldMap`] so later faces reuse it.

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::{debug, info};

use crate::error::{MeshError, MeshResult};
use crate::{Mesh, Vertex};

/// Default coincidence tolerance.
pub const DEFAULT_WELD_EPSILON: f64 = 1e-5;

/// How coincident vertices are searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum WeldStrategy {
    /// Scan every fused vertex in index order.
    Linear,
    /// Uniform grid over fused vertices; same matches as `Linear`.
    #[default]
    SpatialHash,
}

/// Parameters for welding.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WeldParams {
    /// Two vertices closer than this (strictly) are the same vertex.
    /// Default: 1e-5
    pub epsilon: f64,
    /// Search strategy.
    /// Default: `SpatialHash`
    pub strategy: WeldStrategy,
}

impl Default for WeldParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_WELD_EPSILON,
            strategy: WeldStrategy::default(),
        }
    }
}

impl WeldParams {
    /// Params with a custom tolerance.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon,
            ..Default::default()
        }
    }

    /// Check the tolerance is usable.
    pub fn validate(&self) -> MeshResult<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(MeshError::invalid_argument(
                "weld.epsilon",
                format!("must be positive and finite, got {}", self.epsilon),
            ));
        }
        Ok(())
    }
}

/// Mapping from original vertex index to fused vertex index.
///
/// Each entry is written at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeldMap {
    entries: Vec<Option<u32>>,
}

impl WeldMap {
    /// Empty map for a mesh with `original_vertices` vertices.
    pub fn new(original_vertices: usize) -> Self {
        Self {
            entries: vec![None; original_vertices],
        }
    }

    /// Fused index for an original vertex, if it has been resolved.
    pub fn get(&self, original: u32) -> Option<u32> {
        self.entries.get(original as usize).copied().flatten()
    }

    fn insert(&mut self, original: u32, fused: u32) {
        let slot = &mut self.entries[original as usize];
        debug_assert!(slot.is_none(), "vertex {} welded twice", original);
        *slot = Some(fused);
    }

    /// Number of resolved original vertices.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no original vertex has been resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    /// Resolved `(original, fused)` pairs in original index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.map(|f| (i as u32, f)))
    }
}

/// Result of welding.
#[derive(Debug, Clone)]
pub struct WeldResult {
    /// Patch followed by the original mesh, seam vertices shared.
    pub mesh: Mesh,
    /// Resolution of every original vertex used by a face.
    pub weld_map: WeldMap,
    /// Vertices `0..patch_vertex_count` came from the patch.
    pub patch_vertex_count: usize,
    /// Original vertices matched to an existing fused vertex.
    pub welded_vertices: usize,
    /// Original vertices appended as new fused vertices.
    pub appended_vertices: usize,
}

/// Cell coordinate for a position.
fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Grid of registered fused vertices.
///
/// Cells are `2 * epsilon` wide, so any point closer than `epsilon` lies in
/// one of the 27 cells around the query even when `floor` rounds a
/// coordinate sitting on a cell edge the wrong way. Indices within a cell
/// are ascending because vertices are registered in index order.
struct VertexGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64, i64), Vec<u32>>,
}

impl VertexGrid {
    fn for_epsilon(epsilon: f64, capacity: usize) -> Self {
        Self {
            cell_size: 2.0 * epsilon,
            cells: HashMap::with_capacity(capacity),
        }
    }

    fn insert(&mut self, index: u32, pos: &Point3<f64>) {
        self.cells
            .entry(pos_to_cell(pos, self.cell_size))
            .or_default()
            .push(index);
    }

    fn first_within(&self, vertices: &[Vertex], pos: &Point3<f64>, epsilon: f64) -> Option<u32> {
        let cell = pos_to_cell(pos, self.cell_size);
        let mut best: Option<u32> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor_cell = (
                        cell.0.saturating_add(dx),
                        cell.1.saturating_add(dy),
                        cell.2.saturating_add(dz),
                    );
                    let Some(candidates) = self.cells.get(&neighbor_cell) else {
                        continue;
                    };
                    // Ascending: the first hit is this cell's lowest match.
                    if let Some(&idx) = candidates.iter().find(|&&idx| {
                        (vertices[idx as usize].position - pos).norm() < epsilon
                    }) && best.is_none_or(|b| idx < b)
                    {
                        best = Some(idx);
                    }
                }
            }
        }

        best
    }
}

/// First fused vertex (lowest index) strictly closer than `epsilon`.
fn linear_first_within(vertices: &[Vertex], pos: &Point3<f64>, epsilon: f64) -> Option<u32> {
    vertices
        .iter()
        .position(|v| (v.position - pos).norm() < epsilon)
        .map(|i| i as u32)
}

/// Weld `patch` and `original` into one mesh.
///
/// Patch vertices are never merged with each other. Each original vertex is
/// looked up once, the first time a face uses it.
///
/// # Errors
/// - [`MeshError::InvalidArgument`] for a non-positive or non-finite epsilon.
/// - [`MeshError::InvalidVertexIndex`] if a face of `original` (or of
///   `patch`) references a missing vertex.
pub fn weld(patch: &Mesh, original: &Mesh, params: &WeldParams) -> MeshResult<WeldResult> {
    params.validate()?;
    check_indices(patch)?;
    check_indices(original)?;

    let epsilon = params.epsilon;
    let patch_vertex_count = patch.vertices.len();

    let mut vertices: Vec<Vertex> =
        Vec::with_capacity(patch_vertex_count + original.vertices.len());
    vertices.extend_from_slice(&patch.vertices);
    let mut faces: Vec<[u32; 3]> = Vec::with_capacity(patch.faces.len() + original.faces.len());
    faces.extend_from_slice(&patch.faces);

    let mut grid = match params.strategy {
        WeldStrategy::SpatialHash => {
            let mut grid = VertexGrid::for_epsilon(epsilon, vertices.capacity());
            for (idx, v) in vertices.iter().enumerate() {
                grid.insert(idx as u32, &v.position);
            }
            Some(grid)
        }
        WeldStrategy::Linear => None,
    };

    let mut weld_map = WeldMap::new(original.vertices.len());
    let mut welded_vertices = 0;
    let mut appended_vertices = 0;

    for face in &original.faces {
        let mut fused_face = [0u32; 3];
        for (slot, &orig) in face.iter().enumerate() {
            if let Some(fused) = weld_map.get(orig) {
                fused_face[slot] = fused;
                continue;
            }

            let pos = original.vertices[orig as usize].position;
            let found = match &grid {
                Some(grid) => grid.first_within(&vertices, &pos, epsilon),
                None => linear_first_within(&vertices, &pos, epsilon),
            };

            let fused = match found {
                Some(existing) => {
                    welded_vertices += 1;
                    existing
                }
                None => {
                    let idx = vertices.len() as u32;
                    vertices.push(Vertex::new(pos));
                    if let Some(grid) = grid.as_mut() {
                        grid.insert(idx, &pos);
                    }
                    appended_vertices += 1;
                    idx
                }
            };

            weld_map.insert(orig, fused);
            fused_face[slot] = fused;
        }
        faces.push(fused_face);
    }

    info!(
        "Welded patch ({} vertices) with mesh: {} seam vertices shared, {} appended",
        patch_vertex_count, welded_vertices, appended_vertices
    );
    debug!(
        fused_vertices = vertices.len(),
        fused_faces = faces.len(),
        epsilon = epsilon,
        strategy = ?params.strategy,
        "Weld complete"
    );

    Ok(WeldResult {
        mesh: Mesh { vertices, faces },
        weld_map,
        patch_vertex_count,
        welded_vertices,
        appended_vertices,
    })
}

fn check_indices(mesh: &Mesh) -> MeshResult<()> {
    let vertex_count = mesh.vertices.len();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(MeshError::invalid_vertex_index(face_index, bad, vertex_count));
        }
    }
    Ok(())
}
