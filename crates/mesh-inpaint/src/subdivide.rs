//! Linear midpoint subdivision (upsampling).
//!
//! Every iteration splits each triangle into four by inserting one vertex at
//! the midpoint of every edge. Original vertices keep their positions and
//! indices; no smoothing is applied, so the surface shape is unchanged.
//!
//! Because a midpoint depends only on the two endpoint positions, an edge
//! shared by two different meshes (for example the rim of a hole and the rim
//! of the patch covering it) is sampled identically in both at every level.

use hashbrown::HashMap;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

use crate::adjacency::edge_key;
use crate::{Mesh, Vertex};

/// Result of mesh upsampling.
#[derive(Debug, Clone)]
pub struct UpsampleResult {
    /// The upsampled mesh.
    pub mesh: Mesh,
    /// Original triangle count.
    pub original_triangles: usize,
    /// Final triangle count.
    pub final_triangles: usize,
    /// Number of subdivision levels applied.
    pub levels: usize,
}

/// Upsample a mesh by `level` rounds of midpoint subdivision.
///
/// Each round turns `V` vertices, `E` edges and `F` faces into `V + E`
/// vertices and `4F` faces.
///
/// # Example
/// ```
/// use mesh_inpaint::{Mesh, upsample_mesh};
///
/// let mesh = Mesh::from_positions(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// );
///
/// let result = upsample_mesh(&mesh, 2);
/// assert_eq!(result.final_triangles, 16); // 1 -> 4 -> 16
/// assert_eq!(result.mesh.vertex_count(), 15);
/// ```
pub fn upsample_mesh(mesh: &Mesh, level: usize) -> UpsampleResult {
    let original_triangles = mesh.faces.len();

    if original_triangles == 0 || level == 0 {
        return UpsampleResult {
            mesh: mesh.clone(),
            original_triangles,
            final_triangles: original_triangles,
            levels: 0,
        };
    }

    let mut current = mesh.clone();
    for round in 0..level {
        current = upsample_once(&current);
        debug!(
            round = round + 1,
            vertices = current.vertex_count(),
            faces = current.face_count(),
            "Upsampling round complete"
        );
    }

    UpsampleResult {
        final_triangles: current.faces.len(),
        mesh: current,
        original_triangles,
        levels: level,
    }
}

/// Perform one round of midpoint subdivision.
///
/// Edges are numbered in the order they are first met while scanning faces,
/// which makes the output layout depend only on the input face order.
pub fn upsample_once(mesh: &Mesh) -> Mesh {
    let base = mesh.vertices.len() as u32;

    // Assign midpoint indices; the cache only lives for this round.
    let mut edge_vertices: HashMap<(u32, u32), u32> =
        HashMap::with_capacity(mesh.faces.len() * 3 / 2 + 3);
    let mut edges: Vec<(u32, u32)> = Vec::with_capacity(mesh.faces.len() * 3 / 2 + 3);
    let mut face_midpoints: Vec<[u32; 3]> = Vec::with_capacity(mesh.faces.len());

    for &[v0, v1, v2] in &mesh.faces {
        let mut mids = [0u32; 3];
        for (slot, (a, b)) in [(v0, v1), (v1, v2), (v2, v0)].into_iter().enumerate() {
            let key = edge_key(a, b);
            mids[slot] = *edge_vertices.entry(key).or_insert_with(|| {
                edges.push(key);
                base + edges.len() as u32 - 1
            });
        }
        face_midpoints.push(mids);
    }

    let midpoints: Vec<Vertex> = edges
        .par_iter()
        .map(|&(a, b)| {
            let p0 = mesh.vertices[a as usize].position;
            let p1 = mesh.vertices[b as usize].position;
            Vertex::new(midpoint(&p0, &p1))
        })
        .collect();

    let mut vertices = Vec::with_capacity(mesh.vertices.len() + midpoints.len());
    vertices.extend_from_slice(&mesh.vertices);
    vertices.extend(midpoints);

    let mut faces: Vec<[u32; 3]> = Vec::with_capacity(mesh.faces.len() * 4);
    for (&[v0, v1, v2], &[e01, e12, e20]) in mesh.faces.iter().zip(&face_midpoints) {
        //       v0
        //      /  \
        //    e20--e01
        //    / \  / \
        //  v2--e12--v1
        faces.push([v0, e01, e20]);
        faces.push([e01, v1, e12]);
        faces.push([e20, e12, v2]);
        faces.push([e01, e12, e20]); // Center triangle
    }

    Mesh { vertices, faces }
}

/// Midpoint of two points, symmetric in its arguments bit for bit.
#[inline]
fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) * 0.5)
}
