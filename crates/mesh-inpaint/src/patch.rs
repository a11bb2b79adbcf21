//! Patch construction over a boundary loop.
//!
//! The patch is a fan from the loop's centroid. Face `i` is
//! `[loop[i + 1], loop[i], centroid]`: it runs each rim edge against the
//! direction the surrounding surface uses, which is what makes the two
//! pieces agree on orientation once welded.

use nalgebra::Point3;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::holes::BoundaryLoop;
use crate::subdivide::upsample_mesh;
use crate::{Mesh, Vertex};

/// Fan area below this fraction of the squared perimeter counts as zero.
const MIN_RELATIVE_AREA: f64 = 1e-12;

/// A mesh covering a hole.
///
/// The first `loop_len` vertices are the loop vertices in loop order, so
/// they coincide with the rim of the hole.
#[derive(Debug, Clone)]
pub struct Patch {
    /// Patch geometry.
    pub mesh: Mesh,
    /// Number of loop vertices at the start of the vertex list.
    pub loop_len: usize,
    /// Index of the centroid vertex, if the patch has one.
    pub centroid: Option<u32>,
}

/// Build the fan patch for `boundary`, reading positions from `mesh`.
///
/// A three-vertex loop becomes the single triangle `[l1, l0, l2]`; longer
/// loops get a centroid vertex at index `m` and `m` fan faces.
///
/// # Errors
/// Returns [`MeshError::DegenerateGeometry`] if the loop has fewer than three
/// vertices, revisits a vertex, references a vertex outside `mesh`, or spans
/// no area.
pub fn build_patch(mesh: &Mesh, boundary: &BoundaryLoop) -> MeshResult<Patch> {
    let m = boundary.len();
    if m < 3 {
        return Err(MeshError::degenerate_geometry(format!(
            "boundary loop has {} vertices, at least 3 are needed",
            m
        )));
    }

    let mut seen = hashbrown::HashSet::with_capacity(m);
    for &v in &boundary.vertices {
        if v as usize >= mesh.vertex_count() {
            return Err(MeshError::degenerate_vertex(
                v as usize,
                format!(
                    "boundary loop references vertex {} but the mesh has {} vertices",
                    v,
                    mesh.vertex_count()
                ),
            ));
        }
        if !seen.insert(v) {
            return Err(MeshError::degenerate_vertex(
                v as usize,
                format!("boundary loop visits vertex {} more than once", v),
            ));
        }
    }

    let positions: Vec<Point3<f64>> = boundary.vertices.iter().map(|&v| mesh.position(v)).collect();
    let centroid = boundary.centroid(mesh);

    let (faces, centroid_index) = if m == 3 {
        (vec![[1, 0, 2]], None)
    } else {
        let c = m as u32;
        let faces = (0..m as u32)
            .map(|i| [(i + 1) % c, i, c])
            .collect::<Vec<_>>();
        (faces, Some(c))
    };

    let mut vertices: Vec<Vertex> = positions.iter().copied().map(Vertex::new).collect();
    if centroid_index.is_some() {
        vertices.push(Vertex::new(centroid));
    }

    let patch_mesh = Mesh { vertices, faces };

    let perimeter = boundary.perimeter(mesh);
    let area = patch_mesh.surface_area();
    if area.is_nan() || area <= MIN_RELATIVE_AREA * perimeter * perimeter {
        return Err(MeshError::degenerate_geometry(format!(
            "patch over a {}-vertex loop has zero area (area {:.3e}, perimeter {:.3e})",
            m, area, perimeter
        )));
    }

    debug!(
        loop_len = m,
        faces = patch_mesh.face_count(),
        area = format!("{:.4}", area),
        "Built fan patch"
    );

    Ok(Patch {
        mesh: patch_mesh,
        loop_len: m,
        centroid: centroid_index,
    })
}

/// Build the fan patch and upsample it to `level`.
///
/// Use the same level as the mesh being filled so the patch rim is sampled
/// at exactly the positions of the upsampled hole rim.
pub fn build_upsampled_patch(
    mesh: &Mesh,
    boundary: &BoundaryLoop,
    level: usize,
) -> MeshResult<Patch> {
    let patch = build_patch(mesh, boundary)?;
    let upsampled = upsample_mesh(&patch.mesh, level);
    Ok(Patch {
        mesh: upsampled.mesh,
        ..patch
    })
}
