//! Boundary loop extraction.
//!
//! A hole is a closed cycle of boundary edges (edges with a single incident
//! face). Loops are walked along the winding of the faces that own their
//! edges, so a fan built over a loop in reverse order faces the same way as
//! the surface around it.

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::Mesh;
use crate::adjacency::MeshAdjacency;
use crate::error::{MeshError, MeshResult};

/// A boundary loop representing a hole in the mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop {
    /// Ordered list of vertex indices forming the loop.
    ///
    /// For consecutive entries `a, b` (wrapping around), the directed edge
    /// `a → b` appears in exactly one face of the mesh.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of vertices in the loop.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the loop has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Directed edges of the loop, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Total length of the loop's edges.
    pub fn perimeter(&self, mesh: &Mesh) -> f64 {
        self.edges()
            .map(|(a, b)| (mesh.position(b) - mesh.position(a)).norm())
            .sum()
    }

    /// Arithmetic mean of the loop's vertex positions.
    pub fn centroid(&self, mesh: &Mesh) -> Point3<f64> {
        let sum = self
            .vertices
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, &v| acc + mesh.position(v).coords);
        Point3::from(sum / self.vertices.len().max(1) as f64)
    }
}

/// Loop chosen for filling, with a count of what else was found.
#[derive(Debug, Clone)]
pub struct LoopExtraction {
    /// The loop to fill.
    pub boundary: BoundaryLoop,
    /// Closed boundary loops found in the mesh.
    pub loops_found: usize,
}

/// Detect all closed boundary loops in the mesh, in discovery order.
///
/// Boundary half-edges are gathered in face order and each loop is walked
/// by following the first unused outgoing boundary half-edge at every
/// vertex. Chains that never return to their start are dropped.
pub fn detect_holes(mesh: &Mesh, adjacency: &MeshAdjacency) -> Vec<BoundaryLoop> {
    let half_edges = adjacency.boundary_half_edges(&mesh.faces);

    if half_edges.is_empty() {
        debug!("No boundary edges found");
        return Vec::new();
    }

    debug!("Found {} boundary edges", half_edges.len());

    let mut outgoing: HashMap<u32, Vec<usize>> = HashMap::new();
    for (idx, &(from, _)) in half_edges.iter().enumerate() {
        outgoing.entry(from).or_default().push(idx);
    }

    let mut used = vec![false; half_edges.len()];
    let mut loops = Vec::new();

    for start_idx in 0..half_edges.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;

        let (start, mut current) = half_edges[start_idx];
        let mut loop_vertices = vec![start];
        let mut closed = false;

        // Each step consumes one half-edge, so the walk is bounded.
        for _ in 0..half_edges.len() {
            if current == start {
                closed = true;
                break;
            }
            loop_vertices.push(current);

            let next = outgoing
                .get(&current)
                .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));

            match next {
                Some(i) => {
                    used[i] = true;
                    current = half_edges[i].1;
                }
                None => break,
            }
        }

        if !closed {
            warn!("Boundary chain starting at vertex {} is not closed", start);
            continue;
        }

        if loop_vertices.len() < 3 {
            warn!(
                "Ignoring boundary loop of {} vertices at vertex {}",
                loop_vertices.len(),
                start
            );
            continue;
        }

        loops.push(BoundaryLoop {
            vertices: loop_vertices,
        });
    }

    info!(
        "Detected {} holes (boundary loops), sizes: {:?}",
        loops.len(),
        loops.iter().map(|l| l.edge_count()).collect::<Vec<_>>()
    );

    loops
}

/// Find the boundary loop to fill.
///
/// A loop that passes through every referenced vertex bounds the whole
/// sheet rather than a hole and is skipped. Among the remaining loops the
/// one with the most vertices wins; ties go to the first discovered.
///
/// # Errors
/// Returns [`MeshError::NoHole`] when no loop bounds a hole.
pub fn extract_boundary_loop(mesh: &Mesh) -> MeshResult<LoopExtraction> {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let loops = detect_holes(mesh, &adjacency);
    let loops_found = loops.len();
    let referenced = mesh.referenced_vertex_count();

    let mut best: Option<BoundaryLoop> = None;
    for candidate in loops {
        let distinct: HashSet<u32> = candidate.vertices.iter().copied().collect();
        if distinct.len() >= referenced {
            debug!(
                "Boundary loop of {} vertices covers the whole mesh; not a hole",
                candidate.len()
            );
            continue;
        }
        if best.as_ref().is_none_or(|b| candidate.len() > b.len()) {
            best = Some(candidate);
        }
    }

    let Some(boundary) = best else {
        return Err(MeshError::no_hole(loops_found));
    };

    if loops_found > 1 {
        warn!(
            "Mesh has {} boundary loops; filling the largest ({} vertices) only",
            loops_found,
            boundary.len()
        );
    }

    Ok(LoopExtraction {
        boundary,
        loops_found,
    })
}
