//! Input validation and mesh reports.
//!
//! Filling needs finite coordinates, in-range indices and an edge-manifold
//! surface whose faces agree on orientation. [`validate_input`] enforces all
//! of that; [`report_mesh`] only describes what it finds.

use nalgebra::Point3;
use tracing::{debug, warn};

use crate::Mesh;
use crate::adjacency::MeshAdjacency;
use crate::error::{MeshError, MeshResult, ValidationIssue};
use crate::holes::detect_holes;

/// Topological summary of a mesh.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// Total vertex count.
    pub vertex_count: usize,
    /// Total face count.
    pub face_count: usize,
    /// Edges with a single adjacent face.
    pub boundary_edge_count: usize,
    /// Closed loops formed by boundary edges.
    pub boundary_loop_count: usize,
    /// Edges with more than two adjacent faces.
    pub non_manifold_edge_count: usize,
    /// Interior edges traversed the same way by both faces.
    pub inconsistent_edge_count: usize,
    /// Bounding box as (min_corner, max_corner).
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,
    /// Total surface area.
    pub surface_area: f64,
    /// Signed volume; only meaningful for closed meshes.
    pub signed_volume: f64,
}

impl MeshReport {
    /// No boundary edges.
    pub fn is_watertight(&self) -> bool {
        self.boundary_edge_count == 0
    }

    /// Every edge has at most two faces.
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Watertight, manifold and consistently oriented.
    pub fn is_closed_surface(&self) -> bool {
        self.is_watertight() && self.is_manifold() && self.inconsistent_edge_count == 0
    }

    /// Bounding box extent along each axis.
    pub fn dimensions(&self) -> Option<(f64, f64, f64)> {
        self.bounds
            .map(|(min, max)| (max.x - min.x, max.y - min.y, max.z - min.z))
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;

        if let Some((dx, dy, dz)) = self.dimensions() {
            writeln!(f, "  Dimensions: {:.3} x {:.3} x {:.3}", dx, dy, dz)?;
        }
        writeln!(f, "  Surface Area: {:.4}", self.surface_area)?;

        writeln!(
            f,
            "  Holes: {} (boundary edges: {})",
            self.boundary_loop_count, self.boundary_edge_count
        )?;
        writeln!(
            f,
            "  Manifold: {} (non-manifold edges: {})",
            if self.is_manifold() { "yes" } else { "NO" },
            self.non_manifold_edge_count
        )?;
        write!(
            f,
            "  Orientation: {}",
            if self.inconsistent_edge_count == 0 {
                "consistent".to_string()
            } else {
                format!("INCONSISTENT ({} edges)", self.inconsistent_edge_count)
            }
        )
    }
}

/// Describe a mesh's topology and extent.
pub fn report_mesh(mesh: &Mesh) -> MeshReport {
    let adjacency = MeshAdjacency::build(&mesh.faces);

    let report = MeshReport {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        boundary_edge_count: adjacency.boundary_edge_count(),
        boundary_loop_count: detect_holes(mesh, &adjacency).len(),
        non_manifold_edge_count: adjacency.non_manifold_edges().count(),
        inconsistent_edge_count: adjacency.inconsistent_edges(&mesh.faces).len(),
        bounds: mesh.bounds(),
        surface_area: mesh.surface_area(),
        signed_volume: mesh.signed_volume(),
    };

    debug!("{}", report);
    report
}

/// Options for mesh data validation.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Return an error on the first issue (default: true).
    /// If false, issues are collected and returned.
    pub reject_on_invalid: bool,
    /// Maximum number of issues to collect before stopping (default: 100).
    pub max_issues: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            reject_on_invalid: true,
            max_issues: 100,
        }
    }
}

impl ValidationOptions {
    /// Create options that collect issues without rejecting.
    pub fn collect_all() -> Self {
        Self {
            reject_on_invalid: false,
            max_issues: 1000,
        }
    }
}

/// Result of mesh data validation.
#[derive(Debug, Clone, Default)]
pub struct DataValidationResult {
    /// Issues in the order they were found.
    pub issues: Vec<ValidationIssue>,
    /// Number of out-of-range vertex indices.
    pub invalid_index_count: usize,
    /// Number of NaN coordinates.
    pub nan_count: usize,
    /// Number of infinite coordinates.
    pub infinity_count: usize,
    /// Number of faces that use a vertex twice.
    pub repeated_vertex_count: usize,
}

impl DataValidationResult {
    /// Check if validation passed with no issues.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Get total number of issues found.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

impl std::fmt::Display for DataValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return write!(f, "Data validation passed: no issues found");
        }
        writeln!(f, "Data validation found {} issue(s):", self.issue_count())?;
        for (count, label) in [
            (self.invalid_index_count, "invalid vertex indices"),
            (self.nan_count, "NaN coordinates"),
            (self.infinity_count, "infinite coordinates"),
            (self.repeated_vertex_count, "faces with a repeated vertex"),
        ] {
            if count > 0 {
                writeln!(f, "  - {} {}", count, label)?;
            }
        }
        Ok(())
    }
}

/// Check coordinates and face indices.
///
/// Checks, in this order: every coordinate is finite, every face index is
/// in range, and no face uses the same vertex twice.
///
/// # Errors
/// With `reject_on_invalid`, the first issue becomes
/// [`MeshError::InvalidCoordinate`], [`MeshError::InvalidVertexIndex`] or
/// [`MeshError::InvalidTopology`].
///
/// # Example
/// ```
/// use mesh_inpaint::{Mesh, validate::{validate_mesh_data, ValidationOptions}};
///
/// let mesh = Mesh::from_positions(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 7]],
/// );
/// let result = validate_mesh_data(&mesh, &ValidationOptions::collect_all()).unwrap();
/// assert_eq!(result.invalid_index_count, 1);
/// ```
pub fn validate_mesh_data(
    mesh: &Mesh,
    options: &ValidationOptions,
) -> MeshResult<DataValidationResult> {
    let mut result = DataValidationResult::default();
    let vertex_count = mesh.vertices.len();

    'vertices: for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        let p = vertex.position;
        for (coordinate, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
            if value.is_finite() {
                continue;
            }
            if options.reject_on_invalid {
                return Err(MeshError::invalid_coordinate(vertex_index, coordinate, value));
            }
            if value.is_nan() {
                result.nan_count += 1;
                result.issues.push(ValidationIssue::NaNCoordinate {
                    vertex_index,
                    coordinate,
                });
            } else {
                result.infinity_count += 1;
                result.issues.push(ValidationIssue::InfiniteCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                });
            }
            if result.issues.len() >= options.max_issues {
                break 'vertices;
            }
        }
    }

    for (face_index, face) in mesh.faces.iter().enumerate() {
        if result.issues.len() >= options.max_issues {
            break;
        }

        let mut in_range = true;
        for &vertex_index in face {
            if vertex_index as usize >= vertex_count {
                if options.reject_on_invalid {
                    return Err(MeshError::invalid_vertex_index(
                        face_index,
                        vertex_index,
                        vertex_count,
                    ));
                }
                in_range = false;
                result.invalid_index_count += 1;
                result.issues.push(ValidationIssue::InvalidVertexIndex {
                    face_index,
                    vertex_index,
                    vertex_count,
                });
            }
        }

        let [a, b, c] = *face;
        if in_range && (a == b || b == c || a == c) {
            if options.reject_on_invalid {
                return Err(MeshError::invalid_topology(
                    format!("face {} uses the same vertex twice: {:?}", face_index, face),
                    None,
                ));
            }
            result.repeated_vertex_count += 1;
            result
                .issues
                .push(ValidationIssue::RepeatedVertex { face_index });
        }
    }
    result.issues.truncate(options.max_issues);

    if result.is_valid() {
        debug!("Mesh data validation passed");
    } else {
        warn!(
            "Mesh data validation found {} issue(s): {} invalid indices, {} NaN, {} Inf, {} repeated",
            result.issue_count(),
            result.invalid_index_count,
            result.nan_count,
            result.infinity_count,
            result.repeated_vertex_count
        );
    }

    Ok(result)
}

/// Validate mesh data with default options (rejects on first error).
pub fn validate_mesh_data_strict(mesh: &Mesh) -> MeshResult<()> {
    validate_mesh_data(mesh, &ValidationOptions::default())?;
    Ok(())
}

/// Require an edge-manifold, consistently oriented surface.
///
/// The reported edge is the smallest offending one.
///
/// # Errors
/// [`MeshError::InvalidTopology`] naming the first non-manifold or
/// inconsistently oriented edge.
pub fn validate_topology(mesh: &Mesh) -> MeshResult<()> {
    let adjacency = MeshAdjacency::build(&mesh.faces);

    let mut non_manifold: Vec<(u32, u32)> = adjacency.non_manifold_edges().collect();
    non_manifold.sort_unstable();
    if let Some(&edge) = non_manifold.first() {
        let faces = adjacency.faces_for_edge(edge.0, edge.1).map_or(0, |f| f.len());
        return Err(MeshError::invalid_topology(
            format!(
                "{} non-manifold edges; edge {:?} is shared by {} faces",
                non_manifold.len(),
                edge,
                faces
            ),
            Some(edge),
        ));
    }

    let inconsistent = adjacency.inconsistent_edges(&mesh.faces);
    if let Some(&edge) = inconsistent.first() {
        return Err(MeshError::invalid_topology(
            format!(
                "{} edges have inconsistent face winding, first {:?}",
                inconsistent.len(),
                edge
            ),
            Some(edge),
        ));
    }

    Ok(())
}

/// Everything the filling pipeline needs from its input.
///
/// # Errors
/// [`MeshError::EmptyMesh`] for a mesh without faces, otherwise the errors
/// of [`validate_mesh_data_strict`] and [`validate_topology`].
pub fn validate_input(mesh: &Mesh) -> MeshResult<()> {
    if mesh.faces.is_empty() {
        return Err(MeshError::empty_mesh(format!(
            "mesh has {} vertices and no faces",
            mesh.vertices.len()
        )));
    }
    validate_mesh_data_strict(mesh)?;
    validate_topology(mesh)
}
