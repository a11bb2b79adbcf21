//! Harmonic and biharmonic fairing of the filled region.
//!
//! Vertices that came from the patch are free; every other vertex is pinned
//! at its welded position. Free positions minimise the discrete energy
//! `xᵀ Q x` with `Q = K (M⁻¹ K)^(k-1)`, where `K` is the cotangent stiffness
//! matrix and `M` the lumped mass matrix. Order `k = 1` gives a membrane
//! (harmonic) fill, `k = 2` a thin plate (biharmonic) fill.
//!
//! The constrained minimiser solves `Q_ff x_f = -Q_fb x_b` for all three
//! coordinate columns with one sparse Cholesky factorisation.

use std::collections::VecDeque;

use nalgebra::{DMatrix, Point3};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::Mesh;

/// Lumped mass matrix flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum MassMatrix {
    /// Mixed Voronoi areas, falling back to area splits on obtuse triangles.
    #[default]
    Voronoi,
    /// One third of each incident triangle's area.
    Barycentric,
}

/// Parameters for fairing.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FairingParams {
    /// Power of the Laplacian in the energy.
    /// Default: 2 (biharmonic)
    pub order: usize,
    /// Mass matrix used between Laplacian applications.
    /// Default: `Voronoi`
    pub mass: MassMatrix,
    /// Largest accepted relative residual of the free system.
    /// Default: 1e-6
    pub residual_tolerance: f64,
}

impl Default for FairingParams {
    fn default() -> Self {
        Self {
            order: 2,
            mass: MassMatrix::default(),
            residual_tolerance: 1e-6,
        }
    }
}

impl FairingParams {
    /// Membrane energy: smallest stencil, creased seam.
    pub fn harmonic() -> Self {
        Self {
            order: 1,
            ..Default::default()
        }
    }

    /// Thin plate energy.
    pub fn biharmonic() -> Self {
        Self::default()
    }

    /// Params with the given Laplacian power.
    pub fn with_order(order: usize) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> MeshResult<()> {
        if self.order == 0 {
            return Err(MeshError::invalid_argument(
                "fairing.order",
                "must be at least 1",
            ));
        }
        if !(self.residual_tolerance.is_finite() && self.residual_tolerance > 0.0) {
            return Err(MeshError::invalid_argument(
                "fairing.residual_tolerance",
                format!(
                    "must be positive and finite, got {}",
                    self.residual_tolerance
                ),
            ));
        }
        Ok(())
    }
}

/// Result of fairing.
#[derive(Debug, Clone)]
pub struct FairingResult {
    /// Mesh with free vertices moved; topology unchanged.
    pub mesh: Mesh,
    /// Number of vertices solved for.
    pub free_vertices: usize,
    /// Number of pinned vertices.
    pub fixed_vertices: usize,
    /// Relative residual `‖Q_ff x_f + Q_fb x_b‖ / ‖Q_fb x_b‖` of the solve.
    pub residual: f64,
    /// Largest distance any free vertex moved.
    pub max_displacement: f64,
}

/// Per-face operator contributions.
///
/// `cot[c]` is the cotangent of the angle at corner `c`, which weights the
/// edge opposite that corner.
#[derive(Debug, Clone, Copy)]
struct FaceTerms {
    cot: [f64; 3],
    voronoi: [f64; 3],
    area: f64,
}

fn face_terms(p: [Point3<f64>; 3]) -> Option<FaceTerms> {
    let e = [p[2] - p[1], p[0] - p[2], p[1] - p[0]];
    let len_sq = [e[0].norm_squared(), e[1].norm_squared(), e[2].norm_squared()];
    let max_len_sq = len_sq[0].max(len_sq[1]).max(len_sq[2]);
    let double_area = e[2].cross(&(-e[1])).norm();

    // Zero-length edges or collinear corners leave the angles undefined.
    if !(double_area.is_finite() && double_area > f64::EPSILON * max_len_sq)
        || len_sq.iter().any(|&l| l <= f64::MIN_POSITIVE)
    {
        return None;
    }

    let mut cot = [0.0; 3];
    for c in 0..3 {
        // Edges leaving corner c.
        let a = -e[(c + 1) % 3];
        let b = e[(c + 2) % 3];
        cot[c] = a.dot(&b) / double_area;
    }

    let area = 0.5 * double_area;
    let voronoi = if let Some(obtuse) = cot.iter().position(|&c| c < 0.0) {
        let mut split = [area / 4.0; 3];
        split[obtuse] = area / 2.0;
        split
    } else {
        // Corner c sees edges (c, c+1) and (c, c+2) opposite corners c+2 and c+1.
        let mut split = [0.0; 3];
        for c in 0..3 {
            let n1 = (c + 1) % 3;
            let n2 = (c + 2) % 3;
            split[c] = (len_sq[n2] * cot[n2] + len_sq[n1] * cot[n1]) / 8.0;
        }
        split
    };

    Some(FaceTerms { cot, voronoi, area })
}

fn compute_face_terms(mesh: &Mesh) -> Vec<Option<FaceTerms>> {
    mesh.faces
        .par_iter()
        .map(|&[a, b, c]| {
            face_terms([
                mesh.vertices[a as usize].position,
                mesh.vertices[b as usize].position,
                mesh.vertices[c as usize].position,
            ])
        })
        .collect()
}

fn assemble_stiffness(mesh: &Mesh, terms: &[Option<FaceTerms>]) -> CsrMatrix<f64> {
    let n = mesh.vertices.len();
    let mut coo = CooMatrix::new(n, n);

    for (&face, t) in mesh.faces.iter().zip(terms) {
        let Some(t) = t else { continue };
        for c in 0..3 {
            let i = face[(c + 1) % 3] as usize;
            let j = face[(c + 2) % 3] as usize;
            let w = 0.5 * t.cot[c];
            coo.push(i, j, -w);
            coo.push(j, i, -w);
            coo.push(i, i, w);
            coo.push(j, j, w);
        }
    }

    CsrMatrix::from(&coo)
}

fn assemble_mass(mesh: &Mesh, terms: &[Option<FaceTerms>], kind: MassMatrix) -> Vec<f64> {
    let mut mass = vec![0.0; mesh.vertices.len()];
    for (&face, t) in mesh.faces.iter().zip(terms) {
        let Some(t) = t else { continue };
        for c in 0..3 {
            mass[face[c] as usize] += match kind {
                MassMatrix::Voronoi => t.voronoi[c],
                MassMatrix::Barycentric => t.area / 3.0,
            };
        }
    }
    mass
}

/// Cotangent stiffness matrix `K` (positive semidefinite, rows sum to zero).
///
/// Faces with undefined angles contribute nothing.
pub fn cotangent_stiffness(mesh: &Mesh) -> CsrMatrix<f64> {
    assemble_stiffness(mesh, &compute_face_terms(mesh))
}

/// Diagonal of the lumped mass matrix.
pub fn lumped_mass(mesh: &Mesh, kind: MassMatrix) -> Vec<f64> {
    assemble_mass(mesh, &compute_face_terms(mesh), kind)
}

/// `Q = K (M⁻¹ K)^(order-1)`.
fn energy_matrix(stiffness: &CsrMatrix<f64>, mass: &[f64], order: usize) -> CsrMatrix<f64> {
    if order <= 1 {
        return stiffness.clone();
    }

    let mut scaled = stiffness.clone();
    for (row, mut lane) in scaled.row_iter_mut().enumerate() {
        let inv = if mass[row] > 0.0 { 1.0 / mass[row] } else { 0.0 };
        for v in lane.values_mut() {
            *v *= inv;
        }
    }

    let mut q = stiffness.clone();
    for _ in 1..order {
        q = &q * &scaled;
    }
    q
}

/// Free-vertex neighbour lists from the off-diagonal pattern of `q`.
fn free_graph(q: &CsrMatrix<f64>, free: usize) -> Vec<Vec<usize>> {
    (0..free)
        .map(|row| {
            q.row(row)
                .col_indices()
                .iter()
                .copied()
                .filter(|&col| col < free && col != row)
                .collect()
        })
        .collect()
}

/// Free vertices with no operator path to a pinned vertex.
fn unanchored_free_vertices(q: &CsrMatrix<f64>, free: usize) -> Vec<usize> {
    let mut reached = vec![false; free];
    let mut queue = VecDeque::new();

    for row in 0..free {
        if q.row(row).col_indices().iter().any(|&col| col >= free) {
            reached[row] = true;
            queue.push_back(row);
        }
    }

    while let Some(v) = queue.pop_front() {
        for &col in q.row(v).col_indices() {
            if col < free && !reached[col] {
                reached[col] = true;
                queue.push_back(col);
            }
        }
    }

    (0..free).filter(|&v| !reached[v]).collect()
}

/// Reverse Cuthill-McKee ordering; `order[position] = vertex`.
fn reverse_cuthill_mckee(graph: &[Vec<usize>]) -> Vec<usize> {
    let n = graph.len();
    let degree = |v: usize| graph[v].len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut by_degree: Vec<usize> = (0..n).collect();
    by_degree.sort_by_key(|&v| (degree(v), v));

    for &seed in &by_degree {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut queue = VecDeque::from([seed]);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            let mut next: Vec<usize> = graph[v].iter().copied().filter(|&u| !visited[u]).collect();
            next.sort_by_key(|&u| (degree(u), u));
            next.dedup();
            for u in next {
                visited[u] = true;
                queue.push_back(u);
            }
        }
    }

    order.reverse();
    order
}

/// Fair the patch region of a welded mesh.
///
/// Vertices `0..patch_vertex_count` are free, the rest are pinned and
/// copied through untouched.
///
/// # Errors
/// - [`MeshError::InvalidArgument`] for bad parameters or a patch range
///   larger than the mesh.
/// - [`MeshError::DegenerateGeometry`] if a vertex used by the operator has
///   zero lumped mass.
/// - [`MeshError::LinearSolve`] if some free vertex is not connected to a
///   pinned one, factorisation fails, or the solution is not accurate.
pub fn fair(mesh: &Mesh, patch_vertex_count: usize, params: &FairingParams) -> MeshResult<FairingResult> {
    params.validate()?;

    let n = mesh.vertices.len();
    if patch_vertex_count > n {
        return Err(MeshError::invalid_argument(
            "patch_vertex_count",
            format!("{} exceeds the {} vertices of the mesh", patch_vertex_count, n),
        ));
    }
    if let Some((face_index, &bad)) = mesh
        .faces
        .iter()
        .enumerate()
        .find_map(|(fi, f)| f.iter().find(|&&v| v as usize >= n).map(|v| (fi, v)))
    {
        return Err(MeshError::invalid_vertex_index(face_index, bad, n));
    }

    let free = patch_vertex_count;
    let fixed = n - free;

    if free == 0 {
        debug!("No free vertices; fairing is a no-op");
        return Ok(FairingResult {
            mesh: mesh.clone(),
            free_vertices: 0,
            fixed_vertices: fixed,
            residual: 0.0,
            max_displacement: 0.0,
        });
    }
    if fixed == 0 {
        return Err(MeshError::linear_solve(format!(
            "all {} vertices are free; at least one pinned vertex is required",
            n
        )));
    }

    let terms = compute_face_terms(mesh);
    let skipped = terms.iter().filter(|t| t.is_none()).count();
    if skipped > 0 {
        warn!("{} degenerate faces excluded from the fairing operator", skipped);
    }

    let stiffness = assemble_stiffness(mesh, &terms);
    let mass = if params.order > 1 {
        let mass = assemble_mass(mesh, &terms, params.mass);
        let mut used = vec![false; n];
        for face in &mesh.faces {
            for &v in face {
                used[v as usize] = true;
            }
        }
        if let Some(v) = (0..n).find(|&v| used[v] && mass[v] <= 0.0) {
            return Err(MeshError::degenerate_vertex(
                v,
                format!("vertex {} has zero lumped mass", v),
            ));
        }
        mass
    } else {
        Vec::new()
    };

    let q = energy_matrix(&stiffness, &mass, params.order);
    debug!(
        order = params.order,
        nnz = q.nnz(),
        free = free,
        fixed = fixed,
        "Assembled fairing operator"
    );

    let unanchored = unanchored_free_vertices(&q, free);
    if let Some(&first) = unanchored.first() {
        return Err(MeshError::linear_solve(format!(
            "{} free vertices (first: {}) are not connected to any pinned vertex",
            unanchored.len(),
            first
        )));
    }

    let order = reverse_cuthill_mckee(&free_graph(&q, free));
    let mut rank = vec![0usize; free];
    for (position, &v) in order.iter().enumerate() {
        rank[v] = position;
    }

    let mut coo = CooMatrix::new(free, free);
    let mut rhs = DMatrix::<f64>::zeros(free, 3);
    for row in 0..free {
        let lane = q.row(row);
        let r = rank[row];
        for (&col, &val) in lane.col_indices().iter().zip(lane.values()) {
            if col < free {
                // Symmetrise: (Q + Qᵀ) / 2.
                let c = rank[col];
                coo.push(r, c, 0.5 * val);
                coo.push(c, r, 0.5 * val);
            } else {
                let p = mesh.vertices[col].position;
                for axis in 0..3 {
                    rhs[(r, axis)] -= val * p[axis];
                }
            }
        }
    }

    let system = CscMatrix::from(&coo);
    let factor = CscCholesky::factor(&system).map_err(|e| {
        MeshError::linear_solve(format!(
            "Cholesky factorisation of the {}x{} free system failed: {:?}",
            free, free, e
        ))
    })?;
    let solution = factor.solve(&rhs);

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(MeshError::linear_solve("solution contains non-finite values"));
    }

    let residual_vec = &system * &solution - &rhs;
    let rhs_norm = rhs.norm();
    let residual = if rhs_norm > 0.0 {
        residual_vec.norm() / rhs_norm
    } else {
        residual_vec.norm()
    };
    if !(residual <= params.residual_tolerance) {
        return Err(MeshError::linear_solve(format!(
            "relative residual {:.3e} exceeds tolerance {:.3e}",
            residual, params.residual_tolerance
        )));
    }

    let mut faired = mesh.clone();
    let mut max_displacement: f64 = 0.0;
    for v in 0..free {
        let r = rank[v];
        let new_pos = Point3::new(solution[(r, 0)], solution[(r, 1)], solution[(r, 2)]);
        max_displacement = max_displacement.max((new_pos - mesh.vertices[v].position).norm());
        faired.vertices[v].position = new_pos;
    }

    info!(
        "Faired {} free vertices against {} pinned (order {}, residual {:.2e}, max move {:.4})",
        free, fixed, params.order, residual, max_displacement
    );

    Ok(FairingResult {
        mesh: faired,
        free_vertices: free,
        fixed_vertices: fixed,
        residual,
        max_displacement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holes::extract_boundary_loop;
    use crate::patch::build_upsampled_patch;
    use crate::subdivide::upsample_mesh;
    use crate::weld::{weld, WeldParams};
    use crate::Vertex;
    use approx::assert_relative_eq;

    /// `n x n` vertex grid on the unit square, vertex `first` moved to index 0.
    fn grid_with_first(n: usize, first: usize) -> Mesh {
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
                let b = a + 1;
                let c = a + n as u32 + 1;
                let d = a + n as u32;
                faces.push([a, b, c]);
                faces.push([a, c, d]);
            }
        }

        positions.swap(0, first);
        let swap = |v: u32| {
            if v as usize == first {
                0
            } else if v == 0 {
                first as u32
            } else {
                v
            }
        };
        let faces: Vec<[u32; 3]> = faces.into_iter().map(|f| f.map(swap)).collect();
        Mesh::from_positions(&positions, &faces)
    }

    fn open_box_mesh() -> Mesh {
        Mesh::from_positions(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
            &[
                [0, 2, 1],
                [0, 3, 2],
                [0, 1, 5],
                [0, 5, 4],
                [1, 2, 6],
                [1, 6, 5],
                [2, 3, 7],
                [2, 7, 6],
                [3, 0, 4],
                [3, 4, 7],
            ],
        )
    }

    fn filled_box(level: usize) -> (Mesh, usize) {
        let mesh = open_box_mesh();
        let boundary = extract_boundary_loop(&mesh).unwrap().boundary;
        let upsampled = upsample_mesh(&mesh, level).mesh;
        let patch = build_upsampled_patch(&mesh, &boundary, level).unwrap();
        let welded = weld(&patch.mesh, &upsampled, &WeldParams::default()).unwrap();
        (welded.mesh, welded.patch_vertex_count)
    }

    #[test]
    fn test_stiffness_rows_sum_to_zero() {
        let mesh = grid_with_first(4, 5);
        let k = cotangent_stiffness(&mesh);
        for row in k.row_iter() {
            let sum: f64 = row.values().iter().sum();
            assert!(sum.abs() < 1e-12);
        }
        let dense = DMatrix::from(&k);
        for i in 0..dense.nrows() {
            for j in 0..dense.ncols() {
                assert_relative_eq!(dense[(i, j)], dense[(j, i)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_mass_sums_to_area() {
        let (mesh, _) = filled_box(1);
        let area = mesh.surface_area();
        for kind in [MassMatrix::Voronoi, MassMatrix::Barycentric] {
            let total: f64 = lumped_mass(&mesh, kind).iter().sum();
            assert_relative_eq!(total, area, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_face_contributes_nothing() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(face_terms([p, p, Point3::new(0.0, 0.0, 0.0)]).is_none());
        assert!(
            face_terms([
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0)
            ])
            .is_none()
        );
    }

    #[test]
    fn test_right_triangle_cotangents() {
        let t = face_terms([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        assert_relative_eq!(t.cot[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.cot[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.cot[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.voronoi.iter().sum::<f64>(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_no_free_vertices_is_noop() {
        let mesh = grid_with_first(3, 0);
        let result = fair(&mesh, 0, &FairingParams::default()).unwrap();
        assert_eq!(result.mesh, mesh);
        assert_eq!(result.free_vertices, 0);
        assert_eq!(result.fixed_vertices, 9);
    }

    #[test]
    fn test_bump_is_flattened() {
        // Center of a 7x7 grid is index 24; its 2-ring stays off the rim.
        for order in 1..=3 {
            let mut mesh = grid_with_first(7, 24);
            mesh.vertices[0].position = Point3::new(0.4, 0.55, 1.0);

            let result = fair(&mesh, 1, &FairingParams::with_order(order)).unwrap();
            // Weights come from the bumped geometry, so only the height is
            // pinned down: every fixed neighbour lies in z = 0.
            let p = result.mesh.vertices[0].position;
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
            assert!(p.x.is_finite() && p.y.is_finite());
            assert!(result.residual <= 1e-9);
            assert!(result.max_displacement > 0.9);
            for v in 1..mesh.vertex_count() {
                assert_eq!(result.mesh.vertices[v], mesh.vertices[v]);
            }
        }
    }

    #[test]
    fn test_fixed_vertices_bit_identical() {
        let (mesh, patch_count) = filled_box(2);
        let result = fair(&mesh, patch_count, &FairingParams::default()).unwrap();

        assert_eq!(result.free_vertices, patch_count);
        assert_eq!(result.fixed_vertices, mesh.vertex_count() - patch_count);
        for v in patch_count..mesh.vertex_count() {
            assert_eq!(
                result.mesh.vertices[v].position.coords.map(f64::to_bits),
                mesh.vertices[v].position.coords.map(f64::to_bits)
            );
        }
        assert_eq!(result.mesh.faces, mesh.faces);
        assert!(result.residual <= 1e-6);
    }

    #[test]
    fn test_filled_box_cap_rises_above_walls() {
        let (mesh, patch_count) = filled_box(2);
        let result = fair(&mesh, patch_count, &FairingParams::default()).unwrap();
        assert!(
            result
                .mesh
                .vertices
                .iter()
                .all(|v| v.position.coords.iter().all(|c| c.is_finite()))
        );
        // Highest pinned wall row sits at z = 0.75.
        let top = result.mesh.vertices[..patch_count]
            .iter()
            .map(|v| v.position.z)
            .fold(f64::MIN, f64::max);
        assert!(top > 0.75);
    }

    #[test]
    fn test_all_free_is_rejected() {
        let mesh = grid_with_first(3, 0);
        let err = fair(&mesh, 9, &FairingParams::default()).unwrap_err();
        assert!(matches!(err, MeshError::LinearSolve { .. }));
    }

    #[test]
    fn test_disconnected_free_component_is_rejected() {
        let mesh = Mesh::from_positions(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [5.0, 0.0, 0.0],
                [6.0, 0.0, 0.0],
                [5.0, 1.0, 0.0],
            ],
            &[[0, 1, 2], [3, 4, 5]],
        );
        let err = fair(&mesh, 3, &FairingParams::harmonic()).unwrap_err();
        assert!(matches!(err, MeshError::LinearSolve { .. }));
    }

    #[test]
    fn test_zero_mass_vertex_is_degenerate() {
        let mut mesh = grid_with_first(4, 5);
        let last = (mesh.vertex_count() - 1) as u32;
        let dup = mesh.vertices[last as usize];
        mesh.vertices.push(dup);
        mesh.vertices.push(Vertex::from_coords(3.0, 3.0, 0.0));
        mesh.faces.push([last, last + 1, last + 2]);

        let err = fair(&mesh, 1, &FairingParams::biharmonic()).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateGeometry { .. }));

        // The membrane energy needs no mass matrix.
        assert!(fair(&mesh, 1, &FairingParams::harmonic()).is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let mesh = grid_with_first(3, 4);
        assert!(matches!(
            fair(&mesh, 1, &FairingParams::with_order(0)).unwrap_err(),
            MeshError::InvalidArgument { .. }
        ));
        assert!(matches!(
            fair(&mesh, 10, &FairingParams::default()).unwrap_err(),
            MeshError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_rcm_is_permutation() {
        let graph = vec![vec![1], vec![0, 2], vec![1, 3], vec![2], vec![]];
        let mut order = reverse_cuthill_mckee(&graph);
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
