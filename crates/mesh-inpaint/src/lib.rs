//! Hole filling for triangle meshes.
//!
//! Given a manifold triangle mesh with an open boundary loop, this crate
//! closes the hole with a patch that blends into the surrounding surface,
//! then simplifies the result to a face budget.
//!
//! # Pipeline
//!
//! 1. **Extract** the boundary loop bounding the hole ([`extract_boundary_loop`])
//! 2. **Upsample** the mesh by midpoint subdivision ([`upsample_mesh`])
//! 3. **Build** a fan patch over the loop and upsample it the same way
//!    ([`build_upsampled_patch`])
//! 4. **Weld** patch and mesh into one mesh ([`weld`])
//! 5. **Fair** the patch vertices by a constrained biharmonic solve ([`fair`])
//! 6. **Decimate** to the face budget by greedy edge collapse ([`decimate_mesh`])
//!
//! [`inpaint_mesh`] runs all of them; each stage is also usable on its own.
//!
//! # Coordinate System
//!
//! Face winding is **counter-clockwise (CCW) when viewed from outside** the
//! mesh, so normals point outward by the right-hand rule. The patch is built
//! to agree with the winding of the faces around the hole.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_inpaint::{InpaintParams, Mesh, inpaint_mesh};
//!
//! let mesh = Mesh::load("scan_with_hole.obj").unwrap();
//!
//! let params = InpaintParams::default()
//!     .with_upsample_level(2)
//!     .with_target_faces(20_000);
//! let result = inpaint_mesh(&mesh, &params).unwrap();
//!
//! println!(
//!     "Filled a {}-vertex hole; {} faces",
//!     result.stats.loop_len, result.stats.final_faces
//! );
//! result.mesh.save("filled.obj").unwrap();
//! ```
//!
//! # Running Stages Individually
//!
//! ```
//! use mesh_inpaint::{
//!     FairingParams, Mesh, WeldParams, build_upsampled_patch, extract_boundary_loop, fair,
//!     upsample_mesh, weld,
//! };
//!
//! // Tetrahedron with its bottom face missing.
//! let mesh = Mesh::from_positions(
//!     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.866, 0.0], [0.5, 0.289, 0.816]],
//!     &[[0, 1, 3], [1, 2, 3], [2, 0, 3]],
//! );
//!
//! let hole = extract_boundary_loop(&mesh).unwrap();
//! assert_eq!(hole.boundary.len(), 3);
//!
//! let upsampled = upsample_mesh(&mesh, 1).mesh;
//! let patch = build_upsampled_patch(&mesh, &hole.boundary, 1).unwrap();
//! let fused = weld(&patch.mesh, &upsampled, &WeldParams::default()).unwrap();
//! assert!(fused.mesh.is_closed());
//!
//! let faired = fair(&fused.mesh, fused.patch_vertex_count, &FairingParams::default()).unwrap();
//! assert_eq!(faired.mesh.face_count(), 16);
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return `MeshResult<T>`, which is `Result<T, MeshError>`.
//! Every error carries a `MESH-XXXX` code and a recovery suggestion.
//!
//! ```
//! use mesh_inpaint::{ErrorCode, InpaintParams, Mesh, MeshError, inpaint_mesh};
//!
//! // A closed tetrahedron has nothing to fill.
//! let mesh = Mesh::from_positions(
//!     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.866, 0.0], [0.5, 0.289, 0.816]],
//!     &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
//! );
//!
//! match inpaint_mesh(&mesh, &InpaintParams::default()) {
//!     Err(e @ MeshError::NoHole { .. }) => assert_eq!(e.code(), ErrorCode::NoHole),
//!     other => panic!("expected NoHole, got {:?}", other),
//! }
//! ```
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Index Preservation | Notes |
//! |--------|-----------|------|------|-------------------|-------|
//! | OBJ    | `.obj`    | ✓    | ✓    | ✓                 | ASCII; UVs and normals ignored |
//! | STL    | `.stl`    | ✓    | ✓    | ✗                 | Binary & ASCII in, binary out |
//!
//! # Features
//!
//! - `pipeline-config`: serde support for every parameter struct and
//!   TOML/JSON loading of [`InpaintParams`].

mod error;
mod pipeline;
pub mod tracing_ext;
mod types;

pub mod adjacency;
pub mod decimate;
pub mod fairing;
pub mod holes;
pub mod io;
pub mod patch;
pub mod subdivide;
pub mod validate;
pub mod weld;

// Re-export core types at crate root
pub use error::{
    ErrorCode, MeshError, MeshLocation, MeshResult, RecoverySuggestion, ValidationIssue,
};
pub use types::{Mesh, Triangle, Vertex};

pub use adjacency::MeshAdjacency;

pub use io::{MeshFormat, load_mesh, save_mesh, save_mesh_as, save_obj, save_stl};

// Pipeline stages
pub use decimate::{CollapseCost, DecimateParams, DecimateResult, decimate_mesh};
pub use fairing::{FairingParams, FairingResult, MassMatrix, fair};
pub use holes::{BoundaryLoop, LoopExtraction, detect_holes, extract_boundary_loop};
pub use patch::{Patch, build_patch, build_upsampled_patch};
pub use subdivide::{UpsampleResult, upsample_mesh};
pub use weld::{WeldMap, WeldParams, WeldResult, WeldStrategy, weld};

pub use pipeline::{InpaintParams, InpaintResult, InpaintStats, inpaint_file, inpaint_mesh};
#[cfg(feature = "pipeline-config")]
pub use pipeline::ConfigError;

pub use validate::{
    DataValidationResult, MeshReport, ValidationOptions, report_mesh, validate_input,
    validate_mesh_data, validate_mesh_data_strict, validate_topology,
};

pub use tracing_ext::{
    OperationTimer, log_io_operation, log_mesh_stats, log_mesh_stats_detailed, log_report,
};

// Convenience methods on Mesh
impl Mesh {
    /// Load a mesh from a file, auto-detecting format from extension.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        io::load_mesh(path.as_ref())
    }

    /// Save the mesh to a file, auto-detecting format from extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        io::save_mesh(self, path.as_ref())
    }

    /// Summarize topology and extent.
    pub fn report(&self) -> MeshReport {
        validate::report_mesh(self)
    }

    /// No boundary edges, no non-manifold edges, consistent winding.
    pub fn is_closed(&self) -> bool {
        let adjacency = MeshAdjacency::build(&self.faces);
        adjacency.is_watertight()
            && adjacency.is_manifold()
            && adjacency.inconsistent_edges(&self.faces).is_empty()
    }

    /// Upsample by `level` rounds of midpoint subdivision.
    pub fn upsample(&self, level: usize) -> Mesh {
        subdivide::upsample_mesh(self, level).mesh
    }

    /// Decimate to at most `target` faces with default parameters.
    pub fn decimate_to_count(&self, target: usize) -> MeshResult<DecimateResult> {
        decimate::decimate_mesh(self, &DecimateParams::with_target_triangles(target))
    }

    /// Fill the hole in this mesh.
    ///
    /// See [`inpaint_mesh`].
    pub fn inpaint(&self, params: &InpaintParams) -> MeshResult<InpaintResult> {
        pipeline::inpaint_mesh(self, params)
    }
}
