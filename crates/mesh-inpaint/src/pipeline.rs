//! The hole-filling pipeline.
//!
//! [`inpaint_mesh`] runs, in order: input validation, boundary loop
//! extraction, upsampling of the mesh, patch construction and upsampling,
//! welding, fairing and decimation. The first failing stage aborts the run.
//!
//! # Example
//!
//! ```
//! use mesh_inpaint::{InpaintParams, Mesh, inpaint_mesh};
//!
//! // A unit cube without its top.
//! let mesh = Mesh::from_positions(
//!     &[
//!         [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
//!         [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0],
//!     ],
//!     &[
//!         [0, 2, 1], [0, 3, 2], [0, 1, 5], [0, 5, 4], [1, 2, 6],
//!         [1, 6, 5], [2, 3, 7], [2, 7, 6], [3, 0, 4], [3, 4, 7],
//!     ],
//! );
//!
//! let result = inpaint_mesh(&mesh, &InpaintParams::default().with_upsample_level(1)).unwrap();
//! assert_eq!(result.stats.loop_len, 4);
//! assert_eq!(result.mesh.face_count(), 4 * 10 + 4 * 4);
//! ```

use std::path::Path;

use tracing::{info, warn};

use crate::Mesh;
use crate::decimate::{CollapseCost, DecimateParams, decimate_mesh};
use crate::error::{MeshError, MeshResult};
use crate::fairing::{FairingParams, fair};
use crate::holes::extract_boundary_loop;
use crate::io::{MeshFormat, load_mesh, save_mesh_as};
use crate::patch::build_upsampled_patch;
use crate::subdivide::upsample_mesh;
use crate::tracing_ext::{OperationTimer, log_mesh_stats, log_mesh_stats_detailed, log_report};
use crate::validate::{report_mesh, validate_input};
use crate::weld::{WeldParams, weld};

/// Parameters for every pipeline stage.
///
/// # Example TOML
///
/// ```toml
/// upsample_level = 2
/// target_faces = 5000
///
/// [weld]
/// epsilon = 1e-5
/// strategy = "spatial_hash"
///
/// [fairing]
/// order = 2
/// mass = "voronoi"
///
/// [decimate]
/// cost = "quadric"
/// preserve_boundary = false
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct InpaintParams {
    /// Rounds of midpoint subdivision applied to both mesh and patch.
    /// Default: 0
    pub upsample_level: usize,
    /// Face budget for the result. `None` falls back to
    /// `decimate.target_triangles`; if that is unset too, nothing is
    /// decimated. Default: None
    pub target_faces: Option<usize>,
    /// Welding tolerance and search strategy.
    pub weld: WeldParams,
    /// Fairing energy order and mass matrix.
    pub fairing: FairingParams,
    /// Collapse cost and boundary handling. `target_ratio` is not used by
    /// the pipeline.
    pub decimate: DecimateParams,
}

impl InpaintParams {
    /// Triharmonic fairing, for a smoother blend at the seam.
    pub fn smooth() -> Self {
        Self {
            fairing: FairingParams::with_order(3),
            ..Default::default()
        }
    }

    /// Quadric error decimation, which keeps more of the shape at a given
    /// face budget.
    pub fn quality() -> Self {
        Self {
            decimate: DecimateParams {
                cost: CollapseCost::Quadric,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Set the upsampling level.
    pub fn with_upsample_level(mut self, level: usize) -> Self {
        self.upsample_level = level;
        self
    }

    /// Set the face budget.
    pub fn with_target_faces(mut self, faces: usize) -> Self {
        self.target_faces = Some(faces);
        self
    }

    /// Set the weld tolerance.
    pub fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld.epsilon = epsilon;
        self
    }

    /// Set the fairing order (1 harmonic, 2 biharmonic, ...).
    pub fn with_fairing_order(mut self, order: usize) -> Self {
        self.fairing.order = order;
        self
    }

    /// Set the collapse cost.
    pub fn with_cost(mut self, cost: CollapseCost) -> Self {
        self.decimate.cost = cost;
        self
    }

    /// Keep boundary edges and vertices during decimation.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.decimate.preserve_boundary = preserve;
        self
    }

    /// The face budget decimation works towards, if any.
    pub fn decimation_target(&self) -> Option<usize> {
        self.target_faces.or(self.decimate.target_triangles)
    }

    /// Check every stage's parameters.
    ///
    /// # Errors
    /// [`MeshError::InvalidArgument`] naming the offending field.
    pub fn validate(&self) -> MeshResult<()> {
        self.weld.validate()?;
        self.fairing.validate()?;
        self.decimate.validate()
    }
}

#[cfg(feature = "pipeline-config")]
impl InpaintParams {
    /// Parse parameters from TOML; missing keys keep their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read parameters from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&read_config(path.as_ref())?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse parameters from JSON; missing keys keep their defaults.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a `.toml` or `.json` file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("toml") => Self::from_toml(&read_config(path)?),
            Some("json") => Self::from_json(&read_config(path)?),
            _ => Err(ConfigError::UnknownFormat(path.to_path_buf())),
        }
    }
}

#[cfg(feature = "pipeline-config")]
fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors loading or storing [`InpaintParams`].
#[cfg(feature = "pipeline-config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Invalid TOML or a value of the wrong type.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// The parameters could not be represented as TOML.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Invalid JSON or a value of the wrong type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Extension other than `.toml` or `.json`.
    #[error("unknown config format for {0}; expected .toml or .json")]
    UnknownFormat(std::path::PathBuf),
}

/// What each stage did.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "pipeline-config", derive(serde::Serialize))]
pub struct InpaintStats {
    /// Vertices in the input mesh.
    pub input_vertices: usize,
    /// Faces in the input mesh.
    pub input_faces: usize,
    /// Closed boundary loops found in the input.
    pub loops_found: usize,
    /// Vertices in the loop that was filled.
    pub loop_len: usize,
    /// Vertices after upsampling the input.
    pub upsampled_vertices: usize,
    /// Faces after upsampling the input.
    pub upsampled_faces: usize,
    /// Vertices in the upsampled patch.
    pub patch_vertices: usize,
    /// Faces in the upsampled patch.
    pub patch_faces: usize,
    /// Mesh vertices fused onto patch vertices.
    pub welded_vertices: usize,
    /// Mesh vertices appended to the fused mesh.
    pub appended_vertices: usize,
    /// Vertices moved by fairing.
    pub free_vertices: usize,
    /// Vertices held in place by fairing.
    pub fixed_vertices: usize,
    /// Relative residual of the fairing solve.
    pub fairing_residual: f64,
    /// Largest distance a free vertex moved.
    pub max_displacement: f64,
    /// Faces handed to decimation.
    pub faces_before_decimation: usize,
    /// Edge collapses performed.
    pub collapses_performed: usize,
    /// Candidate collapses rejected as illegal.
    pub collapses_rejected: usize,
    /// Vertices in the result.
    pub final_vertices: usize,
    /// Faces in the result.
    pub final_faces: usize,
}

/// The filled mesh and what it took to get there.
#[derive(Debug, Clone)]
pub struct InpaintResult {
    /// The filled, faired and decimated mesh.
    pub mesh: Mesh,
    /// Per-stage counts.
    pub stats: InpaintStats,
}

/// Fill the hole in `mesh`.
///
/// # Errors
/// - [`MeshError::InvalidArgument`] for out-of-range parameters
/// - [`MeshError::EmptyMesh`], [`MeshError::InvalidCoordinate`],
///   [`MeshError::InvalidVertexIndex`], [`MeshError::InvalidTopology`]
///   for unusable input
/// - [`MeshError::NoHole`] when no boundary loop bounds a hole
/// - [`MeshError::DegenerateGeometry`] for a loop that spans no area
/// - [`MeshError::LinearSolve`] when fairing fails
/// - [`MeshError::DecimationFailed`] if decimation loses track of a face
pub fn inpaint_mesh(mesh: &Mesh, params: &InpaintParams) -> MeshResult<InpaintResult> {
    params.validate()?;

    let _span = crate::mesh_span!("inpaint", mesh, upsample = params.upsample_level).entered();
    let level = params.upsample_level;
    let mut stats = InpaintStats {
        input_vertices: mesh.vertex_count(),
        input_faces: mesh.face_count(),
        ..Default::default()
    };

    {
        let _timer = OperationTimer::with_context("validate", mesh.face_count(), mesh.vertex_count());
        validate_input(mesh)?;
    }

    let extraction = {
        let _timer = OperationTimer::new("extract_loop");
        extract_boundary_loop(mesh)?
    };
    stats.loops_found = extraction.loops_found;
    stats.loop_len = extraction.boundary.len();

    let upsampled = {
        let _timer = OperationTimer::with_context("upsample", mesh.face_count(), mesh.vertex_count());
        upsample_mesh(mesh, level).mesh
    };
    stats.upsampled_vertices = upsampled.vertex_count();
    stats.upsampled_faces = upsampled.face_count();
    log_mesh_stats(&upsampled, "upsampled");

    let patch = {
        let _timer = OperationTimer::new("build_patch");
        build_upsampled_patch(mesh, &extraction.boundary, level)?
    };
    stats.patch_vertices = patch.mesh.vertex_count();
    stats.patch_faces = patch.mesh.face_count();

    let welded = {
        let _timer = OperationTimer::with_context(
            "weld",
            patch.mesh.face_count() + upsampled.face_count(),
            patch.mesh.vertex_count() + upsampled.vertex_count(),
        );
        weld(&patch.mesh, &upsampled, &params.weld)?
    };
    drop(upsampled);
    stats.welded_vertices = welded.welded_vertices;
    stats.appended_vertices = welded.appended_vertices;
    log_mesh_stats(&welded.mesh, "welded");

    let faired = {
        let _timer =
            OperationTimer::with_context("fair", welded.mesh.face_count(), welded.mesh.vertex_count());
        fair(&welded.mesh, welded.patch_vertex_count, &params.fairing)?
    };
    drop(welded);
    stats.free_vertices = faired.free_vertices;
    stats.fixed_vertices = faired.fixed_vertices;
    stats.fairing_residual = faired.residual;
    stats.max_displacement = faired.max_displacement;
    stats.faces_before_decimation = faired.mesh.face_count();

    let result_mesh = match params.decimation_target() {
        Some(target) => {
            let _timer = OperationTimer::with_context(
                "decimate",
                faired.mesh.face_count(),
                faired.mesh.vertex_count(),
            );
            let decimate_params = DecimateParams {
                target_triangles: Some(target),
                ..params.decimate.clone()
            };
            let decimated = decimate_mesh(&faired.mesh, &decimate_params)?;
            stats.collapses_performed = decimated.collapses_performed;
            stats.collapses_rejected = decimated.collapses_rejected;
            if decimated.final_triangles > target {
                warn!(
                    "Decimation stopped at {} faces, above the target of {}",
                    decimated.final_triangles, target
                );
            }
            decimated.mesh
        }
        None => faired.mesh,
    };

    stats.final_vertices = result_mesh.vertex_count();
    stats.final_faces = result_mesh.face_count();
    log_mesh_stats_detailed(&result_mesh, "result");
    log_report(&report_mesh(&result_mesh), "result");
    info!(
        loop_len = stats.loop_len,
        final_vertices = stats.final_vertices,
        final_faces = stats.final_faces,
        "Hole filled"
    );

    Ok(InpaintResult {
        mesh: result_mesh,
        stats,
    })
}

/// Load `input`, fill its hole and write the result to `output`.
///
/// The result is written next to `output` under a temporary name and
/// renamed into place, so `output` is never left half-written and is not
/// touched at all when a stage fails.
pub fn inpaint_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    params: &InpaintParams,
) -> MeshResult<InpaintResult> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let format = MeshFormat::from_path(output).ok_or_else(|| {
        MeshError::unsupported_format(output.extension().and_then(|e| e.to_str()).map(String::from))
    })?;
    params.validate()?;

    let mesh = load_mesh(input)?;
    let result = inpaint_mesh(&mesh, params)?;

    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = output.with_file_name(format!(".{}.partial", file_name));

    if let Err(e) = save_mesh_as(&result.mesh, &partial, format) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&partial, output) {
        let _ = std::fs::remove_file(&partial);
        return Err(MeshError::io_write(output, e));
    }

    Ok(result)
}
