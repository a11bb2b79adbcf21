//! Tracing helpers shared by the pipeline stages.
//!
//! Nothing here installs a subscriber; the binary does that. Useful filters:
//!
//! ```text
//! RUST_LOG=mesh_inpaint=debug            # stage-level detail
//! RUST_LOG=mesh_inpaint::timing=info     # per-stage wall time only
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: Input problems that were tolerated
//! - **INFO**: Stage summaries and timing
//! - **DEBUG**: Intermediate mesh sizes, solver details
//! - **TRACE**: Per-collapse and per-vertex detail

use std::time::Instant;
use tracing::{Span, debug, info, trace, warn};

use crate::Mesh;
use crate::validate::MeshReport;

/// Logs the wall time of a stage when dropped.
///
/// # Example
///
/// ```
/// use mesh_inpaint::tracing_ext::OperationTimer;
///
/// let timer = OperationTimer::new("weld");
/// assert!(timer.elapsed_ms() >= 0.0);
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Start timing `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("mesh_operation", operation = name);
        debug!(target: "mesh_inpaint::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Start timing `name` on a mesh of the given size.
    pub fn with_context(name: &'static str, face_count: usize, vertex_count: usize) -> Self {
        let span = tracing::info_span!(
            "mesh_operation",
            operation = name,
            faces = face_count,
            vertices = vertex_count
        );
        debug!(
            target: "mesh_inpaint::timing",
            operation = name,
            faces = face_count,
            vertices = vertex_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// The span opened for this stage.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "mesh_inpaint::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log vertex and face counts plus extent at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let (min_bounds, max_bounds) = mesh.bounds().unwrap_or_default();
    let dims = max_bounds - min_bounds;

    debug!(
        target: "mesh_inpaint::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log the full bounding box at trace level.
pub fn log_mesh_stats_detailed(mesh: &Mesh, context: &str) {
    let (min_bounds, max_bounds) = mesh.bounds().unwrap_or_default();

    trace!(
        target: "mesh_inpaint::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        referenced = mesh.referenced_vertex_count(),
        faces = mesh.face_count(),
        min = format!("({:.4}, {:.4}, {:.4})", min_bounds.x, min_bounds.y, min_bounds.z),
        max = format!("({:.4}, {:.4}, {:.4})", max_bounds.x, max_bounds.y, max_bounds.z),
        area = format!("{:.4}", mesh.surface_area()),
        "Detailed mesh state"
    );
}

/// Log a [`MeshReport`]; warn when the surface is not closed.
pub fn log_report(report: &MeshReport, context: &str) {
    if report.is_closed_surface() {
        info!(
            target: "mesh_inpaint::validation",
            context = context,
            vertices = report.vertex_count,
            faces = report.face_count,
            volume = format!("{:.4}", report.signed_volume),
            "Surface is closed"
        );
    } else {
        warn!(
            target: "mesh_inpaint::validation",
            context = context,
            holes = report.boundary_loop_count,
            boundary_edges = report.boundary_edge_count,
            non_manifold_edges = report.non_manifold_edge_count,
            inconsistent_edges = report.inconsistent_edge_count,
            "Surface is not closed"
        );
    }
}

/// Log a file read or write.
pub fn log_io_operation(
    operation: &str,
    path: &std::path::Path,
    format: Option<&str>,
    success: bool,
) {
    if success {
        info!(
            target: "mesh_inpaint::io",
            operation = operation,
            path = path.display().to_string(),
            format = format.unwrap_or("auto"),
            "I/O operation completed"
        );
    } else {
        warn!(
            target: "mesh_inpaint::io",
            operation = operation,
            path = path.display().to_string(),
            format = format.unwrap_or("auto"),
            "I/O operation failed"
        );
    }
}

/// Open an info span carrying the mesh's vertex and face counts.
#[macro_export]
macro_rules! mesh_span {
    ($name:expr, $mesh:expr) => {
        tracing::info_span!(
            $name,
            vertices = $mesh.vertex_count(),
            faces = $mesh.face_count()
        )
    };
    ($name:expr, $mesh:expr, $($field:tt)*) => {
        tracing::info_span!(
            $name,
            vertices = $mesh.vertex_count(),
            faces = $mesh.face_count(),
            $($field)*
        )
    };
}
