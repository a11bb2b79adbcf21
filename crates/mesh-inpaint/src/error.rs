//! Error types for hole filling with rich diagnostics.
//!
//! This module provides:
//! - Machine-readable error codes for programmatic handling
//! - Context about where in the mesh a failure happened
//! - Recovery suggestions for common issues
//! - Terminal display via miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `MESH-XXXX`:
//! - `MESH-1xxx`: I/O errors (file reading, writing, parsing)
//! - `MESH-2xxx`: Validation errors (topology, coordinates)
//! - `MESH-3xxx`: Pipeline errors (a stage could not complete)
//! - `MESH-4xxx`: Format errors
//! - `MESH-5xxx`: Argument errors
//!
//! # Example
//!
//! ```
//! use mesh_inpaint::{ErrorCode, MeshError};
//!
//! let err = MeshError::no_hole(0);
//! assert_eq!(err.code(), ErrorCode::NoHole);
//! assert_eq!(err.code().as_str(), "MESH-3001");
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Machine-readable error codes for mesh operations.
///
/// Codes follow the pattern `MESH-XXXX` where:
/// - 1xxx = I/O errors
/// - 2xxx = Validation errors
/// - 3xxx = Pipeline errors
/// - 4xxx = Format errors
/// - 5xxx = Argument errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// MESH-1001: Failed to read file
    IoRead = 1001,
    /// MESH-1002: Failed to write file
    IoWrite = 1002,
    /// MESH-1003: Failed to parse file format
    ParseError = 1003,

    // Validation errors (2xxx)
    /// MESH-2001: Face references invalid vertex index
    InvalidVertexIndex = 2001,
    /// MESH-2002: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 2002,
    /// MESH-2003: Mesh has no vertices or faces
    EmptyMesh = 2003,
    /// MESH-2004: Invalid mesh topology (non-manifold, etc.)
    InvalidTopology = 2004,

    // Pipeline errors (3xxx)
    /// MESH-3001: Mesh has no boundary loop to fill
    NoHole = 3001,
    /// MESH-3002: Hole boundary or patch is degenerate
    DegenerateGeometry = 3002,
    /// MESH-3003: Fairing system could not be solved
    LinearSolve = 3003,
    /// MESH-3004: Decimation failed
    DecimationFailed = 3004,

    // Format errors (4xxx)
    /// MESH-4001: Unsupported file format
    UnsupportedFormat = 4001,

    // Argument errors (5xxx)
    /// MESH-5001: Invalid parameter value
    InvalidArgument = 5001,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `MESH-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "MESH-1001",
            ErrorCode::IoWrite => "MESH-1002",
            ErrorCode::ParseError => "MESH-1003",
            ErrorCode::InvalidVertexIndex => "MESH-2001",
            ErrorCode::InvalidCoordinate => "MESH-2002",
            ErrorCode::EmptyMesh => "MESH-2003",
            ErrorCode::InvalidTopology => "MESH-2004",
            ErrorCode::NoHole => "MESH-3001",
            ErrorCode::DegenerateGeometry => "MESH-3002",
            ErrorCode::LinearSolve => "MESH-3003",
            ErrorCode::DecimationFailed => "MESH-3004",
            ErrorCode::UnsupportedFormat => "MESH-4001",
            ErrorCode::InvalidArgument => "MESH-5001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for mesh errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Re-export the file from the original software with different settings.
    ReexportFile { format: Option<String> },
    /// Use a different file format.
    UseDifferentFormat { suggested: Vec<String> },
    /// Check the original mesh for issues.
    CheckSourceMesh { checks: Vec<String> },
    /// Adjust parameters for the operation.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Nothing needs to be done.
    NothingToDo { reason: String },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportFile { format } => {
                if let Some(fmt) = format {
                    write!(
                        f,
                        "Try re-exporting the mesh as {} from the original software",
                        fmt
                    )
                } else {
                    write!(f, "Try re-exporting the mesh from the original software")
                }
            }
            RecoverySuggestion::UseDifferentFormat { suggested } => {
                write!(f, "Try using a different format: {}", suggested.join(", "))
            }
            RecoverySuggestion::CheckSourceMesh { checks } => {
                write!(f, "Check the source mesh for: {}", checks.join(", "))
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::NothingToDo { reason } => write!(f, "{}", reason),
            RecoverySuggestion::None => {
                write!(f, "No automatic recovery available")
            }
        }
    }
}

/// Location information for mesh errors.
#[derive(Debug, Clone)]
pub enum MeshLocation {
    /// Error at a specific vertex.
    Vertex {
        index: usize,
        position: Option<[f64; 3]>,
    },
    /// Error at a specific face.
    Face {
        index: usize,
        vertices: Option<[u32; 3]>,
    },
    /// Error at a specific edge.
    Edge { vertex_a: usize, vertex_b: usize },
    /// Error in a file at a specific location.
    File {
        path: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
    },
    /// No specific location.
    Unknown,
}

impl std::fmt::Display for MeshLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshLocation::Vertex { index, position } => {
                if let Some([x, y, z]) = position {
                    write!(f, "vertex {} at ({:.3}, {:.3}, {:.3})", index, x, y, z)
                } else {
                    write!(f, "vertex {}", index)
                }
            }
            MeshLocation::Face { index, vertices } => {
                if let Some([a, b, c]) = vertices {
                    write!(f, "face {} with vertices [{}, {}, {}]", index, a, b, c)
                } else {
                    write!(f, "face {}", index)
                }
            }
            MeshLocation::Edge { vertex_a, vertex_b } => {
                write!(f, "edge between vertices {} and {}", vertex_a, vertex_b)
            }
            MeshLocation::File { path, line, column } => {
                let mut result = path.display().to_string();
                if let Some(l) = line {
                    result.push_str(&format!(":{}", l));
                    if let Some(c) = column {
                        result.push_str(&format!(":{}", c));
                    }
                }
                write!(f, "{}", result)
            }
            MeshLocation::Unknown => {
                write!(f, "unknown location")
            }
        }
    }
}

/// Errors that can occur while filling a hole.
///
/// Each error variant includes:
/// - A human-readable message
/// - A machine-readable error code
/// - Optional location information
/// - Recovery suggestions when available
#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(mesh::io::read),
        help("Check that the file exists and is readable. Try: ls -la {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write mesh to {path}")]
    #[diagnostic(
        code(mesh::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing mesh file format.
    #[error("failed to parse mesh from {path}: {details}")]
    #[diagnostic(
        code(mesh::parse::error),
        help(
            "The file may be corrupted or in an unsupported format variant. Try re-exporting from the original software."
        )
    )]
    ParseError { path: PathBuf, details: String },

    /// Unsupported file format.
    #[error("unsupported mesh format: {extension:?}")]
    #[diagnostic(code(mesh::format::unsupported), help("Supported formats: OBJ, STL"))]
    UnsupportedFormat { extension: Option<String> },

    /// Empty mesh (no vertices or faces).
    #[error("mesh is empty: {details}")]
    #[diagnostic(
        code(mesh::validation::empty),
        help(
            "The mesh must have at least one vertex and one face. Check that the file was exported correctly."
        )
    )]
    EmptyMesh { details: String },

    /// Invalid mesh topology.
    #[error("invalid mesh topology: {details}")]
    #[diagnostic(
        code(mesh::validation::topology),
        help(
            "Hole filling needs a manifold, consistently oriented surface. Clean the mesh in a repair tool first."
        )
    )]
    InvalidTopology {
        details: String,
        edge: Option<(u32, u32)>,
    },

    /// Invalid vertex index in face data.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(
        code(mesh::validation::vertex_index),
        help("Check the mesh export settings; faces must reference existing vertices.")
    )]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Invalid coordinate value (NaN or Infinity).
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(
        code(mesh::validation::coordinate),
        help(
            "Check for numerical issues in the source data. This often happens with very small or very large values."
        )
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// The mesh has no boundary loop that bounds a hole.
    #[error("mesh has no hole: found {boundary_loops} boundary loop(s), none bounding a hole")]
    #[diagnostic(
        code(mesh::pipeline::no_hole),
        help("The input is already closed; there is nothing to fill.")
    )]
    NoHole { boundary_loops: usize },

    /// Hole boundary or patch geometry is degenerate.
    #[error("degenerate geometry: {details}")]
    #[diagnostic(
        code(mesh::pipeline::degenerate),
        help(
            "The hole boundary collapses to zero area or revisits a vertex. Inspect the mesh around the hole."
        )
    )]
    DegenerateGeometry {
        details: String,
        vertex: Option<usize>,
    },

    /// The constrained fairing system could not be solved.
    #[error("fairing solve failed: {details}")]
    #[diagnostic(
        code(mesh::pipeline::linear_solve),
        help(
            "Every patch vertex must connect to the surrounding surface. Try a lower fairing order or check the weld tolerance."
        )
    )]
    LinearSolve { details: String },

    /// Decimation failed.
    #[error("decimation failed: {details}")]
    #[diagnostic(
        code(mesh::decimate::failed),
        help("Ensure the faired mesh has valid topology before decimation.")
    )]
    DecimationFailed { details: String },

    /// A parameter is out of its valid range.
    #[error("invalid argument `{name}`: {details}")]
    #[diagnostic(code(mesh::argument::invalid))]
    InvalidArgument { name: String, details: String },
}

impl MeshError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::IoRead { .. } => ErrorCode::IoRead,
            MeshError::IoWrite { .. } => ErrorCode::IoWrite,
            MeshError::ParseError { .. } => ErrorCode::ParseError,
            MeshError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            MeshError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            MeshError::InvalidTopology { .. } => ErrorCode::InvalidTopology,
            MeshError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            MeshError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            MeshError::NoHole { .. } => ErrorCode::NoHole,
            MeshError::DegenerateGeometry { .. } => ErrorCode::DegenerateGeometry,
            MeshError::LinearSolve { .. } => ErrorCode::LinearSolve,
            MeshError::DecimationFailed { .. } => ErrorCode::DecimationFailed,
            MeshError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            MeshError::IoRead { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            MeshError::IoWrite { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            MeshError::ParseError { .. } => RecoverySuggestion::ReexportFile {
                format: Some("OBJ".into()),
            },
            MeshError::UnsupportedFormat { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec!["OBJ".into(), "STL".into()],
            },
            MeshError::EmptyMesh { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["mesh has geometry".into(), "correct export settings".into()],
            },
            MeshError::InvalidTopology { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec![
                    "non-manifold edges".into(),
                    "inconsistent face winding".into(),
                ],
            },
            MeshError::InvalidVertexIndex { .. } => RecoverySuggestion::ReexportFile { format: None },
            MeshError::InvalidCoordinate { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["coordinate values".into(), "export precision".into()],
            },
            MeshError::NoHole { .. } => RecoverySuggestion::NothingToDo {
                reason: "The mesh is already closed; use it as is".into(),
            },
            MeshError::DegenerateGeometry { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec![
                    "collinear hole boundary".into(),
                    "boundary revisiting a vertex".into(),
                ],
            },
            MeshError::LinearSolve { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("fairing.order".into(), "try 1".into()),
                    ("weld.epsilon".into(), "match the mesh scale".into()),
                ],
            },
            MeshError::DecimationFailed { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("target_faces".into(), "try a higher value".into())],
            },
            MeshError::InvalidArgument { name, .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![(name.clone(), "use a value in the documented range".into())],
            },
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<MeshLocation> {
        match self {
            MeshError::InvalidVertexIndex { face_index, .. } => Some(MeshLocation::Face {
                index: *face_index,
                vertices: None,
            }),
            MeshError::InvalidCoordinate { vertex_index, .. } => Some(MeshLocation::Vertex {
                index: *vertex_index,
                position: None,
            }),
            MeshError::InvalidTopology {
                edge: Some((a, b)), ..
            } => Some(MeshLocation::Edge {
                vertex_a: *a as usize,
                vertex_b: *b as usize,
            }),
            MeshError::DegenerateGeometry {
                vertex: Some(index),
                ..
            } => Some(MeshLocation::Vertex {
                index: *index,
                position: None,
            }),
            MeshError::ParseError { path, .. }
            | MeshError::IoRead { path, .. }
            | MeshError::IoWrite { path, .. } => Some(MeshLocation::File {
                path: path.clone(),
                line: None,
                column: None,
            }),
            _ => None,
        }
    }

    // Constructor helpers for common error patterns

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        MeshError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an InvalidVertexIndex error.
    pub fn invalid_vertex_index(face_index: usize, vertex_index: u32, vertex_count: usize) -> Self {
        MeshError::InvalidVertexIndex {
            face_index,
            vertex_index,
            vertex_count,
        }
    }

    /// Create an InvalidCoordinate error.
    pub fn invalid_coordinate(vertex_index: usize, coordinate: &'static str, value: f64) -> Self {
        MeshError::InvalidCoordinate {
            vertex_index,
            coordinate,
            value,
        }
    }

    /// Create an EmptyMesh error.
    pub fn empty_mesh(details: impl Into<String>) -> Self {
        MeshError::EmptyMesh {
            details: details.into(),
        }
    }

    /// Create an InvalidTopology error at an edge.
    pub fn invalid_topology(details: impl Into<String>, edge: Option<(u32, u32)>) -> Self {
        MeshError::InvalidTopology {
            details: details.into(),
            edge,
        }
    }

    /// Create a NoHole error.
    pub fn no_hole(boundary_loops: usize) -> Self {
        MeshError::NoHole { boundary_loops }
    }

    /// Create a DegenerateGeometry error.
    pub fn degenerate_geometry(details: impl Into<String>) -> Self {
        MeshError::DegenerateGeometry {
            details: details.into(),
            vertex: None,
        }
    }

    /// Create a DegenerateGeometry error pointing at a vertex.
    pub fn degenerate_vertex(vertex: usize, details: impl Into<String>) -> Self {
        MeshError::DegenerateGeometry {
            details: details.into(),
            vertex: Some(vertex),
        }
    }

    /// Create a LinearSolve error.
    pub fn linear_solve(details: impl Into<String>) -> Self {
        MeshError::LinearSolve {
            details: details.into(),
        }
    }

    /// Create a DecimationFailed error.
    pub fn decimation_failed(details: impl Into<String>) -> Self {
        MeshError::DecimationFailed {
            details: details.into(),
        }
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(name: impl Into<String>, details: impl Into<String>) -> Self {
        MeshError::InvalidArgument {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(extension: Option<String>) -> Self {
        MeshError::UnsupportedFormat { extension }
    }
}

/// Validation issues that can be collected during mesh validation.
///
/// Unlike `MeshError`, these represent issues that may be warnings rather than errors,
/// and multiple issues can be collected without stopping validation.
#[derive(Debug, Clone)]
pub enum ValidationIssue {
    /// Face references a vertex index that doesn't exist.
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },
    /// Vertex has NaN coordinate.
    NaNCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
    },
    /// Vertex has infinite coordinate.
    InfiniteCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },
    /// Face repeats a vertex.
    RepeatedVertex { face_index: usize },
}

impl ValidationIssue {
    /// Returns an error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationIssue::InvalidVertexIndex { .. } => "MESH-2001",
            ValidationIssue::NaNCoordinate { .. } => "MESH-2002",
            ValidationIssue::InfiniteCoordinate { .. } => "MESH-2002",
            ValidationIssue::RepeatedVertex { .. } => "MESH-2004",
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            } => {
                write!(
                    f,
                    "face {} references vertex {}, but mesh only has {} vertices",
                    face_index, vertex_index, vertex_count
                )
            }
            ValidationIssue::NaNCoordinate {
                vertex_index,
                coordinate,
            } => {
                write!(
                    f,
                    "vertex {} has NaN {} coordinate",
                    vertex_index, coordinate
                )
            }
            ValidationIssue::InfiniteCoordinate {
                vertex_index,
                coordinate,
                value,
            } => {
                write!(
                    f,
                    "vertex {} has infinite {} coordinate ({})",
                    vertex_index, coordinate, value
                )
            }
            ValidationIssue::RepeatedVertex { face_index } => {
                write!(f, "face {} uses the same vertex twice", face_index)
            }
        }
    }
}
