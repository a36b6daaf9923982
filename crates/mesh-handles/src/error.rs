//! Error types for handle operations with rich diagnostics.
//!
//! Errors only come out of operations that validate external input: loading a
//! constraint file, building a camera from user matrices, loading a config,
//! or addressing a vertex that does not exist. Picking misses and short lasso
//! strokes are not errors; they show up as `None` or an empty selection.
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `HNDL-XXXX`:
//! - `HNDL-1xxx`: I/O and parse errors (constraint files)
//! - `HNDL-2xxx`: Validation errors (vertex counts, region ids, indices)
//! - `HNDL-3xxx`: Camera errors (singular matrices, empty viewport)
//! - `HNDL-4xxx`: Configuration and solver errors
//!
//! # Example
//!
//! ```
//! use mesh_handles::{ErrorCode, HandleError};
//!
//! let err = HandleError::vertex_count_mismatch(8, 6);
//! assert_eq!(err.code(), ErrorCode::VertexCountMismatch);
//! assert_eq!(err.code().as_str(), "HNDL-2001");
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for handle operations.
pub type HandleResult<T> = Result<T, HandleError>;

/// Machine-readable error codes for handle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// HNDL-1001: Failed to read file
    IoRead = 1001,
    /// HNDL-1002: Failed to write file
    IoWrite = 1002,
    /// HNDL-1003: Row in a constraint file could not be parsed
    MalformedRow = 1003,

    // Validation errors (2xxx)
    /// HNDL-2001: Per-vertex data does not match the mesh vertex count
    VertexCountMismatch = 2001,
    /// HNDL-2002: Region id is neither -1 nor a valid non-negative id
    InvalidRegionId = 2002,
    /// HNDL-2003: Vertex index out of range
    VertexOutOfRange = 2003,
    /// HNDL-2004: Face references a vertex that does not exist
    InvalidFaceVertex = 2004,
    /// HNDL-2005: Vertex is not a member of the given region
    NotInRegion = 2005,

    // Camera errors (3xxx)
    /// HNDL-3001: Model-view-projection matrix cannot be inverted
    SingularCamera = 3001,
    /// HNDL-3002: Viewport has no area
    InvalidViewport = 3002,

    // Configuration / solver errors (4xxx)
    /// HNDL-4001: Configuration could not be parsed or is out of range
    InvalidConfig = 4001,
    /// HNDL-4002: Deformation solver reported a failure
    SolverFailed = 4002,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `HNDL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "HNDL-1001",
            ErrorCode::IoWrite => "HNDL-1002",
            ErrorCode::MalformedRow => "HNDL-1003",
            ErrorCode::VertexCountMismatch => "HNDL-2001",
            ErrorCode::InvalidRegionId => "HNDL-2002",
            ErrorCode::VertexOutOfRange => "HNDL-2003",
            ErrorCode::InvalidFaceVertex => "HNDL-2004",
            ErrorCode::NotInRegion => "HNDL-2005",
            ErrorCode::SingularCamera => "HNDL-3001",
            ErrorCode::InvalidViewport => "HNDL-3002",
            ErrorCode::InvalidConfig => "HNDL-4001",
            ErrorCode::SolverFailed => "HNDL-4002",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for handle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Check the file or its location.
    CheckFile { checks: Vec<String> },
    /// The constraint file was saved for a different mesh.
    UseMatchingMesh { expected_vertices: usize },
    /// Adjust parameters for the operation.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Manual intervention may be required.
    ManualIntervention { description: String },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::CheckFile { checks } => {
                write!(f, "Check the file for: {}", checks.join(", "))
            }
            RecoverySuggestion::UseMatchingMesh { expected_vertices } => {
                write!(
                    f,
                    "Load a constraint file saved for a mesh with {} vertices",
                    expected_vertices
                )
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::ManualIntervention { description } => {
                write!(f, "{}", description)
            }
            RecoverySuggestion::None => {
                write!(f, "No automatic recovery available")
            }
        }
    }
}

/// Location information for handle errors.
#[derive(Debug, Clone)]
pub enum HandleLocation {
    /// Error at a specific vertex.
    Vertex { index: usize },
    /// Error at a specific face.
    Face { index: usize },
    /// Error at a row of a constraint file (1-based).
    Row { line: usize },
    /// Error in a file.
    File { path: PathBuf },
}

impl std::fmt::Display for HandleLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleLocation::Vertex { index } => write!(f, "vertex {}", index),
            HandleLocation::Face { index } => write!(f, "face {}", index),
            HandleLocation::Row { line } => write!(f, "line {}", line),
            HandleLocation::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Errors that can occur during handle operations.
#[derive(Debug, Error, Diagnostic)]
pub enum HandleError {
    /// Error reading from a file.
    #[error("failed to read constraints from {path}")]
    #[diagnostic(
        code(handles::io::read),
        help("Check that the file exists and is readable")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write constraints to {path}")]
    #[diagnostic(
        code(handles::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row of a constraint matrix could not be parsed.
    #[error("malformed constraint row at line {line}: {details}")]
    #[diagnostic(
        code(handles::parse::row),
        help("Each row must start with an integer region id (-1 for free vertices)")
    )]
    MalformedRow { line: usize, details: String },

    /// Per-vertex data does not match the mesh.
    #[error("expected {expected} per-vertex entries, found {found}")]
    #[diagnostic(
        code(handles::validation::vertex_count),
        help("The constraint file was probably saved for a different mesh")
    )]
    VertexCountMismatch { expected: usize, found: usize },

    /// Region id outside the accepted range.
    #[error("invalid region id {value} for vertex {vertex_index}")]
    #[diagnostic(
        code(handles::validation::region_id),
        help("Region ids must be -1 (free) or a non-negative integer below the vertex count")
    )]
    InvalidRegionId { vertex_index: usize, value: i64 },

    /// Vertex index out of range.
    #[error("vertex {vertex_index} is out of range, mesh has {vertex_count} vertices")]
    #[diagnostic(code(handles::validation::vertex_index))]
    VertexOutOfRange {
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Face references a vertex that does not exist.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(
        code(handles::validation::face_vertex),
        help("Repair the mesh before starting an interactive session")
    )]
    InvalidFaceVertex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Vertex is not a member of the region being updated.
    #[error("vertex {vertex_index} is not a member of region {region}")]
    #[diagnostic(code(handles::validation::membership))]
    NotInRegion { vertex_index: u32, region: u32 },

    /// Camera matrices cannot be inverted.
    #[error("camera is singular: {details}")]
    #[diagnostic(
        code(handles::camera::singular),
        help("Check the near/far planes and that the view matrix is a rigid transform")
    )]
    SingularCamera { details: String },

    /// Viewport with no area.
    #[error("viewport must have a positive size, got {width} x {height}")]
    #[diagnostic(code(handles::camera::viewport))]
    InvalidViewport { width: f64, height: f64 },

    /// Invalid configuration.
    #[error("invalid configuration: {details}")]
    #[diagnostic(code(handles::config::invalid))]
    InvalidConfig { details: String },

    /// Deformation solver failed.
    #[error("deformation solver failed: {details}")]
    #[diagnostic(code(handles::solver::failed))]
    SolverFailed { details: String },
}

impl HandleError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            HandleError::IoRead { .. } => ErrorCode::IoRead,
            HandleError::IoWrite { .. } => ErrorCode::IoWrite,
            HandleError::MalformedRow { .. } => ErrorCode::MalformedRow,
            HandleError::VertexCountMismatch { .. } => ErrorCode::VertexCountMismatch,
            HandleError::InvalidRegionId { .. } => ErrorCode::InvalidRegionId,
            HandleError::VertexOutOfRange { .. } => ErrorCode::VertexOutOfRange,
            HandleError::InvalidFaceVertex { .. } => ErrorCode::InvalidFaceVertex,
            HandleError::NotInRegion { .. } => ErrorCode::NotInRegion,
            HandleError::SingularCamera { .. } => ErrorCode::SingularCamera,
            HandleError::InvalidViewport { .. } => ErrorCode::InvalidViewport,
            HandleError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            HandleError::SolverFailed { .. } => ErrorCode::SolverFailed,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            HandleError::IoRead { .. } => RecoverySuggestion::CheckFile {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            HandleError::IoWrite { .. } => RecoverySuggestion::CheckFile {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            HandleError::MalformedRow { .. } => RecoverySuggestion::CheckFile {
                checks: vec![
                    "one row per vertex".into(),
                    "integer region id in the first column".into(),
                ],
            },
            HandleError::VertexCountMismatch { expected, .. } => {
                RecoverySuggestion::UseMatchingMesh {
                    expected_vertices: *expected,
                }
            }
            HandleError::InvalidRegionId { .. } => RecoverySuggestion::ManualIntervention {
                description: "Replace the offending id with -1 or a non-negative region id".into(),
            },
            HandleError::VertexOutOfRange { .. }
            | HandleError::InvalidFaceVertex { .. }
            | HandleError::NotInRegion { .. } => RecoverySuggestion::None,
            HandleError::SingularCamera { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("znear".into(), "use a positive value smaller than zfar".into()),
                    ("up".into(), "must not be parallel to the view direction".into()),
                ],
            },
            HandleError::InvalidViewport { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("viewport".into(), "width and height above zero".into())],
            },
            HandleError::InvalidConfig { .. } => RecoverySuggestion::CheckFile {
                checks: vec!["TOML syntax".into(), "parameter ranges".into()],
            },
            HandleError::SolverFailed { .. } => RecoverySuggestion::ManualIntervention {
                description: "Inspect the solver implementation and its inputs".into(),
            },
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<HandleLocation> {
        match self {
            HandleError::IoRead { path, .. } | HandleError::IoWrite { path, .. } => {
                Some(HandleLocation::File { path: path.clone() })
            }
            HandleError::MalformedRow { line, .. } => Some(HandleLocation::Row { line: *line }),
            HandleError::InvalidRegionId { vertex_index, .. } => Some(HandleLocation::Vertex {
                index: *vertex_index,
            }),
            HandleError::VertexOutOfRange { vertex_index, .. }
            | HandleError::NotInRegion { vertex_index, .. } => Some(HandleLocation::Vertex {
                index: *vertex_index as usize,
            }),
            HandleError::InvalidFaceVertex { face_index, .. } => Some(HandleLocation::Face {
                index: *face_index,
            }),
            _ => None,
        }
    }

    // Constructor helpers for common error patterns

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HandleError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HandleError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a MalformedRow error.
    pub fn malformed_row(line: usize, details: impl Into<String>) -> Self {
        HandleError::MalformedRow {
            line,
            details: details.into(),
        }
    }

    /// Create a VertexCountMismatch error.
    pub fn vertex_count_mismatch(expected: usize, found: usize) -> Self {
        HandleError::VertexCountMismatch { expected, found }
    }

    /// Create a VertexOutOfRange error.
    pub fn vertex_out_of_range(vertex_index: u32, vertex_count: usize) -> Self {
        HandleError::VertexOutOfRange {
            vertex_index,
            vertex_count,
        }
    }

    /// Create a SingularCamera error.
    pub fn singular_camera(details: impl Into<String>) -> Self {
        HandleError::SingularCamera {
            details: details.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        HandleError::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a SolverFailed error.
    pub fn solver_failed(details: impl Into<String>) -> Self {
        HandleError::SolverFailed {
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = HandleError::vertex_count_mismatch(10, 12);
        assert_eq!(err.code(), ErrorCode::VertexCountMismatch);
        assert_eq!(err.code().as_str(), "HNDL-2001");

        let err = HandleError::singular_camera("zero determinant");
        assert_eq!(err.code().to_string(), "HNDL-3001");
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = HandleError::vertex_count_mismatch(10, 12);
        match err.recovery_suggestion() {
            RecoverySuggestion::UseMatchingMesh { expected_vertices } => {
                assert_eq!(expected_vertices, 10);
            }
            other => panic!("Expected UseMatchingMesh suggestion, got {:?}", other),
        }
    }

    #[test]
    fn test_location_info() {
        let err = HandleError::malformed_row(7, "not a number");
        match err.location() {
            Some(HandleLocation::Row { line }) => assert_eq!(line, 7),
            other => panic!("Expected Row location, got {:?}", other),
        }

        let err = HandleError::InvalidFaceVertex {
            face_index: 3,
            vertex_index: 99,
            vertex_count: 4,
        };
        assert!(matches!(
            err.location(),
            Some(HandleLocation::Face { index: 3 })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = HandleError::vertex_count_mismatch(4, 5);
        let display = format!("{}", err);
        assert!(display.contains("expected 4"));
        assert!(display.contains("found 5"));

        let err = HandleError::NotInRegion {
            vertex_index: 2,
            region: 1,
        };
        assert_eq!(err.to_string(), "vertex 2 is not a member of region 1");
    }
}
