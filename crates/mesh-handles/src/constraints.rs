//! Reading and writing handle assignment files.
//!
//! The file is plain text with one row per mesh vertex. The first
//! whitespace-separated number on each row is the vertex's region id, `-1`
//! for free vertices. Extra columns are ignored and blank lines are skipped.
//! Integral floats such as `2.0` are accepted for files written by numeric
//! tools.
//!
//! ```text
//! -1
//! 0
//! 0
//! 1
//! ```

use std::path::Path;

use crate::error::{HandleError, HandleResult};
use crate::registry::HandleRegistry;
use crate::tracing_ext::{OperationTimer, log_io_operation};
use crate::types::Mesh;

/// Parse assignment rows from text.
pub fn parse_assignment(text: &str) -> HandleResult<Vec<i64>> {
    let mut ids = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        ids.push(parse_id(first).ok_or_else(|| {
            HandleError::malformed_row(index + 1, format!("expected an integer, found '{first}'"))
        })?);
    }
    Ok(ids)
}

fn parse_id(token: &str) -> Option<i64> {
    if let Ok(id) = token.parse::<i64>() {
        return Some(id);
    }
    let value = token.parse::<f64>().ok()?;
    let integral = value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64;
    integral.then_some(value as i64)
}

/// Read raw assignment rows from a file.
pub fn read_assignment_file(path: impl AsRef<Path>) -> HandleResult<Vec<i64>> {
    let path = path.as_ref();
    let _timer = OperationTimer::new("read_assignment");

    let result = std::fs::read_to_string(path)
        .map_err(|e| HandleError::io_read(path, e))
        .and_then(|text| parse_assignment(&text));
    match &result {
        Ok(ids) => log_io_operation("read", path, ids.len(), true),
        Err(_) => log_io_operation("read", path, 0, false),
    }
    result
}

/// Read a file and load it into the registry.
///
/// The registry is unchanged if reading, parsing or validation fails.
pub fn load_assignment_file(
    registry: &mut HandleRegistry,
    mesh: &Mesh,
    path: impl AsRef<Path>,
) -> HandleResult<()> {
    let ids = read_assignment_file(path)?;
    registry.load_assignment(&ids, mesh)
}

/// Write the registry's assignment, one row per vertex.
pub fn write_assignment_file(registry: &HandleRegistry, path: impl AsRef<Path>) -> HandleResult<()> {
    let path = path.as_ref();
    let _timer = OperationTimer::new("write_assignment");

    let result =
        std::fs::write(path, registry.serialize_assignment()).map_err(|e| HandleError::io_write(path, e));
    log_io_operation("write", path, registry.vertex_count(), result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn line_mesh(n: usize) -> Mesh {
        Mesh::from_parts((0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)), vec![]).unwrap()
    }

    #[test]
    fn test_parse_plain_rows() {
        assert_eq!(parse_assignment("-1\n0\n0\n3\n").unwrap(), vec![-1, 0, 0, 3]);
    }

    #[test]
    fn test_parse_tolerates_floats_columns_and_blank_lines() {
        let text = "  2.0  7 8\n\n-1.000\r\n1\t9\n";
        assert_eq!(parse_assignment(text).unwrap(), vec![2, -1, 1]);
    }

    #[test]
    fn test_parse_rejects_non_integer() {
        let err = parse_assignment("0\n1.5\n").unwrap_err();
        assert!(matches!(err, HandleError::MalformedRow { line: 2, .. }));
        assert_eq!(err.code(), ErrorCode::MalformedRow);

        let err = parse_assignment("0\nabc\n").unwrap_err();
        assert!(matches!(err, HandleError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_write_then_load_restores_assignment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("handles.txt");
        let mesh = line_mesh(4);

        let mut registry = HandleRegistry::new(4);
        registry.load_assignment(&[1, -1, 0, 1], &mesh).unwrap();
        write_assignment_file(&registry, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n-1\n0\n1\n");

        let mut restored = HandleRegistry::new(4);
        load_assignment_file(&mut restored, &mesh, &path).unwrap();
        assert_eq!(restored.assignment(), registry.assignment());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_assignment_file(dir.path().join("nope.txt")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IoRead);
    }

    #[test]
    fn test_wrong_row_count_leaves_registry_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.txt");
        std::fs::write(&path, "0\n0\n").unwrap();

        let mesh = line_mesh(3);
        let mut registry = HandleRegistry::new(3);
        registry.load_assignment(&[-1, 0, -1], &mesh).unwrap();

        let err = load_assignment_file(&mut registry, &mesh, &path).unwrap_err();
        assert!(matches!(err, HandleError::VertexCountMismatch { expected: 3, found: 2 }));
        assert_eq!(registry.assignment(), &[None, Some(0), None]);
    }
}
