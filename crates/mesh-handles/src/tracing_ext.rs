//! Tracing helpers for interaction and persistence.
//!
//! The crate emits events through `tracing` and never installs a subscriber.
//! Hosts pick the output:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=mesh_handles=debug shows gesture and lasso progress
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: Skipped input (out-of-range indices, empty regions, solver failures)
//! - **INFO**: Region creation, constraint load/save, operation timing
//! - **DEBUG**: Mode changes, stroke and gesture lifecycle
//! - **TRACE**: Per-event mouse positions

use std::time::Instant;
use tracing::span::EnteredSpan;
use tracing::{debug, info, warn};

use crate::Mesh;
use crate::registry::HandleRegistry;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// use mesh_handles::tracing_ext::OperationTimer;
///
/// fn finish_stroke() {
///     let _timer = OperationTimer::new("lasso_finish");
///     // ...
/// } // logged at info level under mesh_handles::timing
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    _span: EnteredSpan,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("handle_operation", operation = name).entered();
        debug!(target: "mesh_handles::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            _span: span,
        }
    }

    /// Create a timer tagged with the mesh size.
    pub fn with_context(name: &'static str, face_count: usize, vertex_count: usize) -> Self {
        let span = tracing::info_span!(
            "handle_operation",
            operation = name,
            faces = face_count,
            vertices = vertex_count
        )
        .entered();
        debug!(
            target: "mesh_handles::timing",
            operation = name,
            faces = face_count,
            vertices = vertex_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            _span: span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "mesh_handles::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log mesh and handle-region statistics at debug level.
pub fn log_session_stats(mesh: &Mesh, registry: &HandleRegistry, context: &str) {
    let (min_bounds, max_bounds) = mesh.bounds().unwrap_or_default();
    let dims = max_bounds - min_bounds;

    debug!(
        target: "mesh_handles::state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        regions = registry.region_ids().count(),
        constrained = registry.constrained().len(),
        "Session state"
    );
}

/// Log a constraint file operation.
pub fn log_io_operation(operation: &str, path: &std::path::Path, rows: usize, success: bool) {
    if success {
        info!(
            target: "mesh_handles::io",
            operation = operation,
            path = path.display().to_string(),
            rows = rows,
            "Constraint file operation completed"
        );
    } else {
        warn!(
            target: "mesh_handles::io",
            operation = operation,
            path = path.display().to_string(),
            "Constraint file operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test_operation");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
    }

    #[test]
    fn test_log_session_stats_on_empty_session() {
        let mesh = Mesh::new();
        let registry = HandleRegistry::new(0);
        // Must not panic on an empty mesh
        log_session_stats(&mesh, &registry, "test");
        log_io_operation("load", std::path::Path::new("missing.txt"), 0, false);
    }
}
