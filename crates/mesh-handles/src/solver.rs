//! The seam between interaction and deformation.
//!
//! The controller hands the solver the mesh and the constrained vertices
//! with their targets; the solver writes new positions for the whole mesh.
//! Any closure with the right signature is a solver:
//!
//! ```
//! use mesh_handles::{ConstrainedVertex, DeformationSolver, HandleResult, Mesh};
//!
//! let mut calls = 0;
//! let mut counting = |_: &mut Mesh, _: &[ConstrainedVertex]| -> HandleResult<()> {
//!     calls += 1;
//!     Ok(())
//! };
//! counting.solve(&mut Mesh::new(), &[]).unwrap();
//! assert_eq!(calls, 1);
//! ```

use crate::error::{HandleError, HandleResult};
use crate::registry::ConstrainedVertex;
use crate::types::Mesh;

/// Deforms a mesh so constrained vertices reach their targets.
pub trait DeformationSolver {
    /// Update `mesh` in place. On error the mesh may be partially updated.
    fn solve(&mut self, mesh: &mut Mesh, constraints: &[ConstrainedVertex]) -> HandleResult<()>;
}

impl<F> DeformationSolver for F
where
    F: FnMut(&mut Mesh, &[ConstrainedVertex]) -> HandleResult<()>,
{
    fn solve(&mut self, mesh: &mut Mesh, constraints: &[ConstrainedVertex]) -> HandleResult<()> {
        self(mesh, constraints)
    }
}

/// Moves constrained vertices straight to their targets and leaves free
/// vertices where they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSolver;

impl DeformationSolver for PassthroughSolver {
    fn solve(&mut self, mesh: &mut Mesh, constraints: &[ConstrainedVertex]) -> HandleResult<()> {
        let vertex_count = mesh.vertex_count();
        for c in constraints {
            let vertex = mesh
                .vertices
                .get_mut(c.vertex as usize)
                .ok_or_else(|| HandleError::vertex_out_of_range(c.vertex, vertex_count))?;
            vertex.position = c.target;
        }
        Ok(())
    }
}

/// Leaves the mesh untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSolver;

impl DeformationSolver for NoopSolver {
    fn solve(&mut self, _mesh: &mut Mesh, _constraints: &[ConstrainedVertex]) -> HandleResult<()> {
        Ok(())
    }
}
