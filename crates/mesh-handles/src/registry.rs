//! Handle regions and their constrained vertices.
//!
//! Every vertex is either free or belongs to exactly one handle region.
//! Region ids are small integers handed out in creation order. The registry
//! keeps three derived views in sync with the assignment:
//!
//! - the constrained vertex list, ascending by vertex index, each entry with
//!   a target position the deformation solver should reach
//! - one centroid per region id, used as the rotation pivot
//! - the region of each vertex, for picking
//!
//! # Example
//!
//! ```
//! use mesh_handles::{HandleRegistry, Mesh, Selection};
//! use nalgebra::Point3;
//!
//! let mesh = Mesh::from_parts(
//!     [
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(2.0, 0.0, 0.0),
//!         Point3::new(0.0, 2.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! )
//! .unwrap();
//!
//! let mut registry = HandleRegistry::new(mesh.vertex_count());
//! let mut selection: Selection = [0, 1].into_iter().collect();
//!
//! let region = registry.create_region_from_selection(&mut selection, &mesh);
//! assert_eq!(region, Some(0));
//! assert!(selection.is_empty());
//! assert_eq!(registry.centroid(0), Some(Point3::new(1.0, 0.0, 0.0)));
//! assert_eq!(registry.serialize_assignment(), "0\n0\n-1\n");
//! ```

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use crate::error::{HandleError, HandleResult};
use crate::lasso::Selection;
use crate::types::Mesh;

/// Identifier of a handle region.
pub type RegionId = u32;

/// A vertex pinned by a handle region, with the position it should reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainedVertex {
    /// Mesh vertex index.
    pub vertex: u32,

    /// Region the vertex belongs to.
    pub region: RegionId,

    /// Target position for the deformation solver.
    pub target: Point3<f64>,
}

/// Assignment of vertices to handle regions.
#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    assignment: Vec<Option<RegionId>>,
    constrained: Vec<ConstrainedVertex>,
    centroids: Vec<Option<Point3<f64>>>,
}

impl HandleRegistry {
    /// Create a registry with every vertex free.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            assignment: vec![None; vertex_count],
            constrained: Vec::new(),
            centroids: Vec::new(),
        }
    }

    /// Number of vertices covered by the assignment.
    pub fn vertex_count(&self) -> usize {
        self.assignment.len()
    }

    /// Region of every vertex, `None` for free vertices.
    pub fn assignment(&self) -> &[Option<RegionId>] {
        &self.assignment
    }

    /// Region of one vertex.
    pub fn region_of(&self, vertex: u32) -> Option<RegionId> {
        self.assignment.get(vertex as usize).copied().flatten()
    }

    /// Largest region id in use.
    pub fn max_region(&self) -> Option<RegionId> {
        self.assignment.iter().flatten().copied().max()
    }

    /// One more than the largest region id, or zero when nothing is assigned.
    ///
    /// Ids below this value may have no members after a sparse load.
    pub fn region_count(&self) -> usize {
        self.centroids.len()
    }

    /// Ids of regions that have at least one member, ascending.
    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.centroids
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(|(id, _)| id as RegionId)
    }

    /// Member vertices of a region, ascending.
    pub fn members(&self, region: RegionId) -> impl Iterator<Item = u32> + '_ {
        self.constrained
            .iter()
            .filter(move |c| c.region == region)
            .map(|c| c.vertex)
    }

    /// True when no vertex is constrained.
    pub fn is_empty(&self) -> bool {
        self.constrained.is_empty()
    }

    /// Constrained vertices ascending by index, with their targets.
    pub fn constrained(&self) -> &[ConstrainedVertex] {
        &self.constrained
    }

    /// Centroid of a region's members at the last recompute.
    pub fn centroid(&self, region: RegionId) -> Option<Point3<f64>> {
        self.centroids.get(region as usize).copied().flatten()
    }

    /// Centroids indexed by region id. Ids without members hold `None`.
    pub fn centroids(&self) -> &[Option<Point3<f64>>] {
        &self.centroids
    }

    /// Current target of a constrained vertex.
    pub fn target_of(&self, vertex: u32) -> Option<&Point3<f64>> {
        self.constrained
            .binary_search_by_key(&vertex, |c| c.vertex)
            .ok()
            .map(|i| &self.constrained[i].target)
    }

    /// Turn the free vertices of a selection into a new region.
    ///
    /// The new region gets the next id after the largest one in use.
    /// Vertices that already belong to a region keep it. The selection is
    /// cleared and derived state is rebuilt. Returns the new id, or `None`
    /// when no vertex was free.
    pub fn create_region_from_selection(
        &mut self,
        selection: &mut Selection,
        mesh: &Mesh,
    ) -> Option<RegionId> {
        let Some(id) = self.max_region().map_or(Some(0), |max| max.checked_add(1)) else {
            warn!("Region ids exhausted, no region created");
            selection.clear();
            return None;
        };
        let mut assigned = 0usize;
        let mut skipped = 0usize;
        let vertex_count = self.assignment.len();

        for vertex in selection.iter() {
            match self.assignment.get_mut(vertex as usize) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(id);
                    assigned += 1;
                }
                Some(_) => skipped += 1,
                None => warn!(
                    vertex,
                    vertex_count,
                    "Selected vertex out of range, ignoring"
                ),
            }
        }
        selection.clear();
        self.rebuild(mesh);

        if assigned == 0 {
            debug!(already_assigned = skipped, "Selection had no free vertices, no region created");
            return None;
        }
        info!(region = id, vertices = assigned, already_assigned = skipped, "Created handle region");
        Some(id)
    }

    /// Make every vertex free.
    pub fn clear_assignment(&mut self, mesh: &Mesh) {
        self.assignment.iter_mut().for_each(|slot| *slot = None);
        self.rebuild(mesh);
        debug!("Cleared all handle regions");
    }

    /// Replace the assignment with raw ids, `-1` meaning free.
    ///
    /// The row count must match the mesh. Nothing changes on error.
    pub fn load_assignment(&mut self, ids: &[i64], mesh: &Mesh) -> HandleResult<()> {
        if ids.len() != mesh.vertex_count() {
            return Err(HandleError::vertex_count_mismatch(mesh.vertex_count(), ids.len()));
        }

        // Ids are dense, so no id can reach the vertex count
        let limit = ids.len();
        let assignment = ids
            .iter()
            .enumerate()
            .map(|(vertex_index, &value)| match value {
                -1 => Ok(None),
                v => RegionId::try_from(v)
                    .ok()
                    .filter(|&id| (id as usize) < limit)
                    .map(Some)
                    .ok_or_else(|| HandleError::InvalidRegionId { vertex_index, value }),
            })
            .collect::<HandleResult<Vec<_>>>()?;

        self.assignment = assignment;
        self.rebuild(mesh);
        info!(
            vertices = self.assignment.len(),
            regions = self.region_ids().count(),
            constrained = self.constrained.len(),
            "Loaded handle assignment"
        );
        Ok(())
    }

    /// One line per vertex: the region id, or `-1` for free vertices.
    pub fn serialize_assignment(&self) -> String {
        let mut out = String::with_capacity(self.assignment.len() * 3);
        for slot in &self.assignment {
            match slot {
                Some(id) => out.push_str(&id.to_string()),
                None => out.push_str("-1"),
            }
            out.push('\n');
        }
        out
    }

    /// Average member positions per region. Regions without members get
    /// `None`.
    pub fn recompute_centroids(&mut self, mesh: &Mesh) {
        let count = self.max_region().map_or(0, |max| max as usize + 1);
        let mut sums = vec![(Vector3::zeros(), 0usize); count];

        for (vertex, slot) in self.assignment.iter().enumerate() {
            let (Some(region), Some(v)) = (slot, mesh.vertices.get(vertex)) else {
                continue;
            };
            let entry = &mut sums[*region as usize];
            entry.0 += v.position.coords;
            entry.1 += 1;
        }

        self.centroids = sums
            .into_iter()
            .enumerate()
            .map(|(region, (sum, n))| {
                if n == 0 {
                    warn!(region, "Handle region has no members, no centroid");
                    None
                } else {
                    Some(Point3::from(sum / n as f64))
                }
            })
            .collect();
    }

    /// Set the target of one constrained vertex.
    pub fn update_target_position(
        &mut self,
        region: RegionId,
        vertex: u32,
        position: Point3<f64>,
    ) -> HandleResult<()> {
        let index = self
            .constrained
            .binary_search_by_key(&vertex, |c| c.vertex)
            .ok()
            .filter(|&i| self.constrained[i].region == region)
            .ok_or(HandleError::NotInRegion {
                vertex_index: vertex,
                region,
            })?;
        self.constrained[index].target = position;
        Ok(())
    }

    /// Reset every target to the vertex's current position.
    pub fn reset_targets(&mut self, mesh: &Mesh) {
        for c in &mut self.constrained {
            if let Some(p) = mesh.position(c.vertex) {
                c.target = *p;
            }
        }
    }

    fn rebuild(&mut self, mesh: &Mesh) {
        self.constrained = self
            .assignment
            .iter()
            .enumerate()
            .filter_map(|(vertex, slot)| {
                let region = (*slot)?;
                let target = mesh.vertices.get(vertex)?.position;
                Some(ConstrainedVertex {
                    vertex: vertex as u32,
                    region,
                    target,
                })
            })
            .collect();
        self.recompute_centroids(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strip() -> Mesh {
        Mesh::from_parts(
            (0..6).map(|i| Point3::new(i as f64, 0.0, 0.0)),
            vec![[0, 1, 2], [1, 2, 3], [2, 3, 4], [3, 4, 5]],
        )
        .unwrap()
    }

    fn select(ids: &[u32]) -> Selection {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_new_registry_is_free() {
        let registry = HandleRegistry::new(4);
        assert_eq!(registry.vertex_count(), 4);
        assert!(registry.is_empty());
        assert_eq!(registry.region_count(), 0);
        assert_eq!(registry.max_region(), None);
        assert_eq!(registry.serialize_assignment(), "-1\n-1\n-1\n-1\n");
    }

    #[test]
    fn test_regions_get_sequential_ids() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);

        assert_eq!(registry.create_region_from_selection(&mut select(&[0, 1]), &mesh), Some(0));
        assert_eq!(registry.create_region_from_selection(&mut select(&[4, 5]), &mesh), Some(1));

        assert_eq!(registry.region_ids().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(registry.members(1).collect::<Vec<_>>(), vec![4, 5]);
        assert_relative_eq!(registry.centroid(0).unwrap(), Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(registry.centroid(1).unwrap(), Point3::new(4.5, 0.0, 0.0));
    }

    #[test]
    fn test_assigned_vertices_keep_their_region() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        registry.create_region_from_selection(&mut select(&[0, 1]), &mesh);

        let mut overlap = select(&[1, 2]);
        assert_eq!(registry.create_region_from_selection(&mut overlap, &mesh), Some(1));
        assert!(overlap.is_empty());
        assert_eq!(registry.region_of(1), Some(0));
        assert_eq!(registry.region_of(2), Some(1));

        // Nothing free left in the selection
        assert_eq!(registry.create_region_from_selection(&mut select(&[0, 2]), &mesh), None);
        assert_eq!(registry.region_count(), 2);
    }

    #[test]
    fn test_out_of_range_selection_is_skipped() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        assert_eq!(registry.create_region_from_selection(&mut select(&[3, 42]), &mesh), Some(0));
        assert_eq!(registry.constrained().len(), 1);
    }

    #[test]
    fn test_constrained_sorted_with_current_positions() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        registry.create_region_from_selection(&mut select(&[5, 3]), &mesh);
        registry.create_region_from_selection(&mut select(&[0]), &mesh);

        let vertices: Vec<u32> = registry.constrained().iter().map(|c| c.vertex).collect();
        assert_eq!(vertices, vec![0, 3, 5]);
        for c in registry.constrained() {
            assert_eq!(c.target, mesh.vertices[c.vertex as usize].position);
        }
    }

    #[test]
    fn test_load_replaces_assignment() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        registry.create_region_from_selection(&mut select(&[0]), &mesh);

        registry.load_assignment(&[-1, 2, 2, -1, -1, 0], &mesh).unwrap();
        assert_eq!(registry.region_of(0), None);
        assert_eq!(registry.region_of(1), Some(2));
        assert_eq!(registry.region_count(), 3);
        // Region 1 has no members after a sparse load
        assert_eq!(registry.centroid(1), None);
        assert_eq!(registry.region_ids().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(registry.serialize_assignment(), "-1\n2\n2\n-1\n-1\n0\n");
    }

    #[test]
    fn test_load_rejects_bad_input_without_changes() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        registry.create_region_from_selection(&mut select(&[0, 1]), &mesh);
        let before = registry.serialize_assignment();

        let err = registry.load_assignment(&[0, 0, 0], &mesh).unwrap_err();
        assert!(matches!(err, HandleError::VertexCountMismatch { expected: 6, found: 3 }));

        let err = registry.load_assignment(&[0, 0, -2, 0, 0, 0], &mesh).unwrap_err();
        assert!(matches!(err, HandleError::InvalidRegionId { vertex_index: 2, value: -2 }));

        assert_eq!(registry.serialize_assignment(), before);
    }

    #[test]
    fn test_load_rejects_ids_past_vertex_count() {
        let mesh = Mesh::from_parts((0..3).map(|i| Point3::new(i as f64, 0.0, 0.0)), vec![[0, 1, 2]])
            .unwrap();
        let mut registry = HandleRegistry::new(3);
        registry.create_region_from_selection(&mut select(&[2]), &mesh);
        let before = registry.serialize_assignment();

        let err = registry.load_assignment(&[u32::MAX as i64, -1, -1], &mesh).unwrap_err();
        assert!(matches!(err, HandleError::InvalidRegionId { vertex_index: 0, .. }));
        let err = registry.load_assignment(&[-1, 3, -1], &mesh).unwrap_err();
        assert!(matches!(err, HandleError::InvalidRegionId { vertex_index: 1, value: 3 }));

        assert_eq!(registry.serialize_assignment(), before);
        assert_eq!(registry.region_count(), 1);

        // Largest dense id is still accepted
        registry.load_assignment(&[2, -1, -1], &mesh).unwrap();
        assert_eq!(registry.region_of(0), Some(2));
    }

    #[test]
    fn test_update_and_reset_targets() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        registry.create_region_from_selection(&mut select(&[2]), &mesh);

        let moved = Point3::new(2.0, 1.0, 0.0);
        registry.update_target_position(0, 2, moved).unwrap();
        assert_eq!(registry.target_of(2), Some(&moved));

        let err = registry.update_target_position(0, 3, moved).unwrap_err();
        assert!(matches!(err, HandleError::NotInRegion { vertex_index: 3, region: 0 }));
        assert!(registry.update_target_position(1, 2, moved).is_err());

        registry.reset_targets(&mesh);
        assert_eq!(registry.target_of(2), Some(&Point3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_clear_assignment() {
        let mesh = strip();
        let mut registry = HandleRegistry::new(6);
        registry.create_region_from_selection(&mut select(&[1, 2]), &mesh);
        registry.clear_assignment(&mesh);
        assert!(registry.is_empty());
        assert_eq!(registry.region_count(), 0);
        assert_eq!(
            registry.create_region_from_selection(&mut select(&[4]), &mesh),
            Some(0)
        );
    }
}
