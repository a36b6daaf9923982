//! Lasso selection and vertex picking.
//!
//! A stroke is a polyline in mouse space. It only starts when its first
//! point lands on the mesh, and when finished it selects every visible
//! vertex whose projection lies inside the closed stroke (even-odd rule).
//! Picking returns the nearest visible vertex within a pixel radius.
//!
//! Both operations share a [`VisibilityIndex`] that is rebuilt whenever the
//! camera or the mesh layout changes, or after [`LassoSelector::reinit`].

use std::collections::BTreeSet;

use nalgebra::Point2;
use tracing::{debug, trace};

use crate::camera::Camera;
use crate::tracing_ext::OperationTimer;
use crate::types::Mesh;
use crate::visibility::VisibilityIndex;

/// An ordered set of vertex indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    vertices: BTreeSet<u32>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Returns false if it was already selected.
    pub fn insert(&mut self, vertex: u32) -> bool {
        self.vertices.insert(vertex)
    }

    /// True if the vertex is selected.
    pub fn contains(&self, vertex: u32) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Number of selected vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Iterate vertices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.vertices.iter().copied()
    }

    /// Selected vertices as an ascending vector.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for Selection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            vertices: iter.into_iter().collect(),
        }
    }
}

/// Tuning for selection and picking.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "session-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LassoParams {
    /// Maximum distance in pixels between the cursor and a picked vertex.
    pub pick_radius: f64,

    /// Edge length in pixels of the screen bins used for occlusion queries.
    pub bin_size: f64,

    /// Occluder hits closer than this fraction of the eye segment are ignored.
    pub occlusion_epsilon: f64,
}

impl Default for LassoParams {
    fn default() -> Self {
        Self {
            pick_radius: 10.0,
            bin_size: 16.0,
            occlusion_epsilon: 1e-6,
        }
    }
}

/// Screen-space lasso and picker over a mesh.
#[derive(Debug, Clone, Default)]
pub struct LassoSelector {
    params: LassoParams,
    stroke: Vec<Point2<f64>>,
    index: Option<VisibilityIndex>,
}

impl LassoSelector {
    pub fn new(params: LassoParams) -> Self {
        Self {
            params,
            stroke: Vec::new(),
            index: None,
        }
    }

    pub fn params(&self) -> &LassoParams {
        &self.params
    }

    /// Replace the parameters and drop cached visibility.
    pub fn set_params(&mut self, params: LassoParams) {
        self.params = params;
        self.reinit();
    }

    /// Points of the stroke in progress, in mouse space.
    pub fn stroke_points(&self) -> &[Point2<f64>] {
        &self.stroke
    }

    pub fn is_stroke_active(&self) -> bool {
        !self.stroke.is_empty()
    }

    /// Abandon the stroke in progress.
    pub fn clear_stroke(&mut self) {
        self.stroke.clear();
    }

    /// Drop cached projections. Call after vertex positions change.
    pub fn reinit(&mut self) {
        self.index = None;
    }

    /// Extend the stroke with a mouse position.
    ///
    /// The first point of a stroke must hit the mesh: it returns the picked
    /// vertex, or `None` and leaves the stroke empty. Later points are always
    /// appended and return `None`.
    pub fn stroke_add(&mut self, mesh: &Mesh, camera: &Camera, mouse: Point2<f64>) -> Option<u32> {
        if self.is_stroke_active() {
            trace!(x = mouse.x, y = mouse.y, "Stroke point");
            self.stroke.push(mouse);
            return None;
        }

        let hit = self.pick_vertex(mesh, camera, mouse);
        match hit {
            Some(vertex) => {
                debug!(vertex, x = mouse.x, y = mouse.y, "Stroke started");
                self.stroke.push(mouse);
            }
            None => debug!(x = mouse.x, y = mouse.y, "Stroke start missed the mesh"),
        }
        hit
    }

    /// Close the stroke and return the visible vertices inside it.
    ///
    /// Strokes with fewer than three points select nothing. The stroke is
    /// cleared either way.
    pub fn stroke_finish(&mut self, mesh: &Mesh, camera: &Camera) -> Selection {
        let stroke = std::mem::take(&mut self.stroke);
        if stroke.len() < 3 {
            debug!(points = stroke.len(), "Stroke too short, nothing selected");
            return Selection::new();
        }

        let _timer = OperationTimer::with_context("lasso_finish", mesh.face_count(), mesh.vertex_count());

        let (min, max) = stroke.iter().fold(
            (
                Point2::new(f64::INFINITY, f64::INFINITY),
                Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            ),
            |(min, max), p| (min.inf(p), max.sup(p)),
        );

        let index = self.index_for(mesh, camera);
        let mut selection = Selection::new();
        for vertex in 0..mesh.vertex_count() as u32 {
            let Some(mouse) = index.mouse_position(camera, vertex) else {
                continue;
            };
            if mouse.x < min.x || mouse.x > max.x || mouse.y < min.y || mouse.y > max.y {
                continue;
            }
            if point_in_polygon(&mouse, &stroke) && index.is_visible(mesh, camera, vertex) {
                selection.insert(vertex);
            }
        }

        debug!(points = stroke.len(), selected = selection.len(), "Stroke finished");
        selection
    }

    /// Nearest visible vertex within the pick radius of `mouse`.
    ///
    /// Ties in screen distance go to the vertex closer to the camera.
    pub fn pick_vertex(&mut self, mesh: &Mesh, camera: &Camera, mouse: Point2<f64>) -> Option<u32> {
        let radius = self.params.pick_radius;
        let index = self.index_for(mesh, camera);

        let mut best: Option<(f64, f64, u32)> = None;
        for vertex in 0..mesh.vertex_count() as u32 {
            let Some(position) = index.mouse_position(camera, vertex) else {
                continue;
            };
            let distance = (position - mouse).norm();
            if distance > radius {
                continue;
            }
            let depth = index.window(vertex).map_or(f64::INFINITY, |w| w.z);
            let better = best.is_none_or(|(d, z, _)| {
                distance
                    .total_cmp(&d)
                    .then(depth.total_cmp(&z))
                    .is_lt()
            });
            if better && index.is_visible(mesh, camera, vertex) {
                best = Some((distance, depth, vertex));
            }
        }

        trace!(x = mouse.x, y = mouse.y, picked = ?best.map(|b| b.2), "Pick");
        best.map(|(_, _, vertex)| vertex)
    }

    fn index_for(&mut self, mesh: &Mesh, camera: &Camera) -> &mut VisibilityIndex {
        let stale = self
            .index
            .as_ref()
            .is_none_or(|index| !index.matches(mesh, camera));
        if stale {
            self.index = None;
        }
        let params = &self.params;
        self.index.get_or_insert_with(|| {
            let _timer = OperationTimer::with_context(
                "visibility_index",
                mesh.face_count(),
                mesh.vertex_count(),
            );
            VisibilityIndex::build(mesh, camera, params.bin_size, params.occlusion_epsilon)
        })
    }
}

/// Even-odd point in polygon test. The polygon is implicitly closed.
pub fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for (i, pi) in polygon.iter().enumerate() {
        let pj = &polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let crossing = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
