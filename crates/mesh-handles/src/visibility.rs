//! Screen-space visibility tests for lasso selection and picking.
//!
//! A vertex counts as visible when the segment from the vertex to the near
//! plane, along the view ray through its own projection, does not cross any
//! triangle that is not incident to the vertex. Every possible occluder of a
//! vertex covers the vertex's pixel, so triangles are binned by their screen
//! bounding box and each test only looks at one bin.
//!
//! Triangles with a corner behind the camera are not binned and therefore
//! never occlude. This only matters when the camera sits inside the mesh.

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::camera::{Camera, Viewport};
use crate::types::{Mesh, Triangle};

/// Uniform grid of triangle indices over the viewport.
#[derive(Debug, Clone)]
struct ScreenBins {
    cell_size: f64,
    origin: (f64, f64),
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl ScreenBins {
    fn new(viewport: &Viewport, cell_size: f64) -> Self {
        let cell_size = cell_size.max(1.0);
        let cols = ((viewport.width / cell_size).ceil() as usize).max(1);
        let rows = ((viewport.height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            origin: (viewport.x, viewport.y),
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn cell_coord(&self, value: f64, origin: f64, count: usize) -> usize {
        let c = ((value - origin) / self.cell_size).floor();
        c.clamp(0.0, (count - 1) as f64) as usize
    }

    fn insert(&mut self, face: u32, min: (f64, f64), max: (f64, f64)) {
        let right = self.origin.0 + self.cols as f64 * self.cell_size;
        let top = self.origin.1 + self.rows as f64 * self.cell_size;
        if max.0 < self.origin.0 || max.1 < self.origin.1 || min.0 > right || min.1 > top {
            return;
        }
        let c0 = self.cell_coord(min.0, self.origin.0, self.cols);
        let c1 = self.cell_coord(max.0, self.origin.0, self.cols);
        let r0 = self.cell_coord(min.1, self.origin.1, self.rows);
        let r1 = self.cell_coord(max.1, self.origin.1, self.rows);
        for r in r0..=r1 {
            for c in c0..=c1 {
                self.cells[r * self.cols + c].push(face);
            }
        }
    }

    fn query(&self, x: f64, y: f64) -> &[u32] {
        let c = self.cell_coord(x, self.origin.0, self.cols);
        let r = self.cell_coord(y, self.origin.1, self.rows);
        &self.cells[r * self.cols + c]
    }
}

/// Projected vertex positions and memoized visibility for one camera.
#[derive(Debug, Clone)]
pub struct VisibilityIndex {
    mvp: Matrix4<f64>,
    viewport: Viewport,
    vertex_count: usize,
    face_count: usize,
    epsilon: f64,
    windows: Vec<Option<Point3<f64>>>,
    bins: ScreenBins,
    visible: Vec<Option<bool>>,
}

impl VisibilityIndex {
    /// Project every vertex and bin every triangle.
    ///
    /// `cell_size` is the bin edge in pixels; `epsilon` is the segment
    /// parameter below which a hit is treated as touching the vertex itself.
    pub fn build(mesh: &Mesh, camera: &Camera, cell_size: f64, epsilon: f64) -> Self {
        let windows: Vec<Option<Point3<f64>>> = mesh
            .vertices
            .iter()
            .map(|v| {
                camera
                    .project_in_front(&v.position)
                    .filter(|w| w.iter().all(|c| c.is_finite()))
            })
            .collect();

        let mut bins = ScreenBins::new(camera.viewport(), cell_size);
        for (fi, face) in mesh.faces.iter().enumerate() {
            let corners: Option<Vec<Point3<f64>>> =
                face.iter().map(|&vi| windows[vi as usize]).collect();
            let Some(corners) = corners else {
                continue;
            };
            let min = corners
                .iter()
                .fold((f64::INFINITY, f64::INFINITY), |m, p| (m.0.min(p.x), m.1.min(p.y)));
            let max = corners.iter().fold((f64::NEG_INFINITY, f64::NEG_INFINITY), |m, p| {
                (m.0.max(p.x), m.1.max(p.y))
            });
            bins.insert(fi as u32, min, max);
        }

        Self {
            mvp: *camera.mvp(),
            viewport: *camera.viewport(),
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            epsilon,
            visible: vec![None; windows.len()],
            windows,
            bins,
        }
    }

    /// Whether this index was built for the given camera and mesh layout.
    pub fn matches(&self, mesh: &Mesh, camera: &Camera) -> bool {
        self.vertex_count == mesh.vertex_count()
            && self.face_count == mesh.face_count()
            && self.viewport == *camera.viewport()
            && self.mvp == *camera.mvp()
    }

    /// Window coordinates of a vertex, `None` when behind the camera.
    pub fn window(&self, vertex: u32) -> Option<&Point3<f64>> {
        self.windows.get(vertex as usize).and_then(|w| w.as_ref())
    }

    /// Mouse-space position of a vertex that projects into the viewport and
    /// between the clip planes.
    pub fn mouse_position(&self, camera: &Camera, vertex: u32) -> Option<Point2<f64>> {
        let window = self.window(vertex)?;
        let on_screen = self.viewport.contains(window.x, window.y)
            && (0.0..=1.0).contains(&window.z);
        on_screen.then(|| camera.window_to_mouse(window))
    }

    /// Whether the vertex is on screen and not hidden behind another triangle.
    pub fn is_visible(&mut self, mesh: &Mesh, camera: &Camera, vertex: u32) -> bool {
        let vi = vertex as usize;
        if let Some(known) = self.visible.get(vi).copied().flatten() {
            return known;
        }
        let visible = self.compute_visibility(mesh, camera, vertex);
        if let Some(slot) = self.visible.get_mut(vi) {
            *slot = Some(visible);
        }
        visible
    }

    fn compute_visibility(&self, mesh: &Mesh, camera: &Camera, vertex: u32) -> bool {
        let Some(window) = self.window(vertex) else {
            return false;
        };
        if !self.viewport.contains(window.x, window.y) || !(0.0..=1.0).contains(&window.z) {
            return false;
        }
        let origin = mesh.vertices[vertex as usize].position;
        let near = camera.unproject(&Point3::new(window.x, window.y, 0.0));
        let direction = near - origin;

        !self.bins.query(window.x, window.y).iter().any(|&fi| {
            let face = mesh.faces[fi as usize];
            if face.contains(&vertex) {
                return false;
            }
            let Some(tri) = mesh.triangle(fi as usize) else {
                return false;
            };
            segment_hits_triangle(&origin, &direction, &tri, self.epsilon)
        })
    }
}

/// Möller–Trumbore test of the segment `origin + t * direction`, `t` in
/// `(min_t, 1]`, against a triangle.
fn segment_hits_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    tri: &Triangle,
    min_t: f64,
) -> bool {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    // Segment is parallel to the triangle plane
    if a.abs() < 1e-12 {
        return false;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    let t = f * edge2.dot(&q);
    t > min_t && t <= 1.0
}
