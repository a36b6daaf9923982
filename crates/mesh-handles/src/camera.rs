//! Screen-space projection and unprojection.
//!
//! A [`Camera`] bundles the model, view and projection matrices with the
//! viewport rectangle, and maps points between model space and two screen
//! conventions:
//!
//! - **window space**: origin at the bottom-left of the viewport, y up, depth
//!   in `[0, 1]` (0 at the near plane). This is what [`Camera::project`]
//!   returns and what [`Camera::unproject`] takes.
//! - **mouse space**: origin at the top-left, y down. Input events arrive in
//!   this convention; the lasso stroke is stored in it.
//!
//! The camera also carries the trackball rotation applied to the model, which
//! the rotation gesture needs to express drags in the mesh's own frame.
//!
//! # Example
//!
//! ```
//! use mesh_handles::camera::{Camera, Viewport};
//! use nalgebra::{Point3, Vector3};
//!
//! let camera = Camera::perspective(
//!     Point3::new(0.0, 0.0, 5.0),
//!     Point3::origin(),
//!     Vector3::y(),
//!     45f64.to_radians(),
//!     0.1,
//!     100.0,
//!     Viewport::new(800.0, 600.0),
//! )
//! .unwrap();
//!
//! let window = camera.project(&Point3::origin());
//! assert!((window.x - 400.0).abs() < 1e-9);
//! assert!((window.y - 300.0).abs() < 1e-9);
//! ```

use nalgebra::{
    Isometry3, Matrix4, Orthographic3, Perspective3, Point2, Point3, UnitQuaternion, Vector3,
};

use crate::error::{HandleError, HandleResult};

/// Viewport rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Viewport anchored at the window origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Width over height.
    #[inline]
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Whether a window-space point lies inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Camera matrices and viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view: Matrix4<f64>,
    model: Matrix4<f64>,
    projection: Matrix4<f64>,
    viewport: Viewport,
    rotation: UnitQuaternion<f64>,
    mvp: Matrix4<f64>,
    mvp_inverse: Matrix4<f64>,
}

impl Camera {
    /// Build a camera from raw view and projection matrices.
    ///
    /// Fails when the viewport has no area or the combined matrix cannot be
    /// inverted.
    pub fn new(
        view: Matrix4<f64>,
        projection: Matrix4<f64>,
        viewport: Viewport,
    ) -> HandleResult<Self> {
        Self::assemble(
            view,
            Matrix4::identity(),
            projection,
            viewport,
            UnitQuaternion::identity(),
        )
    }

    /// Perspective camera looking from `eye` towards `target`.
    pub fn perspective(
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        fovy: f64,
        znear: f64,
        zfar: f64,
        viewport: Viewport,
    ) -> HandleResult<Self> {
        check_viewport(&viewport)?;
        if !(fovy > 0.0 && fovy < std::f64::consts::PI) {
            return Err(HandleError::singular_camera(format!(
                "field of view {} is outside (0, pi)",
                fovy
            )));
        }
        check_depth_range(znear, zfar)?;
        if !(znear > 0.0) {
            return Err(HandleError::singular_camera(
                "perspective near plane must be positive",
            ));
        }
        let view = look_at(&eye, &target, &up)?;
        let projection = Perspective3::new(viewport.aspect(), fovy, znear, zfar).to_homogeneous();
        Self::new(view, projection, viewport)
    }

    /// Orthographic camera looking from `eye` towards `target`.
    ///
    /// `half_height` is half the visible extent along the up direction; the
    /// horizontal extent follows the viewport aspect.
    pub fn orthographic(
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        half_height: f64,
        znear: f64,
        zfar: f64,
        viewport: Viewport,
    ) -> HandleResult<Self> {
        check_viewport(&viewport)?;
        if !(half_height > 0.0) {
            return Err(HandleError::singular_camera(
                "orthographic half height must be positive",
            ));
        }
        check_depth_range(znear, zfar)?;
        let view = look_at(&eye, &target, &up)?;
        let half_width = half_height * viewport.aspect();
        let projection = Orthographic3::new(
            -half_width,
            half_width,
            -half_height,
            half_height,
            znear,
            zfar,
        )
        .to_homogeneous();
        Self::new(view, projection, viewport)
    }

    /// Apply a trackball rotation to the model.
    pub fn with_model_rotation(self, rotation: UnitQuaternion<f64>) -> HandleResult<Self> {
        Self::assemble(
            self.view,
            rotation.to_homogeneous(),
            self.projection,
            self.viewport,
            rotation,
        )
    }

    fn assemble(
        view: Matrix4<f64>,
        model: Matrix4<f64>,
        projection: Matrix4<f64>,
        viewport: Viewport,
        rotation: UnitQuaternion<f64>,
    ) -> HandleResult<Self> {
        check_viewport(&viewport)?;
        let mvp = projection * view * model;
        if mvp.iter().any(|v| !v.is_finite()) {
            return Err(HandleError::singular_camera("matrix has non-finite entries"));
        }
        let mvp_inverse = mvp
            .try_inverse()
            .ok_or_else(|| HandleError::singular_camera("model-view-projection has no inverse"))?;
        Ok(Self {
            view,
            model,
            projection,
            viewport,
            rotation,
            mvp,
            mvp_inverse,
        })
    }

    /// The viewport rectangle.
    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Trackball rotation currently applied to the model.
    #[inline]
    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    /// Combined model-view-projection matrix.
    #[inline]
    pub fn mvp(&self) -> &Matrix4<f64> {
        &self.mvp
    }

    /// Project a model-space point to window coordinates.
    ///
    /// Points on the eye plane of a perspective camera have no projection;
    /// the result then contains non-finite values.
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        let clip = self.mvp * point.to_homogeneous();
        let ndc = clip.xyz() / clip.w;
        Point3::new(
            self.viewport.x + self.viewport.width * (ndc.x + 1.0) * 0.5,
            self.viewport.y + self.viewport.height * (ndc.y + 1.0) * 0.5,
            (ndc.z + 1.0) * 0.5,
        )
    }

    /// Project a point, returning `None` when it lies behind the camera.
    pub fn project_in_front(&self, point: &Point3<f64>) -> Option<Point3<f64>> {
        let clip_w = (self.mvp * point.to_homogeneous()).w;
        if clip_w <= f64::EPSILON {
            return None;
        }
        Some(self.project(point))
    }

    /// Map window coordinates (with depth) back to model space.
    pub fn unproject(&self, window: &Point3<f64>) -> Point3<f64> {
        let ndc = Point3::new(
            (window.x - self.viewport.x) / self.viewport.width * 2.0 - 1.0,
            (window.y - self.viewport.y) / self.viewport.height * 2.0 - 1.0,
            window.z * 2.0 - 1.0,
        );
        let object = self.mvp_inverse * ndc.to_homogeneous();
        Point3::from(object.xyz() / object.w)
    }

    /// Convert a mouse position to window coordinates at the given depth.
    #[inline]
    pub fn mouse_to_window(&self, mouse: &Point2<f64>, depth: f64) -> Point3<f64> {
        Point3::new(mouse.x, self.viewport.height - mouse.y, depth)
    }

    /// Convert window coordinates to a mouse position.
    #[inline]
    pub fn window_to_mouse(&self, window: &Point3<f64>) -> Point2<f64> {
        Point2::new(window.x, self.viewport.height - window.y)
    }

    /// Unproject a mouse position at the given window depth.
    pub fn unproject_mouse(&self, mouse: &Point2<f64>, depth: f64) -> Point3<f64> {
        self.unproject(&self.mouse_to_window(mouse, depth))
    }
}

fn check_viewport(viewport: &Viewport) -> HandleResult<()> {
    let ok = viewport.width.is_finite()
        && viewport.height.is_finite()
        && viewport.width > 0.0
        && viewport.height > 0.0;
    if ok {
        Ok(())
    } else {
        Err(HandleError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

fn check_depth_range(znear: f64, zfar: f64) -> HandleResult<()> {
    if znear.is_finite() && zfar.is_finite() && zfar > znear {
        Ok(())
    } else {
        Err(HandleError::singular_camera(format!(
            "depth range [{}, {}] is empty",
            znear, zfar
        )))
    }
}

fn look_at(
    eye: &Point3<f64>,
    target: &Point3<f64>,
    up: &Vector3<f64>,
) -> HandleResult<Matrix4<f64>> {
    let forward = target - eye;
    if forward.norm_squared() <= f64::EPSILON || forward.cross(up).norm_squared() <= f64::EPSILON {
        return Err(HandleError::singular_camera(
            "eye, target and up do not define a view frame",
        ));
    }
    Ok(Isometry3::look_at_rh(eye, target, up).to_homogeneous())
}
