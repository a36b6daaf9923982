//! Mouse drags to rigid motions of a handle region.
//!
//! Translation keeps the grabbed point under the cursor: both mouse
//! positions are unprojected at the depth of the region's reference point
//! (its centroid) and the motion is their difference.
//!
//! Rotation uses a virtual trackball in a small box centered on the
//! projected reference point. The rotation it produces is expressed in view
//! space, so it is conjugated by the camera's model rotation to act on mesh
//! coordinates.

use nalgebra::{Point2, Point3, Unit, UnitQuaternion, Vector3};
use tracing::trace;

use crate::camera::Camera;

/// Tuning for rotation drags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "session-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TrackballParams {
    /// The trackball box is the viewport size divided by this.
    pub divisor: f64,

    /// Scales mouse travel before it is mapped onto the ball.
    pub speed: f64,
}

impl Default for TrackballParams {
    fn default() -> Self {
        Self {
            divisor: 8.0,
            speed: 1.0,
        }
    }
}

/// A rigid motion applied to every member of a handle region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RigidMotion {
    Translate(Vector3<f64>),
    /// Rotation about the region's centroid.
    Rotate(UnitQuaternion<f64>),
}

impl RigidMotion {
    /// Move a point. `pivot` is only used by rotations.
    pub fn apply(&self, point: &Point3<f64>, pivot: &Point3<f64>) -> Point3<f64> {
        match self {
            Self::Translate(t) => point + t,
            Self::Rotate(q) => pivot + q * (point - pivot),
        }
    }
}

/// World-space translation that follows a drag from `from` to `to`.
///
/// Both positions are in mouse space. The result is zero when the positions
/// are equal or the reference point cannot be projected.
pub fn compute_translation(
    camera: &Camera,
    from: &Point2<f64>,
    to: &Point2<f64>,
    reference: &Point3<f64>,
) -> Vector3<f64> {
    if from == to {
        return Vector3::zeros();
    }
    let depth = camera.project(reference).z;
    if !depth.is_finite() {
        return Vector3::zeros();
    }
    let start = camera.unproject_mouse(from, depth);
    let end = camera.unproject_mouse(to, depth);
    let translation = end - start;
    trace!(
        dx = translation.x,
        dy = translation.y,
        dz = translation.z,
        "Drag translation"
    );
    if translation.iter().all(|c| c.is_finite()) {
        translation
    } else {
        Vector3::zeros()
    }
}

/// Model-space rotation for a drag, with default trackball parameters.
pub fn compute_rotation(
    camera: &Camera,
    from: &Point2<f64>,
    to: &Point2<f64>,
    reference: &Point3<f64>,
    camera_rotation: &UnitQuaternion<f64>,
) -> UnitQuaternion<f64> {
    compute_rotation_with_params(
        camera,
        from,
        to,
        reference,
        camera_rotation,
        &TrackballParams::default(),
    )
}

/// Model-space rotation for a drag from `from` to `to` in mouse space.
///
/// The trackball box is centered on the projection of `reference`.
pub fn compute_rotation_with_params(
    camera: &Camera,
    from: &Point2<f64>,
    to: &Point2<f64>,
    reference: &Point3<f64>,
    camera_rotation: &UnitQuaternion<f64>,
    params: &TrackballParams,
) -> UnitQuaternion<f64> {
    if from == to {
        return UnitQuaternion::identity();
    }
    let viewport = camera.viewport();
    let width = viewport.width / params.divisor;
    let height = viewport.height / params.divisor;

    let projected = camera.project(reference);
    if !projected.iter().all(|c| c.is_finite()) {
        return UnitQuaternion::identity();
    }
    let center = camera.window_to_mouse(&projected);
    let to_box = |p: &Point2<f64>| {
        Point2::new(p.x - center.x + width / 2.0, p.y - center.y + height / 2.0)
    };

    let view_rotation = trackball(width, height, params.speed, &to_box(from), &to_box(to));
    camera_rotation.inverse() * view_rotation * camera_rotation
}

/// Virtual trackball rotation for a drag inside a `width` x `height` box.
///
/// Positions are relative to the box's top-left corner with y down. The
/// angle grows past the unit ball so drags outside the box keep turning.
pub fn trackball(
    width: f64,
    height: f64,
    speed: f64,
    from: &Point2<f64>,
    to: &Point2<f64>,
) -> UnitQuaternion<f64> {
    if from == to {
        return UnitQuaternion::identity();
    }
    let size = width.min(height);
    let to_ball = |p: &Point2<f64>| {
        let x = speed * (p.x - width / 2.0) + width / 2.0;
        let y = speed * (p.y - height / 2.0) + height / 2.0;
        ((2.0 * x - width) / size, (height - 2.0 * y) / size)
    };

    let (x0, y0) = to_ball(from);
    let (x1, y1) = to_ball(to);
    let v0 = Vector3::new(x0, y0, 1.0).normalize();
    let v1 = Vector3::new(x1, y1, 1.0).normalize();

    let axis = v0.cross(&v1);
    let mut angle = axis.norm().atan2(v0.dot(&v1));
    let r2 = x1 * x1 + y1 * y1;
    if r2 > 1.0 {
        angle *= 1.0 + 0.2 * (r2.sqrt() - 1.0);
    }

    match Unit::try_new(axis, 1e-12) {
        Some(axis) if angle.is_finite() => UnitQuaternion::from_axis_angle(&axis, angle),
        _ => UnitQuaternion::identity(),
    }
}
