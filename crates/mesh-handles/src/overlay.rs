//! Display state for the host's renderer.
//!
//! Vertex colors show region membership and the current selection, the lasso
//! stroke is a screen-space polyline, and while a drag waits for release the
//! faces touching the dragged region are drawn as a wireframe at their
//! target positions.

use nalgebra::{Point2, Point3};

use crate::config::UpdatePolicy;
use crate::controller::Session;
use crate::registry::RegionId;

/// RGB color with components in `[0, 1]`.
pub type Color = [f32; 3];

/// Color of free vertices.
pub const BASE_COLOR: Color = [0.9, 0.9, 0.9];

/// Color of selected vertices. Selection wins over region colors.
pub const SELECTION_COLOR: Color = [131.0 / 255.0, 131.0 / 255.0, 131.0 / 255.0];

/// Region palette, reused cyclically for ids past its length.
pub const REGION_COLORS: [Color; 10] = [
    [0.89, 0.10, 0.11],
    [0.22, 0.49, 0.72],
    [0.30, 0.69, 0.29],
    [0.60, 0.31, 0.64],
    [1.00, 0.50, 0.00],
    [1.00, 1.00, 0.20],
    [0.65, 0.34, 0.16],
    [0.97, 0.51, 0.75],
    [0.40, 0.76, 0.65],
    [0.55, 0.63, 0.80],
];

/// Palette color of a region.
pub fn region_color(region: RegionId) -> Color {
    REGION_COLORS[region as usize % REGION_COLORS.len()]
}

/// Everything the host needs to draw on top of the mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// One color per mesh vertex.
    pub vertex_colors: Vec<Color>,

    /// Lasso stroke in mouse space.
    pub stroke: Vec<Point2<f64>>,

    /// Consecutive stroke points as line segments.
    pub stroke_segments: Vec<(Point2<f64>, Point2<f64>)>,

    /// Wireframe of the faces touching the dragged region at target positions.
    /// Empty unless a drag is waiting for release.
    pub moving_edges: Vec<(Point3<f64>, Point3<f64>)>,
}

/// Compute the overlay for a session.
pub fn build_overlay(session: &Session, policy: UpdatePolicy) -> Overlay {
    let registry = &session.registry;
    let vertex_colors = (0..session.mesh.vertex_count() as u32)
        .map(|v| {
            if session.selection.contains(v) {
                SELECTION_COLOR
            } else {
                registry.region_of(v).map_or(BASE_COLOR, region_color)
            }
        })
        .collect();

    let stroke = session.lasso.stroke_points().to_vec();
    let stroke_segments = stroke.windows(2).map(|w| (w[0], w[1])).collect();

    let mut moving_edges = Vec::new();
    if policy == UpdatePolicy::OnRelease && session.gesture.live {
        if let Some(region) = session.gesture.active_region {
            let place = |v: u32| -> Point3<f64> {
                let current = session.mesh.vertices[v as usize].position;
                if registry.region_of(v) == Some(region) {
                    registry.target_of(v).copied().unwrap_or(current)
                } else {
                    current
                }
            };
            for face in &session.mesh.faces {
                if !face.iter().any(|&v| registry.region_of(v) == Some(region)) {
                    continue;
                }
                let [a, b, c] = face.map(&place);
                moving_edges.extend([(a, b), (b, c), (c, a)]);
            }
        }
    }

    Overlay {
        vertex_colors,
        stroke,
        stroke_segments,
        moving_edges,
    }
}
