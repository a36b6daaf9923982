//! Property-based tests for handle regions, projection and gestures.
//!
//! Run with: cargo test -p mesh-handles -- proptest

use mesh_handles::lasso::point_in_polygon;
use mesh_handles::{
    Camera, HandleRegistry, Mesh, RigidMotion, Selection, Vertex, Viewport, compute_translation,
    gesture::trackball, parse_assignment,
};
use nalgebra::{Point2, Point3, UnitQuaternion, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Mesh with `n` vertices in a box and no faces; regions ignore connectivity.
fn point_mesh(n: usize) -> Mesh {
    let mut mesh = Mesh::new();
    for i in 0..n {
        let t = i as f64;
        mesh.vertices
            .push(Vertex::from_coords(t.sin() * 3.0, t.cos() * 2.0, t * 0.1));
    }
    mesh
}

/// A vertex count and a sequence of selections over those vertices,
/// occasionally out of range.
fn arb_selections() -> impl Strategy<Value = (usize, Vec<Vec<u32>>)> {
    (1usize..40).prop_flat_map(|n| {
        let selection = prop::collection::vec(0..(n as u32 + 3), 0..12);
        (Just(n), prop::collection::vec(selection, 0..8))
    })
}

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-2.0..2.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_rotation() -> impl Strategy<Value = UnitQuaternion<f64>> {
    prop::array::uniform3(-3.0..3.0f64)
        .prop_map(|[r, p, y]| UnitQuaternion::from_euler_angles(r, p, y))
}

fn perspective(width: f64, height: f64) -> Camera {
    Camera::perspective(
        Point3::new(0.5, 1.0, 8.0),
        Point3::origin(),
        Vector3::y(),
        40f64.to_radians(),
        0.5,
        50.0,
        Viewport::new(width, height),
    )
    .unwrap()
}

fn build_registry(n: usize, selections: &[Vec<u32>]) -> (Mesh, HandleRegistry, Vec<u32>) {
    let mesh = point_mesh(n);
    let mut registry = HandleRegistry::new(n);
    let mut created = Vec::new();
    for ids in selections {
        let mut selection: Selection = ids.iter().copied().collect();
        if let Some(region) = registry.create_region_from_selection(&mut selection, &mesh) {
            created.push(region);
        }
        assert!(selection.is_empty());
    }
    (mesh, registry, created)
}

// =============================================================================
// Property Tests: Region Assignment
// =============================================================================

proptest! {
    /// Region ids are handed out densely in creation order.
    #[test]
    fn proptest_region_ids_are_sequential((n, selections) in arb_selections()) {
        let (_, registry, created) = build_registry(n, &selections);
        let expected: Vec<u32> = (0..created.len() as u32).collect();
        prop_assert_eq!(&created, &expected);
        prop_assert_eq!(registry.region_ids().collect::<Vec<_>>(), expected);
    }

    /// Constrained list is strictly ascending and agrees with the assignment.
    #[test]
    fn proptest_constrained_matches_assignment((n, selections) in arb_selections()) {
        let (mesh, registry, _) = build_registry(n, &selections);
        let constrained = registry.constrained();

        prop_assert!(constrained.windows(2).all(|w| w[0].vertex < w[1].vertex));
        let assigned = registry.assignment().iter().filter(|s| s.is_some()).count();
        prop_assert_eq!(assigned, constrained.len());
        for c in constrained {
            prop_assert_eq!(registry.region_of(c.vertex), Some(c.region));
            prop_assert_eq!(c.target, mesh.vertices[c.vertex as usize].position);
        }
    }

    /// A vertex keeps the first region it was assigned to.
    #[test]
    fn proptest_first_assignment_wins((n, selections) in arb_selections()) {
        let (_, registry, _) = build_registry(n, &selections);
        let mut first: Vec<Option<u32>> = vec![None; n];
        let mut next = 0u32;
        for ids in &selections {
            let free: Vec<u32> = ids
                .iter()
                .copied()
                .filter(|&v| (v as usize) < n && first[v as usize].is_none())
                .collect();
            if free.is_empty() {
                continue;
            }
            for v in free {
                first[v as usize] = Some(next);
            }
            next += 1;
        }
        prop_assert_eq!(registry.assignment(), first.as_slice());
    }

    /// Centroids are the mean of each region's members.
    #[test]
    fn proptest_centroids_are_member_means((n, selections) in arb_selections()) {
        let (mesh, registry, created) = build_registry(n, &selections);
        for region in created {
            let members: Vec<u32> = registry.members(region).collect();
            prop_assert!(!members.is_empty());
            let sum: Vector3<f64> = members
                .iter()
                .map(|&v| mesh.vertices[v as usize].position.coords)
                .sum();
            let mean = Point3::from(sum / members.len() as f64);
            let centroid = registry.centroid(region).unwrap();
            prop_assert!((centroid - mean).norm() < 1e-9);
        }
    }

    /// Serializing then loading restores the assignment.
    #[test]
    fn proptest_serialized_assignment_reloads((n, selections) in arb_selections()) {
        let (mesh, registry, _) = build_registry(n, &selections);
        let ids = parse_assignment(&registry.serialize_assignment()).unwrap();
        prop_assert_eq!(ids.len(), n);

        let mut restored = HandleRegistry::new(n);
        restored.load_assignment(&ids, &mesh).unwrap();
        prop_assert_eq!(restored.assignment(), registry.assignment());
        prop_assert_eq!(restored.constrained(), registry.constrained());
    }
}

// =============================================================================
// Property Tests: Projection and Lasso
// =============================================================================

proptest! {
    /// Unprojecting a projected point gives the point back.
    #[test]
    fn proptest_unproject_inverts_project(p in arb_point()) {
        let camera = perspective(640.0, 480.0);
        let back = camera.unproject(&camera.project(&p));
        prop_assert!((back - p).norm() < 1e-6);
    }

    /// Mouse and window space differ only by the y flip.
    #[test]
    fn proptest_mouse_window_flip(x in 0.0..640.0f64, y in 0.0..480.0f64, depth in 0.0..1.0f64) {
        let camera = perspective(640.0, 480.0);
        let window = camera.mouse_to_window(&Point2::new(x, y), depth);
        prop_assert!((window.y - (480.0 - y)).abs() < 1e-12);
        let mouse = camera.window_to_mouse(&window);
        prop_assert!((mouse - Point2::new(x, y)).norm() < 1e-9);
    }

    /// For a rectangle, even-odd inclusion matches the bounds check away
    /// from the border.
    #[test]
    fn proptest_rectangle_inclusion(
        x0 in -50.0..0.0f64,
        y0 in -50.0..0.0f64,
        w in 1.0..100.0f64,
        h in 1.0..100.0f64,
        px in -100.0..150.0f64,
        py in -100.0..150.0f64,
    ) {
        let (x1, y1) = (x0 + w, y0 + h);
        prop_assume!((px - x0).abs() > 1e-6 && (px - x1).abs() > 1e-6);
        prop_assume!((py - y0).abs() > 1e-6 && (py - y1).abs() > 1e-6);

        let rect = [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ];
        let inside = px > x0 && px < x1 && py > y0 && py < y1;
        prop_assert_eq!(point_in_polygon(&Point2::new(px, py), &rect), inside);
    }
}

// =============================================================================
// Property Tests: Gestures
// =============================================================================

proptest! {
    /// Translation follows the cursor and scales with the drag.
    #[test]
    fn proptest_translation_follows_cursor(
        reference in arb_point(),
        dx in -80.0..80.0f64,
        dy in -80.0..80.0f64,
    ) {
        let camera = perspective(640.0, 480.0);
        let from = camera.window_to_mouse(&camera.project(&reference));
        let to = Point2::new(from.x + dx, from.y + dy);

        let t = compute_translation(&camera, &from, &to, &reference);
        let landed = camera.window_to_mouse(&camera.project(&(reference + t)));
        prop_assert!((landed - to).norm() < 1e-5);
    }

    /// Trackball output is a proper rotation and is identity for no movement.
    #[test]
    fn proptest_trackball_is_rotation(
        ax in 0.0..100.0f64,
        ay in 0.0..100.0f64,
        bx in -50.0..150.0f64,
        by in -50.0..150.0f64,
    ) {
        let from = Point2::new(ax, ay);
        let q = trackball(100.0, 100.0, 1.0, &from, &Point2::new(bx, by));
        prop_assert!((q.quaternion().norm() - 1.0).abs() < 1e-9);
        prop_assert!(q.angle().is_finite());
        prop_assert_eq!(trackball(100.0, 100.0, 1.0, &from, &from), UnitQuaternion::identity());
    }

    /// Rotating about a pivot keeps distances to the pivot.
    #[test]
    fn proptest_rotation_preserves_pivot_distance(
        p in arb_point(),
        pivot in arb_point(),
        q in arb_rotation(),
    ) {
        let moved = RigidMotion::Rotate(q).apply(&p, &pivot);
        prop_assert!(((moved - pivot).norm() - (p - pivot).norm()).abs() < 1e-9);
        prop_assert!((RigidMotion::Rotate(q).apply(&pivot, &pivot) - pivot).norm() < 1e-12);
    }
}
