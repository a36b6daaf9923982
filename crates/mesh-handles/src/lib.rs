//! Handle regions and drag-to-transform interaction for mesh deformation.
//!
//! This crate is the interactive half of a handle-based deformation tool.
//! Users lasso vertices on screen, turn the selection into handle regions,
//! then grab a region and translate or rotate it with the mouse. Each drag
//! produces target positions for the region's vertices, which a pluggable
//! [`DeformationSolver`] turns into a new shape for the whole mesh.
//!
//! # Features
//!
//! - **Camera**: project and unproject between world, window and mouse space
//! - **Lasso**: screen-space stroke selection and vertex picking with occlusion
//! - **Regions**: vertex-to-region assignment, centroids, constrained targets
//! - **Gestures**: cursor-following translation and virtual trackball rotation
//! - **Controller**: mouse/keyboard state machine and panel actions
//! - **Persistence**: plain-text assignment files, one row per vertex
//!
//! # Coordinate Spaces
//!
//! - **World**: mesh coordinates
//! - **Window**: pixels with the origin bottom-left, plus depth in `[0, 1]`
//! - **Mouse**: pixels with the origin top-left and y pointing down, as
//!   reported by windowing systems
//!
//! Conversions between window and mouse space live on [`Camera`].
//!
//! # Quick Start
//!
//! ```
//! use mesh_handles::camera::{Camera, Viewport};
//! use mesh_handles::{
//!     InteractionConfig, InteractionController, InteractionHandler, Mesh, Modifiers, MouseButton,
//! };
//! use nalgebra::{Point2, Point3, Vector3};
//!
//! let mesh = Mesh::from_parts(
//!     [
//!         Point3::new(-0.5, -0.5, 0.0),
//!         Point3::new(0.5, -0.5, 0.0),
//!         Point3::new(0.5, 0.5, 0.0),
//!         Point3::new(-0.5, 0.5, 0.0),
//!     ],
//!     vec![[0, 1, 2], [0, 2, 3]],
//! )
//! .unwrap();
//! let camera = Camera::orthographic(
//!     Point3::new(0.0, 0.0, 5.0),
//!     Point3::origin(),
//!     Vector3::y(),
//!     1.0,
//!     0.1,
//!     20.0,
//!     Viewport::new(200.0, 200.0),
//! )
//! .unwrap();
//!
//! let mut controller = InteractionController::with_passthrough(mesh, InteractionConfig::new()).unwrap();
//!
//! // Lasso the right edge and make it a handle
//! controller.on_key_down('S', Modifiers::NONE);
//! controller.on_mouse_down(&camera, MouseButton::Left, Point2::new(150.0, 155.0));
//! for (x, y) in [(170.0, 170.0), (170.0, 30.0), (130.0, 30.0), (130.0, 170.0)] {
//!     controller.on_mouse_move(&camera, Point2::new(x, y));
//! }
//! controller.on_mouse_up(&camera, MouseButton::Left, Point2::new(130.0, 170.0));
//! controller.on_key_down('A', Modifiers::NONE);
//!
//! // Drag it 10 px to the right
//! controller.on_key_down('T', Modifiers::ALT);
//! controller.on_mouse_down(&camera, MouseButton::Left, Point2::new(150.0, 50.0));
//! controller.on_mouse_move(&camera, Point2::new(160.0, 50.0));
//! controller.on_mouse_up(&camera, MouseButton::Left, Point2::new(160.0, 50.0));
//!
//! assert!((controller.mesh().vertices[2].position.x - 0.6).abs() < 1e-9);
//! ```
//!
//! # Feature Flags
//!
//! - `session-config`: TOML load/save of [`InteractionConfig`]

mod error;
pub mod tracing_ext;
mod types;

pub mod camera;
pub mod config;
pub mod constraints;
pub mod controller;
pub mod gesture;
pub mod lasso;
pub mod overlay;
pub mod registry;
pub mod solver;
pub mod visibility;

// Re-export core types at crate root
pub use error::{ErrorCode, HandleError, HandleLocation, HandleResult, RecoverySuggestion};
pub use types::{Mesh, Triangle, Vertex};

pub use camera::{Camera, Viewport};
pub use config::{InteractionConfig, UpdatePolicy};
pub use constraints::{
    load_assignment_file, parse_assignment, read_assignment_file, write_assignment_file,
};
pub use controller::{
    GestureState, InteractionController, InteractionHandler, InteractionMode, Modifiers,
    MouseButton, Session,
};
pub use gesture::{
    RigidMotion, TrackballParams, compute_rotation, compute_rotation_with_params,
    compute_translation,
};
pub use lasso::{LassoParams, LassoSelector, Selection};
pub use overlay::{Overlay, build_overlay};
pub use registry::{ConstrainedVertex, HandleRegistry, RegionId};
pub use solver::{DeformationSolver, NoopSolver, PassthroughSolver};
