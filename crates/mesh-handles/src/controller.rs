//! Mouse and keyboard state machine for handle editing.
//!
//! The controller owns a [`Session`] (mesh, regions, selection, lasso and
//! gesture state) and a [`DeformationSolver`]. Hosts forward window events
//! through [`InteractionHandler`]; every handler returns `true` when it
//! consumed the event, so the host can skip its own camera navigation.
//!
//! # Modes
//!
//! | Key       | Mode      | Drag on mesh                                  |
//! |-----------|-----------|-----------------------------------------------|
//! | `S`       | Select    | Draws a lasso, replaces the selection on release |
//! | `Alt+T`   | Translate | Moves the grabbed region with the cursor      |
//! | `Alt+R`   | Rotate    | Turns the grabbed region about its centroid   |
//! | `A`       |           | Turns the selection into a new region         |
//!
//! The right mouse button is left to the host.

use std::path::Path;

use nalgebra::{Point2, UnitQuaternion, Vector3};
use tracing::{debug, info, trace, warn};

use crate::camera::Camera;
use crate::config::{InteractionConfig, UpdatePolicy};
use crate::constraints;
use crate::error::HandleResult;
use crate::gesture::{RigidMotion, compute_rotation_with_params, compute_translation};
use crate::lasso::{LassoSelector, Selection};
use crate::overlay::{Overlay, build_overlay};
use crate::registry::{HandleRegistry, RegionId};
use crate::solver::{DeformationSolver, PassthroughSolver};
use crate::tracing_ext::log_session_stats;
use crate::types::Mesh;

/// What a left or middle drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    Select,
    Translate,
    Rotate,
    /// Drags are left to the host.
    #[default]
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const ALT: Self = Self {
        shift: false,
        ctrl: false,
        alt: true,
    };
}

/// Progress of the current mouse gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub mode: InteractionMode,

    /// A press started a gesture that is still running.
    pub live: bool,

    /// Mouse position the current motion is measured from.
    pub anchor: Option<Point2<f64>>,

    /// Region being dragged.
    pub active_region: Option<RegionId>,

    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            mode: InteractionMode::default(),
            live: false,
            anchor: None,
            active_region: None,
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl GestureState {
    /// End the gesture, keeping the mode.
    pub fn reset(&mut self) {
        *self = Self {
            mode: self.mode,
            ..Self::default()
        };
    }

    /// Motion of the active region in the current mode.
    pub fn motion(&self) -> Option<RigidMotion> {
        match self.mode {
            InteractionMode::Translate => Some(RigidMotion::Translate(self.translation)),
            InteractionMode::Rotate => Some(RigidMotion::Rotate(self.rotation)),
            InteractionMode::Select | InteractionMode::Idle => None,
        }
    }
}

/// Everything an editing session mutates.
#[derive(Debug, Clone)]
pub struct Session {
    pub mesh: Mesh,
    pub registry: HandleRegistry,
    pub selection: Selection,
    pub lasso: LassoSelector,
    pub gesture: GestureState,
}

impl Session {
    /// Start a session on a mesh with every vertex free.
    pub fn new(mesh: Mesh, lasso: LassoSelector) -> HandleResult<Self> {
        mesh.validate()?;
        Ok(Self {
            registry: HandleRegistry::new(mesh.vertex_count()),
            mesh,
            selection: Selection::new(),
            lasso,
            gesture: GestureState::default(),
        })
    }

    /// Reset targets, then move the active region's targets by the gesture.
    pub fn refresh_targets(&mut self) {
        self.registry.reset_targets(&self.mesh);
        let (Some(region), Some(motion)) = (self.gesture.active_region, self.gesture.motion()) else {
            return;
        };
        let Some(pivot) = self.registry.centroid(region) else {
            return;
        };

        let members: Vec<u32> = self.registry.members(region).collect();
        for vertex in members {
            let Some(position) = self.mesh.position(vertex) else {
                continue;
            };
            let target = motion.apply(position, &pivot);
            if let Err(err) = self.registry.update_target_position(region, vertex, target) {
                warn!(%err, "Failed to update handle target");
            }
        }
    }
}

/// Window event callbacks.
///
/// The camera is passed with every mouse event so hosts can orbit between
/// events. Positions are in mouse space: pixels, origin top-left, y down.
pub trait InteractionHandler {
    fn on_mouse_down(&mut self, camera: &Camera, button: MouseButton, position: Point2<f64>) -> bool;
    fn on_mouse_move(&mut self, camera: &Camera, position: Point2<f64>) -> bool;
    fn on_mouse_up(&mut self, camera: &Camera, button: MouseButton, position: Point2<f64>) -> bool;
    fn on_key_down(&mut self, key: char, modifiers: Modifiers) -> bool;
}

/// Handle editing controller.
#[derive(Debug)]
pub struct InteractionController<S = PassthroughSolver> {
    session: Session,
    solver: S,
    config: InteractionConfig,
}

impl InteractionController<PassthroughSolver> {
    /// Controller that moves constrained vertices straight to their targets.
    pub fn with_passthrough(mesh: Mesh, config: InteractionConfig) -> HandleResult<Self> {
        Self::new(mesh, PassthroughSolver, config)
    }
}

impl<S: DeformationSolver> InteractionController<S> {
    pub fn new(mesh: Mesh, solver: S, config: InteractionConfig) -> HandleResult<Self> {
        config.validate()?;
        let session = Session::new(mesh, LassoSelector::new(config.lasso.clone()))?;
        log_session_stats(&session.mesh, &session.registry, "session start");
        Ok(Self {
            session,
            solver,
            config,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mesh(&self) -> &Mesh {
        &self.session.mesh
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.session.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.session.selection
    }

    pub fn gesture(&self) -> &GestureState {
        &self.session.gesture
    }

    pub fn mode(&self) -> InteractionMode {
        self.session.gesture.mode
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    /// Switch modes, abandoning any gesture in progress.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        let gesture = &mut self.session.gesture;
        if gesture.live {
            debug!(from = ?gesture.mode, to = ?mode, "Mode change cancels gesture");
        }
        gesture.mode = mode;
        gesture.reset();
        self.session.lasso.clear_stroke();
        self.session.registry.reset_targets(&self.session.mesh);
        debug!(?mode, "Interaction mode");
    }

    pub fn clear_selection(&mut self) {
        self.session.selection.clear();
    }

    /// Turn the free selected vertices into a new region.
    pub fn apply_selection(&mut self) -> Option<RegionId> {
        let session = &mut self.session;
        let region = session
            .registry
            .create_region_from_selection(&mut session.selection, &session.mesh);
        log_session_stats(&session.mesh, &session.registry, "apply selection");
        region
    }

    /// Make every vertex free.
    pub fn clear_constraints(&mut self) {
        self.session.gesture.reset();
        self.session.registry.clear_assignment(&self.session.mesh);
    }

    /// Replace the regions with those stored in a file.
    pub fn load_constraints(&mut self, path: impl AsRef<Path>) -> HandleResult<()> {
        let session = &mut self.session;
        constraints::load_assignment_file(&mut session.registry, &session.mesh, path)?;
        session.gesture.reset();
        log_session_stats(&session.mesh, &session.registry, "load constraints");
        Ok(())
    }

    /// Write the regions to a file.
    pub fn save_constraints(&self, path: impl AsRef<Path>) -> HandleResult<()> {
        constraints::write_assignment_file(&self.session.registry, path)
    }

    /// Run the solver on the current targets.
    pub fn solve(&mut self) -> HandleResult<()> {
        self.run_solver()?;
        self.session.lasso.reinit();
        self.session.registry.recompute_centroids(&self.session.mesh);
        Ok(())
    }

    /// Current display state.
    pub fn overlay(&self) -> Overlay {
        build_overlay(&self.session, self.config.update_policy)
    }

    fn run_solver(&mut self) -> HandleResult<()> {
        let session = &mut self.session;
        self.solver
            .solve(&mut session.mesh, session.registry.constrained())
    }

    fn solve_or_warn(&mut self) {
        if let Err(err) = self.run_solver() {
            warn!(%err, "Deformation solver failed");
        }
    }
}

impl<S: DeformationSolver> InteractionHandler for InteractionController<S> {
    fn on_mouse_down(&mut self, camera: &Camera, button: MouseButton, position: Point2<f64>) -> bool {
        if button == MouseButton::Right {
            return false;
        }
        let session = &mut self.session;
        session.gesture.anchor = Some(position);

        match session.gesture.mode {
            InteractionMode::Select => {
                if session.lasso.stroke_add(&session.mesh, camera, position).is_some() {
                    session.gesture.live = true;
                }
            }
            InteractionMode::Translate | InteractionMode::Rotate => {
                let picked = session.lasso.pick_vertex(&session.mesh, camera, position);
                if let Some(region) = picked.and_then(|v| session.registry.region_of(v)) {
                    debug!(region, mode = ?session.gesture.mode, "Grabbed handle region");
                    session.gesture.active_region = Some(region);
                    session.refresh_targets();
                    session.gesture.live = true;
                }
            }
            InteractionMode::Idle => {}
        }
        session.gesture.live
    }

    fn on_mouse_move(&mut self, camera: &Camera, position: Point2<f64>) -> bool {
        if !self.session.gesture.live {
            return false;
        }
        trace!(x = position.x, y = position.y, "Mouse move");

        let session = &mut self.session;
        match session.gesture.mode {
            InteractionMode::Select => {
                session.lasso.stroke_add(&session.mesh, camera, position);
                true
            }
            mode @ (InteractionMode::Translate | InteractionMode::Rotate) => {
                let (Some(anchor), Some(region)) = (session.gesture.anchor, session.gesture.active_region)
                else {
                    return false;
                };
                let Some(pivot) = session.registry.centroid(region) else {
                    return false;
                };

                if mode == InteractionMode::Translate {
                    session.gesture.translation = compute_translation(camera, &anchor, &position, &pivot);
                } else {
                    session.gesture.rotation = compute_rotation_with_params(
                        camera,
                        &anchor,
                        &position,
                        &pivot,
                        camera.rotation(),
                        &self.config.trackball,
                    );
                }
                session.refresh_targets();

                if self.config.update_policy == UpdatePolicy::DuringDrag {
                    self.solve_or_warn();
                    self.session.gesture.anchor = Some(position);
                }
                true
            }
            InteractionMode::Idle => false,
        }
    }

    fn on_mouse_up(&mut self, camera: &Camera, _button: MouseButton, _position: Point2<f64>) -> bool {
        if !self.session.gesture.live {
            return false;
        }
        self.session.gesture.live = false;

        match self.session.gesture.mode {
            InteractionMode::Select => {
                let session = &mut self.session;
                session.selection = session.lasso.stroke_finish(&session.mesh, camera);
                info!(selected = session.selection.len(), "Selection updated");
                true
            }
            InteractionMode::Translate | InteractionMode::Rotate => {
                if self.config.update_policy == UpdatePolicy::OnRelease {
                    self.solve_or_warn();
                }
                let session = &mut self.session;
                session.gesture.reset();
                session.lasso.reinit();
                session.registry.reset_targets(&session.mesh);
                session.registry.recompute_centroids(&session.mesh);
                true
            }
            InteractionMode::Idle => {
                self.session.gesture.reset();
                false
            }
        }
    }

    fn on_key_down(&mut self, key: char, modifiers: Modifiers) -> bool {
        match (key.to_ascii_uppercase(), modifiers) {
            ('S', _) => self.set_mode(InteractionMode::Select),
            ('T', Modifiers::ALT) => self.set_mode(InteractionMode::Translate),
            ('R', Modifiers::ALT) => self.set_mode(InteractionMode::Rotate),
            ('A', _) => {
                self.apply_selection();
            }
            _ => return false,
        }
        true
    }
}
