//! handles replay command - run a recorded session through the controller.
//!
//! A session script is a JSON document:
//!
//! ```json
//! {
//!   "mesh": { "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]], "faces": [[0, 1, 2]] },
//!   "camera": {
//!     "projection": "orthographic",
//!     "eye": [0, 0, 5], "target": [0, 0, 0], "up": [0, 1, 0],
//!     "half_height": 1.0, "viewport": [200, 200]
//!   },
//!   "config": { "update_policy": "on_release" },
//!   "events": [
//!     { "type": "key", "key": "S" },
//!     { "type": "drag", "path": [[100, 108], [90, 120], [110, 120]] },
//!     { "type": "apply_selection" }
//!   ]
//! }
//! ```
//!
//! Mouse positions are in pixels with the origin at the top-left corner.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use mesh_handles::{
    Camera, InteractionConfig, InteractionController, InteractionHandler, InteractionMode, Mesh,
    Modifiers, MouseButton, Viewport,
};
use nalgebra::{Point2, Point3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Cli, OutputFormat, output};

#[derive(Debug, Deserialize)]
struct Script {
    mesh: MeshDesc,
    camera: CameraDesc,
    #[serde(default)]
    config: Option<InteractionConfig>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct MeshDesc {
    vertices: Vec<[f64; 3]>,
    #[serde(default)]
    faces: Vec<[u32; 3]>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Deserialize)]
struct CameraDesc {
    #[serde(default)]
    projection: Projection,
    eye: [f64; 3],
    #[serde(default)]
    target: [f64; 3],
    #[serde(default = "default_up")]
    up: [f64; 3],
    #[serde(default = "default_fovy")]
    fovy_degrees: f64,
    #[serde(default = "default_half_height")]
    half_height: f64,
    #[serde(default = "default_znear")]
    znear: f64,
    #[serde(default = "default_zfar")]
    zfar: f64,
    viewport: [f64; 2],
    /// Model rotation as `[x, y, z, w]`.
    #[serde(default)]
    model_rotation: Option<[f64; 4]>,
}

fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fovy() -> f64 {
    45.0
}

fn default_half_height() -> f64 {
    1.0
}

fn default_znear() -> f64 {
    0.1
}

fn default_zfar() -> f64 {
    100.0
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Button {
    #[default]
    Left,
    Middle,
    Right,
}

impl From<Button> for MouseButton {
    fn from(button: Button) -> Self {
        match button {
            Button::Left => MouseButton::Left,
            Button::Middle => MouseButton::Middle,
            Button::Right => MouseButton::Right,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Event {
    Key {
        key: char,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        alt: bool,
    },
    MouseDown {
        #[serde(default)]
        button: Button,
        x: f64,
        y: f64,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseUp {
        #[serde(default)]
        button: Button,
        x: f64,
        y: f64,
    },
    /// Press at the first point, move through the rest, release at the last.
    Drag {
        #[serde(default)]
        button: Button,
        path: Vec<[f64; 2]>,
    },
    ApplySelection,
    ClearSelection,
    ClearConstraints,
    Solve,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    script: String,
    events: usize,
    consumed: usize,
    mode: String,
    selected: usize,
    constrained: usize,
    moved_vertices: usize,
    regions: Vec<RegionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegionInfo {
    id: u32,
    vertices: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    centroid: Option<[f64; 3]>,
}

pub fn run(
    script_path: &Path,
    output_path: Option<&Path>,
    constraints: Option<&Path>,
    config_path: Option<&Path>,
    cli: &Cli,
) -> Result<()> {
    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read session script {:?}", script_path))?;
    let mut script: Script = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse session script {:?}", script_path))?;

    if let Some(path) = config_path {
        let config = InteractionConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?;
        script.config = Some(config);
    }

    let (controller, mut report) = replay(&script, constraints)?;
    report.script = script_path.display().to_string();

    if let Some(path) = output_path {
        controller
            .save_constraints(path)
            .with_context(|| format!("Failed to write constraints to {:?}", path))?;
        report.output = Some(path.display().to_string());
    }

    match cli.format {
        OutputFormat::Json => output::print(&report, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(&report);
            }
        }
    }

    Ok(())
}

fn print_text(report: &ReplayReport) {
    println!("{}", "Session Replay".bold().underline());
    println!("  {}: {}", "Script".cyan(), report.script);
    println!(
        "  {}: {} ({} consumed)",
        "Events".cyan(),
        report.events,
        report.consumed
    );
    println!("  {}: {}", "Final mode".cyan(), report.mode);
    println!("  {}: {}", "Selected".cyan(), report.selected);
    println!("  {}: {}", "Constrained".cyan(), report.constrained);
    println!("  {}: {}", "Moved vertices".cyan(), report.moved_vertices);

    if report.regions.is_empty() {
        println!("  {}: none", "Regions".cyan());
    } else {
        println!("  {}:", "Regions".cyan());
        for region in &report.regions {
            let centroid = region
                .centroid
                .as_ref()
                .map_or_else(|| "-".to_string(), output::point);
            println!(
                "    {} {}: {} vertices, centroid {}",
                "#".dimmed(),
                region.id,
                region.vertices,
                centroid
            );
        }
    }

    if let Some(ref path) = report.output {
        println!("  {}: {}", "Written".green(), path);
    }
}

fn build_mesh(desc: &MeshDesc) -> Result<Mesh> {
    let positions = desc
        .vertices
        .iter()
        .map(|&[x, y, z]| Point3::new(x, y, z));
    Ok(Mesh::from_parts(positions, desc.faces.clone())?)
}

fn build_camera(desc: &CameraDesc) -> Result<Camera> {
    let eye = Point3::from(desc.eye);
    let target = Point3::from(desc.target);
    let up = Vector3::from(desc.up);
    let viewport = Viewport::new(desc.viewport[0], desc.viewport[1]);

    let camera = match desc.projection {
        Projection::Perspective => Camera::perspective(
            eye,
            target,
            up,
            desc.fovy_degrees.to_radians(),
            desc.znear,
            desc.zfar,
            viewport,
        )?,
        Projection::Orthographic => Camera::orthographic(
            eye,
            target,
            up,
            desc.half_height,
            desc.znear,
            desc.zfar,
            viewport,
        )?,
    };

    match desc.model_rotation {
        Some([x, y, z, w]) => {
            let q = Quaternion::new(w, x, y, z);
            if q.norm() == 0.0 {
                bail!("model_rotation must be a non-zero quaternion");
            }
            Ok(camera.with_model_rotation(UnitQuaternion::from_quaternion(q))?)
        }
        None => Ok(camera),
    }
}

/// Run every event of a script and summarize the final session.
fn replay(script: &Script, constraints: Option<&Path>) -> Result<(InteractionController, ReplayReport)> {
    let mesh = build_mesh(&script.mesh).context("Invalid mesh in session script")?;
    let camera = build_camera(&script.camera).context("Invalid camera in session script")?;
    let initial: Vec<Point3<f64>> = mesh.vertices.iter().map(|v| v.position).collect();

    let config = script.config.clone().unwrap_or_default();
    let mut controller = InteractionController::with_passthrough(mesh, config)?;
    if let Some(path) = constraints {
        controller
            .load_constraints(path)
            .with_context(|| format!("Failed to load constraints from {:?}", path))?;
    }

    let mut consumed = 0usize;
    for (index, event) in script.events.iter().enumerate() {
        let used = dispatch(&mut controller, &camera, event)
            .with_context(|| format!("Event {} failed", index))?;
        debug!(index, ?event, used, "Replayed event");
        consumed += usize::from(used);
    }

    let registry = controller.registry();
    let regions = registry
        .region_ids()
        .map(|id| RegionInfo {
            id,
            vertices: registry.members(id).count(),
            centroid: registry.centroid(id).map(|c| [c.x, c.y, c.z]),
        })
        .collect();
    let moved_vertices = controller
        .mesh()
        .vertices
        .iter()
        .zip(&initial)
        .filter(|(v, p)| v.position != **p)
        .count();

    let report = ReplayReport {
        script: String::new(),
        events: script.events.len(),
        consumed,
        mode: mode_name(controller.mode()).to_string(),
        selected: controller.selection().len(),
        constrained: registry.constrained().len(),
        moved_vertices,
        regions,
        output: None,
    };
    info!(
        events = report.events,
        regions = report.regions.len(),
        moved = moved_vertices,
        "Replay finished"
    );
    Ok((controller, report))
}

fn dispatch(controller: &mut InteractionController, camera: &Camera, event: &Event) -> Result<bool> {
    let used = match *event {
        Event::Key {
            key,
            shift,
            ctrl,
            alt,
        } => controller.on_key_down(key, Modifiers { shift, ctrl, alt }),
        Event::MouseDown { button, x, y } => {
            controller.on_mouse_down(camera, button.into(), Point2::new(x, y))
        }
        Event::MouseMove { x, y } => controller.on_mouse_move(camera, Point2::new(x, y)),
        Event::MouseUp { button, x, y } => {
            controller.on_mouse_up(camera, button.into(), Point2::new(x, y))
        }
        Event::Drag { button, ref path } => {
            let (Some(first), Some(last)) = (path.first(), path.last()) else {
                bail!("drag needs at least one point");
            };
            let mut used = controller.on_mouse_down(camera, button.into(), Point2::new(first[0], first[1]));
            for p in &path[1..] {
                used |= controller.on_mouse_move(camera, Point2::new(p[0], p[1]));
            }
            used |= controller.on_mouse_up(camera, button.into(), Point2::new(last[0], last[1]));
            used
        }
        Event::ApplySelection => {
            controller.apply_selection();
            true
        }
        Event::ClearSelection => {
            controller.clear_selection();
            true
        }
        Event::ClearConstraints => {
            controller.clear_constraints();
            true
        }
        Event::Solve => {
            controller.solve()?;
            true
        }
    };
    Ok(used)
}

fn mode_name(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Select => "select",
        InteractionMode::Translate => "translate",
        InteractionMode::Rotate => "rotate",
        InteractionMode::Idle => "idle",
    }
}
