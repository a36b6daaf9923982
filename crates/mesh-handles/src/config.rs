//! Interaction settings.
//!
//! With the `session-config` feature the settings can be stored as TOML:
//!
//! ```toml
//! update_policy = "on_release"
//!
//! [lasso]
//! pick_radius = 12.0
//!
//! [trackball]
//! divisor = 8.0
//! ```
//!
//! Missing keys fall back to their defaults.

use crate::error::{HandleError, HandleResult};
use crate::gesture::TrackballParams;
use crate::lasso::LassoParams;

/// When the deformation solver runs during a translate or rotate drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "session-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum UpdatePolicy {
    /// Solve on every mouse move. Each move is measured from the previous one.
    #[default]
    DuringDrag,
    /// Solve once on release. Moves are measured from the press, and only
    /// the overlay previews the motion.
    OnRelease,
}

/// Settings for an [`InteractionController`](crate::InteractionController).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "session-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct InteractionConfig {
    pub update_policy: UpdatePolicy,
    pub lasso: LassoParams,
    pub trackball: TrackballParams,
}

impl InteractionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the update policy.
    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    /// Set the pick radius in pixels.
    pub fn with_pick_radius(mut self, radius: f64) -> Self {
        self.lasso.pick_radius = radius;
        self
    }

    /// Set the trackball box divisor.
    pub fn with_trackball_divisor(mut self, divisor: f64) -> Self {
        self.trackball.divisor = divisor;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> HandleResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(HandleError::invalid_config(format!("{name} must be positive, got {value}")))
            }
        };
        positive("lasso.pick_radius", self.lasso.pick_radius)?;
        positive("lasso.bin_size", self.lasso.bin_size)?;
        positive("trackball.divisor", self.trackball.divisor)?;
        positive("trackball.speed", self.trackball.speed)?;

        let eps = self.lasso.occlusion_epsilon;
        if !(0.0..1.0).contains(&eps) {
            return Err(HandleError::invalid_config(format!(
                "lasso.occlusion_epsilon must be in [0, 1), got {eps}"
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML string.
    #[cfg(feature = "session-config")]
    pub fn from_toml(toml_str: &str) -> HandleResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| HandleError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    #[cfg(feature = "session-config")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> HandleResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| HandleError::io_read(path, e))?;
        Self::from_toml(&contents)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "session-config")]
    pub fn to_toml(&self) -> HandleResult<String> {
        toml::to_string_pretty(self).map_err(|e| HandleError::invalid_config(e.to_string()))
    }

    /// Save to a TOML file.
    #[cfg(feature = "session-config")]
    pub fn save_toml(&self, path: impl AsRef<std::path::Path>) -> HandleResult<()> {
        let path = path.as_ref();
        let toml_str = self.to_toml()?;
        std::fs::write(path, toml_str).map_err(|e| HandleError::io_write(path, e))
    }
}
