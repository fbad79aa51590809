use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interaction::{InteractionCategory, DEFAULT_HOLD_PRIORITY, DEFAULT_TAP_PRIORITY};
use crate::lighting::DayNightSchedule;

pub const CONFIG_ENV_VAR: &str = "EMBER_CONFIG";

/// Upper bound for `particles.max_particles`.
pub const MAX_PARTICLES: usize = 65_536;
/// Upper bound for each emitter rate in `particles`.
pub const MAX_PARTICLES_PER_SECOND: f32 = 10_000.0;
/// Upper bound for light radii; the light mask is cleared per pixel inside it.
pub const MAX_LIGHT_RADIUS_PX: f32 = 1_024.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub view: ViewConfig,
    pub lighting: LightingConfig,
    pub interaction: InteractionConfig,
    pub frame: FrameConfig,
    pub particles: ParticleConfig,
    pub messages: MessageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub cull_margin_px: f32,
    pub max_sprite_half_extent_px: f32,
    /// Exponential smoothing rate of the camera focal point; 0 snaps to the actor.
    pub camera_smoothing_per_second: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            cull_margin_px: 96.0,
            max_sprite_half_extent_px: 48.0,
            camera_smoothing_per_second: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub schedule: DayNightSchedule,
    pub night_color: [u8; 3],
    pub campfire_radius_px: f32,
    pub torch_radius_px: f32,
    pub flicker_jitter_px: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            schedule: DayNightSchedule::default(),
            night_color: [6, 8, 24],
            campfire_radius_px: 150.0,
            torch_radius_px: 110.0,
            flicker_jitter_px: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub hold_duration_ms: u64,
    pub revive_hold_duration_ms: u64,
    pub tap_priority: Vec<InteractionCategory>,
    pub hold_priority: Vec<InteractionCategory>,
    pub placement_max_distance_px: f32,
    pub unarmed_cooldown_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: 250,
            revive_hold_duration_ms: 1_500,
            tap_priority: DEFAULT_TAP_PRIORITY.to_vec(),
            hold_priority: DEFAULT_HOLD_PRIORITY.to_vec(),
            placement_max_distance_px: 160.0,
            unarmed_cooldown_ms: 500,
        }
    }
}

impl InteractionConfig {
    pub fn hold_duration_for(&self, category: InteractionCategory) -> u64 {
        match category {
            InteractionCategory::DownedAlly => self.revive_hold_duration_ms,
            _ => self.hold_duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub max_frame_delta_ms: u64,
    pub target_fps: Option<u32>,
    pub metrics_log_interval_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_delta_ms: 100,
            target_fps: None,
            metrics_log_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub max_particles: usize,
    pub fire_particles_per_second: f32,
    pub torch_particles_per_second: f32,
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 2_048,
            fire_particles_per_second: 24.0,
            torch_particles_per_second: 8.0,
            seed: 0x00e3_b7f1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub ttl_ms: u64,
    pub max_visible: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 2_500,
            max_visible: 4,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.view.cull_margin_px.is_finite() || self.view.cull_margin_px < 0.0 {
            return Err(invalid("view.cull_margin_px", "must be finite and non-negative"));
        }
        if self.view.max_sprite_half_extent_px >= self.view.cull_margin_px {
            return Err(invalid(
                "view.max_sprite_half_extent_px",
                "must be smaller than view.cull_margin_px or sprites pop in at the edge",
            ));
        }
        if !self.view.camera_smoothing_per_second.is_finite()
            || self.view.camera_smoothing_per_second < 0.0
        {
            return Err(invalid(
                "view.camera_smoothing_per_second",
                "must be finite and non-negative",
            ));
        }
        self.lighting
            .schedule
            .validate()
            .map_err(|reason| invalid("lighting.schedule", reason))?;
        for (field, radius) in [
            ("lighting.campfire_radius_px", self.lighting.campfire_radius_px),
            ("lighting.torch_radius_px", self.lighting.torch_radius_px),
        ] {
            if !radius.is_finite() || radius <= 0.0 || radius > MAX_LIGHT_RADIUS_PX {
                return Err(invalid(field, format!("must be positive and at most {MAX_LIGHT_RADIUS_PX}")));
            }
        }
        if self.interaction.hold_duration_ms == 0 || self.interaction.revive_hold_duration_ms == 0 {
            return Err(invalid("interaction.hold_duration_ms", "must be non-zero"));
        }
        validate_priority(
            "interaction.tap_priority",
            &self.interaction.tap_priority,
            InteractionCategory::is_tap_capable,
        )?;
        validate_priority(
            "interaction.hold_priority",
            &self.interaction.hold_priority,
            InteractionCategory::is_hold_capable,
        )?;
        if self.frame.max_frame_delta_ms == 0 {
            return Err(invalid("frame.max_frame_delta_ms", "must be non-zero"));
        }
        if self.particles.max_particles == 0 || self.particles.max_particles > MAX_PARTICLES {
            return Err(invalid(
                "particles.max_particles",
                format!("must be between 1 and {MAX_PARTICLES}"),
            ));
        }
        for (field, rate) in [
            ("particles.fire_particles_per_second", self.particles.fire_particles_per_second),
            ("particles.torch_particles_per_second", self.particles.torch_particles_per_second),
        ] {
            if !rate.is_finite() || rate < 0.0 || rate > MAX_PARTICLES_PER_SECOND {
                return Err(invalid(field, format!("must be between 0 and {MAX_PARTICLES_PER_SECOND}")));
            }
        }
        Ok(())
    }
}

fn validate_priority(
    field: &'static str,
    priority: &[InteractionCategory],
    capable: fn(InteractionCategory) -> bool,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for category in priority {
        if !seen.insert(*category) {
            return Err(invalid(field, format!("duplicate entry {category:?}")));
        }
        if !capable(*category) {
            return Err(invalid(field, format!("{category:?} has no action here")));
        }
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

pub fn load_config_from_path(path: &Path) -> Result<CoreConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    let config: CoreConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            ConfigError::Parse {
                path: path.to_path_buf(),
                field,
                source: error.into_inner(),
            }
        })?;
    config.validate()?;
    Ok(config)
}

/// Reads `EMBER_CONFIG`; an unset variable means built-in defaults.
pub fn load_config_from_env() -> Result<CoreConfig, ConfigError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) if value.trim().is_empty() => {
            warn!(env_var = CONFIG_ENV_VAR, "empty config path; using defaults");
            Ok(CoreConfig::default())
        }
        Ok(value) => {
            let path = PathBuf::from(value);
            let config = load_config_from_path(&path)?;
            info!(path = %path.display(), "config_loaded");
            Ok(config)
        }
        Err(env::VarError::NotPresent) => Ok(CoreConfig::default()),
        Err(source) => Err(ConfigError::EnvVar {
            var: CONFIG_ENV_VAR,
            source,
        }),
    }
}
