use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod config;
pub mod frame;
pub mod interaction;
pub mod lighting;
pub mod view;
pub mod world;

pub use app::{
    run_app, run_app_with_metrics, AppError, FrameSource, InputAction, InputEvent, LoopConfig,
    LoopMetricsSnapshot, MetricsHandle, Modifiers, PointerButton,
};
pub use config::{load_config_from_env, load_config_from_path, ConfigError, CoreConfig, CONFIG_ENV_VAR};
pub use frame::{FrameContext, FrameInputs, FrameReport, RenderLayer};
pub use interaction::{Intent, IntentError, IntentSink, InteractionCategory, InteractionTargets};
pub use world::{Entity, EntityId, EntityKind, EntityState, Tilemap, Vec2, Weather, WorldSnapshot};

pub const ASSET_ROOT_ENV_VAR: &str = "EMBER_ASSETS";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("{ASSET_ROOT_ENV_VAR} is set but is not a directory: {path}")]
    InvalidEnvAssetRoot { path: PathBuf },
}

/// Sprite directory: `EMBER_ASSETS` when set, otherwise the first
/// `assets/sprites` found walking up from the executable, otherwise
/// `assets/sprites` relative to the working directory. A missing directory
/// is not fatal; every sprite then falls back to its placeholder.
pub fn resolve_asset_root() -> Result<PathBuf, StartupError> {
    match env::var(ASSET_ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if normalized.is_dir() {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvAssetRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let found = exe
                .parent()
                .into_iter()
                .flat_map(Path::ancestors)
                .find_map(sprite_dir_under);
            Ok(found.unwrap_or_else(|| PathBuf::from("assets").join("sprites")))
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ASSET_ROOT_ENV_VAR,
            source,
        }),
    }
}

fn sprite_dir_under(path: &Path) -> Option<PathBuf> {
    let candidate = path.join("assets").join("sprites");
    candidate.is_dir().then(|| normalize_path(&candidate))
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
