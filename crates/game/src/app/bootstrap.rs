use std::env;

use ember_engine::{load_config_from_env, resolve_asset_root, ConfigError, CoreConfig, LoopConfig, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::demo_feed::{log_demo_summary, DemoFeed};

const DEMO_SEED_ENV_VAR: &str = "EMBER_DEMO_SEED";
const DEFAULT_DEMO_SEED: u64 = 0x5eed;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) core: CoreConfig,
    pub(crate) feed: DemoFeed,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Ember Startup ===");

    let core = load_config_from_env()?;
    let asset_root = resolve_asset_root()?;
    info!(asset_root = %asset_root.display(), "startup");

    let feed = DemoFeed::new(parse_demo_seed_from_env());
    log_demo_summary(&feed);

    Ok(AppWiring {
        config: LoopConfig {
            asset_root,
            ..LoopConfig::default()
        },
        core,
        feed,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_demo_seed_from_env() -> u64 {
    match env::var(DEMO_SEED_ENV_VAR) {
        Ok(raw) => parse_demo_seed(&raw).unwrap_or_else(|| {
            warn!(env_var = DEMO_SEED_ENV_VAR, value = %raw, "invalid demo seed; using default");
            DEFAULT_DEMO_SEED
        }),
        Err(_) => DEFAULT_DEMO_SEED,
    }
}

fn parse_demo_seed(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_seed_accepts_decimal_and_hex() {
        assert_eq!(parse_demo_seed(" 42 "), Some(42));
        assert_eq!(parse_demo_seed("0xff"), Some(255));
        assert_eq!(parse_demo_seed("seed"), None);
    }
}
