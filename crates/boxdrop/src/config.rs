//! Configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `boxdrop.ron` in the working directory (if exists), or an explicit file
//! 3. Environment variables prefixed with `BOXDROP_`
//! 4. Command-line overrides
//!
//! Example environment variable: `BOXDROP_BODIES__MAX_BODIES=50`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

use boxdrop_core::SandboxConfig;

/// Values given on the command line; `None` leaves the loaded value alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub max_bodies: Option<usize>,
}

/// Load configuration with layered priority.
///
/// `path` replaces the optional `boxdrop.ron` lookup with a file that must
/// exist.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<SandboxConfig> {
    load_with_env(path, overrides, Environment::with_prefix("BOXDROP"))
}

fn load_with_env(
    path: Option<&Path>,
    overrides: &Overrides,
    environment: Environment,
) -> Result<SandboxConfig> {
    let defaults =
        Config::try_from(&SandboxConfig::default()).context("Failed to encode default configuration")?;

    let file = match path {
        Some(path) => File::from(path).format(FileFormat::Ron).required(true),
        None => File::with_name("boxdrop")
            .format(FileFormat::Ron)
            .required(false),
    };

    let builder = Config::builder()
        // Layer 1: Compiled defaults
        .add_source(defaults)
        // Layer 2: Config file
        .add_source(file)
        // Layer 3: Environment variables (BOXDROP_WORLD__SUB_STEPS, etc.)
        .add_source(
            environment
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let mut config: SandboxConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Layer 4: Command line
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if let Some(max_bodies) = overrides.max_bodies {
        config.bodies.max_bodies = max_bodies;
    }

    config.validate().context("Invalid configuration")?;

    log::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}
