//! Locating, reading and checking `statecraft.toml` settings.
//!
//! An explicit `--config` path wins, then `statecraft/config.toml` in the
//! working directory, then the platform config directory. A file that loads
//! is checked before use so that a bad prefix or a negative length fails
//! at startup rather than halfway through an edit.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info, warn};
use thiserror::Error;

use statecraft::{StatecraftError, config::AppConfig};

/// Problems with a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid entry `{prefix}` in validation.reserved_prefixes: {reason}")]
    ReservedPrefix { prefix: String, reason: &'static str },

    #[error("Invalid value {value} for {key}: {reason}")]
    Value {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl From<ConfigError> for StatecraftError {
    fn from(err: ConfigError) -> Self {
        StatecraftError::Io(io::Error::other(err.to_string()))
    }
}

/// Find, load and check the configuration.
///
/// Falls back to [`AppConfig::default`] when no file is found in any of the
/// searched locations.
///
/// # Errors
///
/// Returns error if an explicit path does not exist, or the chosen file is
/// not valid TOML or fails [`check_config`].
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, StatecraftError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("statecraft/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "statecraft", "statecraft") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, StatecraftError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    check_config(&config)?;

    Ok(config)
}

/// Reject settings the parser or the layout solver cannot work with.
///
/// # Errors
///
/// Returns the first offending setting:
/// - a reserved prefix that is empty, contains `:` or whitespace, or starts
///   with `xml`
/// - a negative or non-finite spacing, padding or default size
pub fn check_config(config: &AppConfig) -> Result<(), ConfigError> {
    let validation = config.validation();
    for prefix in validation.reserved_prefixes() {
        check_prefix(prefix)?;
    }
    if validation.reserved_prefixes().is_empty() {
        warn!(
            strict = validation.strict();
            "No reserved prefixes configured; undeclared visual attributes will be reported"
        );
    }

    let layout = config.layout();
    check_length("layout.spacing", layout.spacing())?;
    check_length("layout.padding", layout.padding())?;

    let size = config.metadata().default_size();
    check_length("metadata.default_width", size.width())?;
    check_length("metadata.default_height", size.height())?;

    Ok(())
}

fn check_prefix(prefix: &str) -> Result<(), ConfigError> {
    let reason = if prefix.is_empty() {
        Some("prefix is empty")
    } else if prefix.contains(':') || prefix.contains(char::is_whitespace) {
        Some("prefix must be a bare name without `:` or whitespace")
    } else if prefix.to_ascii_lowercase().starts_with("xml") {
        Some("names starting with `xml` are reserved by XML")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::ReservedPrefix {
            prefix: prefix.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn check_length(key: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ConfigError::Value {
        key,
        value: value.to_string(),
        reason: "must be a finite, non-negative length",
    })
}
