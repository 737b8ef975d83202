//! TOML configuration file loading
//!
//! The file lives at `~/.config/omni/beacon/plugins.toml` unless a path is
//! given explicitly. Every section is optional and falls back to defaults.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Config;
use crate::{Error, Result};

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Return the config file path: `~/.config/omni/beacon/plugins.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("beacon")
            .join("plugins.toml")
    })
}

/// Replace `${VAR}` placeholders using `lookup`
///
/// Placeholders `lookup` cannot resolve are left as written.
pub fn interpolate_env<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Parse configuration text after placeholder expansion
///
/// # Errors
///
/// Returns [`Error::Toml`] if the text is not valid configuration
pub fn parse_config<F>(text: &str, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(toml::from_str(&interpolate_env(text, lookup))?)
}

/// Load the configuration file
///
/// A missing file yields defaults. An unreadable or invalid file is an error
/// when `path` was given explicitly, and a warning plus defaults otherwise.
///
/// # Errors
///
/// Returns [`Error::Config`] for an explicit path that cannot be read or
/// parsed
pub fn load_config_file<F>(path: Option<&Path>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = path.is_some();
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return Ok(Config::default());
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Config::default());
    }

    let loaded = std::fs::read_to_string(&path)
        .map_err(Error::from)
        .and_then(|content| parse_config(&content, &lookup));

    match loaded {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            Ok(config)
        }
        Err(e) if explicit => Err(Error::Config(format!("{}: {e}", path.display()))),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            Ok(Config::default())
        }
    }
}
