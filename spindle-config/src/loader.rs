//! Layered composition: defaults -> TOML file -> `.env` -> process
//! environment -> CLI flags, shared across the three binary roles.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{ConfigError, Result};

/// Locations checked, in order, when no explicit `--config` path is given.
pub fn default_config_locations(filename: &str) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(filename)];
    if let Some(home) = dirs_home() {
        candidates.push(home.join(".config/spindle").join(filename));
    }
    candidates.push(PathBuf::from("/etc/spindle").join(filename));
    candidates
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Reads and parses a TOML file at `path`, or the first existing entry of
/// `default_config_locations` when `path` is `None`. Returns `T::default()`
/// equivalent (an empty table, deserialized) when no file is found at all —
/// a missing file is not an error, since every field also has an env/CLI
/// fallback.
pub fn load_toml_overlay<T: DeserializeOwned + Default>(path: Option<&Path>, default_locations: &[PathBuf]) -> Result<T> {
    let resolved = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_locations.iter().find(|p| p.exists()).cloned(),
    };

    let Some(resolved) = resolved else {
        return Ok(T::default());
    };

    let contents = std::fs::read_to_string(&resolved).map_err(|source| ConfigError::Read {
        path: resolved.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: resolved.display().to_string(),
        source,
    })
}

/// Loads `.env` into the process environment at startup. Silently no-ops
/// when no `.env` file is present.
pub fn load_dotenv() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound) {
            tracing::debug!(error = %err, "failed to load .env file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct Sample {
        name: Option<String>,
        count: Option<u32>,
    }

    #[test]
    fn missing_file_yields_default() {
        let locations = vec![PathBuf::from("/nonexistent/spindle-test.toml")];
        let parsed: Sample = load_toml_overlay(None, &locations).unwrap();
        assert_eq!(parsed, Sample::default());
    }

    #[test]
    fn explicit_path_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        std::fs::write(&path, "name = \"spindle\"\ncount = 3\n").unwrap();

        let parsed: Sample = load_toml_overlay(Some(&path), &[]).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("spindle"));
        assert_eq!(parsed.count, Some(3));
    }

    #[test]
    fn default_config_locations_checks_cwd_home_and_etc() {
        let locations = default_config_locations("spindle.toml");
        assert_eq!(locations[0], PathBuf::from("spindle.toml"));
        assert!(locations.last().unwrap().starts_with("/etc/spindle"));
    }
}
