//! # Configuration Utilities
//!
//! TOML loading shared by the server and client binaries. Every config
//! section has defaults, so a config file is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: ServerConfig = load_config("config/server.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content =
        fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
    let config: T =
        toml::from_str(&content).with_context(|| format!("parsing config file {}", path))?;
    Ok(config)
}

/// Load `path` when given, otherwise fall back to the type's defaults.
pub fn load_config_or_default<T>(path: Option<&str>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match path {
        Some(path) => load_config(path),
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        port: u16,
    }

    #[test]
    fn test_load_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4000").unwrap();

        let sample: Sample = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: String::new(),
                port: 4000
            }
        );
    }

    #[test]
    fn test_missing_path_uses_default() {
        let sample: Sample = load_config_or_default(None).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result: Result<Sample> = load_config("/definitely/not/here.toml");
        assert!(result.is_err());
    }
}
