//! Container configuration loaded from YAML.
//!
//! ```yaml
//! name: app
//! caching: true
//! locking: false
//! use_names: false
//! allow_empty_collections: false
//! properties:
//!   db.url: "postgres://localhost/app"
//!   pool.size: 8
//! ```

pub mod processed;
pub mod raw;

pub use processed::{process_raw_config, ContainerConfig};

use crate::error::{Error, Result};
use raw::ConfigRaw;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_BASE_NAME: &str = "trellis";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

impl ContainerConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    let raw: ConfigRaw = serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?;
    process_raw_config(raw)
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }
}

/// Finds the configuration file in the working directory.
///
/// Looks for `trellis.<env>.yaml` first, where `<env>` comes from
/// `environment_suffix`, `TRELLIS_ENV` or `APP_ENV`, then `trellis.yaml`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// [`find_config_file`] searching `dir` instead of the working directory.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("TRELLIS_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!(
        "{}.{}.{}",
        DEFAULT_CONFIG_BASE_NAME, env_str, DEFAULT_CONFIG_EXTENSION
      ));
    }
  }
  files_to_check.push(format!("{}.{}", DEFAULT_CONFIG_BASE_NAME, DEFAULT_CONFIG_EXTENSION));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check TRELLIS_ENV/APP_ENV.",
    files_to_check, dir
  )))
}
