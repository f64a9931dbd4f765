use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use sonar_backend::ServiceVersion;
use sonar_platform::ServicePaths;

/// The single configuration key this crate owns.
pub const DATA_PATH_KEY: &str = "path.data";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    Unavailable(PathBuf),

    #[error("Could not parse {path}: {details}")]
    Parse { path: PathBuf, details: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rewrites the service configuration so each version keeps its own data.
pub trait DataPathStore: Send + Sync {
    /// Point the data-path key at the version-namespaced directory and
    /// return that directory.
    ///
    /// # Errors
    /// Fails with [`ConfigError::Unavailable`] when the configuration file
    /// is missing — a hard precondition for native switches, since without
    /// it data isolation cannot be guaranteed.
    fn rewrite_data_path(&self, service: &ServiceVersion) -> Result<PathBuf, ConfigError>;
}

/// [`DataPathStore`] over the service's YAML configuration file.
///
/// Index data formats are binary-incompatible across majors; giving every
/// version `<base>/<id>/` keeps switching lossless. Every key other than
/// `path.data` round-trips unchanged, and the write is atomic (temp file in
/// the same directory, then rename) so an interrupted switch never leaves a
/// half-written config.
pub struct YamlDataPath {
    config_file: PathBuf,
    data_base: PathBuf,
}

impl YamlDataPath {
    #[must_use]
    pub fn new(config_file: PathBuf, data_base: PathBuf) -> Self {
        Self {
            config_file,
            data_base,
        }
    }

    #[must_use]
    pub fn for_paths(paths: &ServicePaths) -> Self {
        Self::new(paths.config_yaml(), paths.data_base())
    }

    fn load(&self) -> Result<Mapping, ConfigError> {
        if !self.config_file.is_file() {
            return Err(ConfigError::Unavailable(self.config_file.clone()));
        }

        let text = fs::read_to_string(&self.config_file)?;
        if text.trim().is_empty() {
            return Ok(Mapping::new());
        }

        serde_yaml::from_str(&text).map_err(|error| ConfigError::Parse {
            path: self.config_file.clone(),
            details: error.to_string(),
        })
    }

    fn write_atomically(&self, doc: &Mapping) -> Result<(), ConfigError> {
        let serialized =
            serde_yaml::to_string(doc).map_err(|error| ConfigError::Parse {
                path: self.config_file.clone(),
                details: error.to_string(),
            })?;

        let dir = self
            .config_file
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.config_file)
            .map_err(|error| ConfigError::Io(error.error))?;

        Ok(())
    }
}

impl DataPathStore for YamlDataPath {
    fn rewrite_data_path(&self, service: &ServiceVersion) -> Result<PathBuf, ConfigError> {
        let mut doc = self.load()?;

        let data_dir = self.data_base.join(service.id);
        let value = format!("{}/", data_dir.display());
        debug!("Setting {DATA_PATH_KEY} to {value}");

        doc.insert(Value::from(DATA_PATH_KEY), Value::from(value));
        self.write_atomically(&doc)?;

        info!(
            "Rewrote {} to isolate {} data under {}",
            self.config_file.display(),
            service.id,
            data_dir.display()
        );
        Ok(data_dir)
    }
}
