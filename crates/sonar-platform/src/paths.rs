use std::path::{Path, PathBuf};

use log::debug;

use crate::arch::is_arm64;

const SERVICE: &str = "opensearch";
const LEGACY_SERVICE: &str = "elasticsearch";

/// Locate the Homebrew prefix for this machine.
///
/// Honors `HOMEBREW_PREFIX` when set, otherwise falls back to the standard
/// per-architecture install locations.
#[must_use]
pub fn detect_brew_prefix() -> PathBuf {
    if let Ok(prefix) = std::env::var("HOMEBREW_PREFIX")
        && !prefix.is_empty()
    {
        debug!("Using Homebrew prefix from environment: {prefix}");
        return PathBuf::from(prefix);
    }

    let arm_prefix = Path::new("/opt/homebrew");
    if is_arm64() || arm_prefix.is_dir() {
        return arm_prefix.to_path_buf();
    }

    PathBuf::from("/usr/local")
}

/// Filesystem layout of the managed search service under a Homebrew prefix.
///
/// All mutable on-disk state the switcher touches hangs off these paths:
/// the shared YAML configuration, the per-version data directories, the
/// plugin tree, and the linked binaries.
#[derive(Debug, Clone)]
pub struct ServicePaths {
    prefix: PathBuf,
}

impl ServicePaths {
    #[must_use]
    pub fn new(prefix: PathBuf) -> Self {
        Self { prefix }
    }

    #[must_use]
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// The shared structured configuration file, e.g.
    /// `<prefix>/etc/opensearch/opensearch.yml`.
    #[must_use]
    pub fn config_yaml(&self) -> PathBuf {
        self.prefix
            .join("etc")
            .join(SERVICE)
            .join(format!("{SERVICE}.yml"))
    }

    /// Base directory holding every version's data directory.
    #[must_use]
    pub fn data_base(&self) -> PathBuf {
        self.prefix.join("var").join("lib")
    }

    /// Version-namespaced data directory, e.g. `<prefix>/var/lib/opensearch@2/`.
    #[must_use]
    pub fn data_dir(&self, id: &str) -> PathBuf {
        self.data_base().join(id)
    }

    /// The linked service binary, e.g. `<prefix>/bin/opensearch`.
    #[must_use]
    pub fn binary_link(&self) -> PathBuf {
        self.prefix.join("bin").join(SERVICE)
    }

    /// The plugin management tool shipped next to the service binary.
    #[must_use]
    pub fn plugin_tool(&self) -> PathBuf {
        self.prefix.join("bin").join(format!("{SERVICE}-plugin"))
    }

    #[must_use]
    pub fn plugins_root(&self) -> PathBuf {
        self.prefix.join("var").join(SERVICE).join("plugins")
    }

    #[must_use]
    pub fn plugin_dir(&self, plugin: &str) -> PathBuf {
        self.plugins_root().join(plugin)
    }

    /// Directories removed wholesale on uninstall, covering the current
    /// service layout, the un-namespaced pre-isolation layout, and the
    /// legacy pre-fork naming.
    #[must_use]
    pub fn teardown_dirs(&self) -> Vec<PathBuf> {
        let var = self.prefix.join("var");
        let mut dirs = Vec::new();

        for name in [LEGACY_SERVICE, SERVICE] {
            dirs.push(var.join(name));
            dirs.push(var.join("log").join(name));
            dirs.push(var.join("lib").join(name));
            dirs.push(self.prefix.join("etc").join(name));
        }

        dirs
    }

    /// Stray log files removed on uninstall.
    #[must_use]
    pub fn teardown_files(&self) -> Vec<PathBuf> {
        let log = self.prefix.join("var").join("log");
        vec![
            log.join(format!("{LEGACY_SERVICE}.log")),
            log.join(format!("{SERVICE}.log")),
        ]
    }
}
