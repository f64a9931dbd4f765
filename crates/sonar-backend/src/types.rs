use serde::{Deserialize, Serialize};
use std::fmt;

/// How a catalog entry is executed on the host machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Installed as a Homebrew formula and supervised by `brew services`.
    Native,
    /// Pulled as an image and run as a container.
    Container,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Container => "container",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "native" => Some(Self::Native),
            "container" => Some(Self::Container),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Elasticsearch,
    OpenSearch,
}

impl Family {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Elasticsearch => "elasticsearch",
            Self::OpenSearch => "opensearch",
        }
    }

    /// Catalog ordering rank. OpenSearch is the maintained line and
    /// outranks Elasticsearch regardless of numeric major.
    #[must_use]
    pub const fn rank(self) -> u32 {
        match self {
            Self::Elasticsearch => 0,
            Self::OpenSearch => 1,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One supported logical version of the search service.
///
/// Entries are defined at catalog-build time and never mutated. The
/// `artifact` is the Homebrew formula name for native entries and the
/// container name for containerized entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceVersion {
    pub id: &'static str,
    pub family: Family,
    pub major: u32,
    pub backend: BackendKind,
    pub artifact: &'static str,
    pub image: Option<&'static str>,
    pub tap: Option<&'static str>,
    pub aliases: &'static [&'static str],
    pub eol: bool,
}

impl ServiceVersion {
    #[must_use]
    pub fn is_docker(&self) -> bool {
        self.backend == BackendKind::Container
    }

    /// Rank used by `VersionCatalog::latest`.
    #[must_use]
    pub fn rank(&self) -> (u32, u32) {
        (self.family.rank(), self.major)
    }
}

impl fmt::Display for ServiceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}
