use thiserror::Error;

use crate::types::{BackendKind, Family, ServiceVersion};

/// Tap providing the maintained OpenSearch formulae.
pub const OPENSEARCH_TAP: &str = "nntoan/opensearch-maintenance";

const SEARCH_STACK: &[ServiceVersion] = &[
    ServiceVersion {
        id: "opensearch@1",
        family: Family::OpenSearch,
        major: 1,
        backend: BackendKind::Native,
        artifact: "opensearch@1",
        image: None,
        tap: Some(OPENSEARCH_TAP),
        aliases: &["opensearch1", "1"],
        eol: true,
    },
    ServiceVersion {
        id: "opensearch@2",
        family: Family::OpenSearch,
        major: 2,
        backend: BackendKind::Native,
        artifact: "opensearch",
        image: None,
        tap: Some(OPENSEARCH_TAP),
        aliases: &["opensearch", "opensearch2", "2"],
        eol: false,
    },
    ServiceVersion {
        id: "elasticsearch@6",
        family: Family::Elasticsearch,
        major: 6,
        backend: BackendKind::Container,
        artifact: "elasticsearch6",
        image: Some("docker.elastic.co/elasticsearch/elasticsearch:6.8.23"),
        tap: None,
        aliases: &["elasticsearch6", "6"],
        eol: true,
    },
    ServiceVersion {
        id: "elasticsearch@7",
        family: Family::Elasticsearch,
        major: 7,
        backend: BackendKind::Container,
        artifact: "elasticsearch7",
        image: Some("docker.elastic.co/elasticsearch/elasticsearch:7.17.24"),
        tap: None,
        aliases: &["elasticsearch7", "7"],
        eol: false,
    },
    ServiceVersion {
        id: "elasticsearch@8",
        family: Family::Elasticsearch,
        major: 8,
        backend: BackendKind::Container,
        artifact: "elasticsearch8",
        image: Some("docker.elastic.co/elasticsearch/elasticsearch:8.15.2"),
        tap: None,
        aliases: &["elasticsearch8", "8"],
        eol: false,
    },
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported version '{requested}'. Available versions: {}", supported.join(", "))]
pub struct UnsupportedVersion {
    pub requested: String,
    pub supported: Vec<String>,
}

/// Immutable table of supported service versions.
///
/// Built once at process start and passed by reference into the components
/// that need it. Pure lookups only; no I/O.
#[derive(Debug, Clone)]
pub struct VersionCatalog {
    entries: Vec<ServiceVersion>,
}

impl VersionCatalog {
    #[must_use]
    pub fn new(entries: Vec<ServiceVersion>) -> Self {
        Self { entries }
    }

    /// The standard OpenSearch/Elasticsearch catalog.
    #[must_use]
    pub fn search_stack() -> Self {
        Self::new(SEARCH_STACK.to_vec())
    }

    pub fn entries(&self) -> impl Iterator<Item = &ServiceVersion> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ServiceVersion> {
        self.entries.iter().find(|service| service.id == id)
    }

    /// Resolve free-form user input to a catalog entry.
    ///
    /// Accepts canonical ids (`opensearch@2`), historical spellings
    /// (`elasticsearch7`, `opensearch`), and bare majors (`"7"`); majors are
    /// unique across the catalog, so a digit is unambiguous.
    ///
    /// # Errors
    /// Returns [`UnsupportedVersion`] listing the supported ids when no
    /// entry matches.
    pub fn normalize(&self, input: &str) -> Result<&ServiceVersion, UnsupportedVersion> {
        let needle = input.trim().to_ascii_lowercase();

        self.entries
            .iter()
            .find(|service| service.id == needle || service.aliases.contains(&needle.as_str()))
            .ok_or_else(|| UnsupportedVersion {
                requested: input.trim().to_string(),
                supported: self.supported_ids(),
            })
    }

    #[must_use]
    pub fn is_supported(&self, input: &str) -> bool {
        self.normalize(input).is_ok()
    }

    /// Whether the given input resolves to a containerized entry.
    #[must_use]
    pub fn is_docker(&self, input: &str) -> bool {
        self.normalize(input).is_ok_and(ServiceVersion::is_docker)
    }

    /// The newest supported version, excluding end-of-life entries.
    ///
    /// Ordering is (family rank, major): the OpenSearch line supersedes the
    /// Elasticsearch line it forked from, then higher majors win.
    #[must_use]
    pub fn latest(&self) -> Option<&ServiceVersion> {
        self.entries
            .iter()
            .filter(|service| !service.eol)
            .max_by_key(|service| service.rank())
    }

    #[must_use]
    pub fn supported_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|service| service.id.to_string())
            .collect()
    }
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self::search_stack()
    }
}
