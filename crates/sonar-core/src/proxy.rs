use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Proxy reload failed: {details}")]
    Reload { details: String },
}

/// The route the switcher keeps pointing at the active instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub domain: String,
    pub tld: String,
    pub upstream: String,
    pub secure: bool,
}

impl RouteSpec {
    /// The well-known route for the search service: the service always
    /// listens on 9200 locally, whichever version is active.
    #[must_use]
    pub fn elasticsearch(tld: impl Into<String>) -> Self {
        Self {
            domain: "elasticsearch".to_string(),
            tld: tld.into(),
            upstream: "http://127.0.0.1:9200".to_string(),
            secure: true,
        }
    }

    #[must_use]
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.domain, self.tld)
    }
}

/// Host-routing collaborator: one rule per domain, created on install and
/// deleted on uninstall.
#[async_trait]
pub trait ProxyRegistrar: Send + Sync {
    async fn register_route(
        &self,
        domain: &str,
        upstream: &str,
        secure: bool,
    ) -> Result<(), ProxyError>;

    /// Removing a route that does not exist is a no-op.
    async fn remove_route(&self, domain: &str) -> Result<(), ProxyError>;
}
