use serde::Deserialize;

use sonar_backend::BackendError;

/// One row of `brew services list --json`.
#[derive(Debug, Clone, Deserialize)]
pub struct BrewService {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub user: Option<String>,
}

impl BrewService {
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.status == "started"
    }
}

/// Parse the JSON emitted by `brew services list --json`.
///
/// # Errors
/// Fails with a parse error carrying brew's output details when the JSON
/// does not match the expected shape.
pub fn parse_services(json: &str) -> Result<Vec<BrewService>, BackendError> {
    serde_json::from_str(json)
        .map_err(|error| BackendError::parse("brew services list", error.to_string()))
}
