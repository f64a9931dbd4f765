use async_trait::async_trait;

use sonar_backend::{BackendError, ServiceVersion};

/// A plugin the enforcer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginSpec {
    pub id: &'static str,
    pub default: bool,
}

/// Plugins every native installation carries.
pub const DEFAULT_PLUGINS: &[PluginSpec] = &[
    PluginSpec {
        id: "analysis-phonetic",
        default: true,
    },
    PluginSpec {
        id: "analysis-icu",
        default: true,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFailure {
    pub plugin: String,
    pub details: String,
}

/// What an enforcement pass did. Failures are collected here rather than
/// raised: one broken plugin never blocks the others or the switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnforceSummary {
    pub installed: Vec<String>,
    pub reinstalled: Vec<String>,
    pub failed: Vec<PluginFailure>,
}

impl EnforceSummary {
    /// True when the pass issued no install or reinstall at all — the
    /// expected result of running enforcement twice for the same version.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.installed.is_empty() && self.reinstalled.is_empty() && self.failed.is_empty()
    }
}

/// Keeps installed plugin binaries consistent with the linked service
/// version.
#[async_trait]
pub trait PluginEnforcer: Send + Sync {
    /// Enforce the plugin set for `service`. With `only_defaults`, plugins
    /// not marked default are skipped.
    ///
    /// # Errors
    /// Fails only when the linked version cannot be resolved at all;
    /// per-plugin problems land in the summary instead.
    async fn enforce(
        &self,
        service: &ServiceVersion,
        only_defaults: bool,
    ) -> Result<EnforceSummary, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PLUGINS, EnforceSummary, PluginFailure};

    #[test]
    fn default_table_contains_the_analysis_plugins() {
        let ids: Vec<&str> = DEFAULT_PLUGINS.iter().map(|plugin| plugin.id).collect();

        assert_eq!(ids, vec!["analysis-phonetic", "analysis-icu"]);
        assert!(DEFAULT_PLUGINS.iter().all(|plugin| plugin.default));
    }

    #[test]
    fn summary_is_clean_only_without_actions_or_failures() {
        assert!(EnforceSummary::default().is_clean());

        let with_install = EnforceSummary {
            installed: vec!["analysis-icu".to_string()],
            ..EnforceSummary::default()
        };
        assert!(!with_install.is_clean());

        let with_failure = EnforceSummary {
            failed: vec![PluginFailure {
                plugin: "analysis-phonetic".to_string(),
                details: "download failed".to_string(),
            }],
            ..EnforceSummary::default()
        };
        assert!(!with_failure.is_clean());
    }
}
