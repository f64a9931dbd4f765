use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use sonar_backend::{BackendError, ServiceVersion};
use sonar_core::{DEFAULT_PLUGINS, EnforceSummary, PluginEnforcer, PluginFailure, PluginSpec};
use sonar_platform::ServicePaths;

use crate::linked::parse_link_target;

/// The plugin management commands the enforcer drives. Split out so tests
/// can record calls without running the real tool.
#[async_trait]
pub trait PluginTool: Send + Sync {
    async fn install(&self, plugin: &str) -> Result<(), BackendError>;

    async fn remove(&self, plugin: &str) -> Result<(), BackendError>;
}

/// The real `opensearch-plugin` binary next to the linked service binary.
pub struct OpenSearchPluginCli {
    tool: PathBuf,
}

impl OpenSearchPluginCli {
    #[must_use]
    pub fn new(tool: PathBuf) -> Self {
        Self { tool }
    }

    async fn execute(&self, args: &[&str]) -> Result<(), BackendError> {
        info!("Executing {} {}", self.tool.display(), args.join(" "));

        let output = Command::new(&self.tool).args(args).output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BackendError::CommandFailed {
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

#[async_trait]
impl PluginTool for OpenSearchPluginCli {
    async fn install(&self, plugin: &str) -> Result<(), BackendError> {
        self.execute(&["install", plugin]).await
    }

    async fn remove(&self, plugin: &str) -> Result<(), BackendError> {
        self.execute(&["remove", plugin]).await
    }
}

/// Keeps installed plugin artifacts in lockstep with the linked binary.
///
/// Plugin artifacts embed the service version they were built against in
/// their file names; after a link swap those artifacts are stale and the
/// plugin tool refuses to load them. The tool has no upgrade verb, so the
/// only supported path is remove-then-reinstall against the new binary.
pub struct OpenSearchPlugins {
    paths: ServicePaths,
    tool: Box<dyn PluginTool>,
    plugins: &'static [PluginSpec],
}

impl OpenSearchPlugins {
    #[must_use]
    pub fn new(paths: ServicePaths) -> Self {
        let tool = OpenSearchPluginCli::new(paths.plugin_tool());
        Self {
            paths,
            tool: Box::new(tool),
            plugins: DEFAULT_PLUGINS,
        }
    }

    #[must_use]
    pub fn with_tool(paths: ServicePaths, tool: Box<dyn PluginTool>) -> Self {
        Self {
            paths,
            tool,
            plugins: DEFAULT_PLUGINS,
        }
    }

    #[must_use]
    pub fn with_plugins(mut self, plugins: &'static [PluginSpec]) -> Self {
        self.plugins = plugins;
        self
    }

    /// The point version of the currently linked binary, recovered from the
    /// plugin tool's symlink target.
    fn linked_version(&self) -> Result<Option<String>, BackendError> {
        let tool_path = self.paths.plugin_tool();
        let target = std::fs::read_link(&tool_path).map_err(|error| {
            BackendError::link_failed(tool_path.display().to_string(), error.to_string())
        })?;

        let linked = parse_link_target(&target)?;
        debug!(
            "Linked plugin tool resolves to {} ({})",
            linked.formula,
            linked.version.as_deref().unwrap_or("no version directory")
        );
        Ok(linked.version)
    }
}

#[async_trait]
impl PluginEnforcer for OpenSearchPlugins {
    async fn enforce(
        &self,
        service: &ServiceVersion,
        only_defaults: bool,
    ) -> Result<EnforceSummary, BackendError> {
        info!("Enforcing plugins for {service}");
        let linked_version = self.linked_version()?;

        let mut summary = EnforceSummary::default();

        for spec in self.plugins {
            if only_defaults && !spec.default {
                continue;
            }

            let plugin_dir = self.paths.plugin_dir(spec.id);
            if !plugin_dir.is_dir() {
                match self.tool.install(spec.id).await {
                    Ok(()) => summary.installed.push(spec.id.to_string()),
                    Err(error) => summary.failed.push(PluginFailure {
                        plugin: spec.id.to_string(),
                        details: error.to_string(),
                    }),
                }
                continue;
            }

            let stale = match &linked_version {
                Some(version) => match has_stale_artifact(&plugin_dir, spec.id, version) {
                    Ok(stale) => stale,
                    Err(error) => {
                        summary.failed.push(PluginFailure {
                            plugin: spec.id.to_string(),
                            details: error.to_string(),
                        });
                        continue;
                    }
                },
                // The legacy unversioned keg layout carries no marker to
                // compare against; leave the plugin as-is.
                None => false,
            };

            if !stale {
                continue;
            }

            let refreshed = async {
                self.tool.remove(spec.id).await?;
                self.tool.install(spec.id).await
            }
            .await;
            match refreshed {
                Ok(()) => summary.reinstalled.push(spec.id.to_string()),
                Err(error) => summary.failed.push(PluginFailure {
                    plugin: spec.id.to_string(),
                    details: error.to_string(),
                }),
            }
        }

        Ok(summary)
    }
}

/// A file naming the plugin without the linked version marker means the
/// artifact was built against a different binary.
fn has_stale_artifact(dir: &Path, plugin: &str, version: &str) -> std::io::Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains(plugin) && !name.contains(version) {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;

    use sonar_backend::{BackendError, ServiceVersion, VersionCatalog};
    use sonar_core::{PluginEnforcer, PluginSpec};
    use sonar_platform::ServicePaths;

    use super::{OpenSearchPlugins, PluginTool};

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct RecordingTool {
        calls: CallLog,
        fail_install: Option<&'static str>,
    }

    #[async_trait]
    impl PluginTool for RecordingTool {
        async fn install(&self, plugin: &str) -> Result<(), BackendError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("install {plugin}"));
            if self.fail_install == Some(plugin) {
                return Err(BackendError::command_failed("download failed"));
            }
            Ok(())
        }

        async fn remove(&self, plugin: &str) -> Result<(), BackendError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("remove {plugin}"));
            Ok(())
        }
    }

    struct Fixture {
        _temp: tempfile::TempDir,
        paths: ServicePaths,
        service: ServiceVersion,
        calls: CallLog,
    }

    impl Fixture {
        fn new(linked_keg: &str) -> Self {
            let temp = tempfile::tempdir().expect("create temp prefix");
            let prefix = temp.path().to_path_buf();

            let target = prefix
                .join("Cellar")
                .join(linked_keg)
                .join("opensearch-plugin");
            std::fs::create_dir_all(target.parent().expect("parent")).expect("create keg dirs");
            std::fs::write(&target, "").expect("write tool binary");

            let bin = prefix.join("bin");
            std::fs::create_dir_all(&bin).expect("create bin dir");
            std::os::unix::fs::symlink(&target, bin.join("opensearch-plugin"))
                .expect("link plugin tool");

            let service = VersionCatalog::search_stack()
                .get("opensearch@2")
                .expect("known id")
                .clone();

            Self {
                paths: ServicePaths::new(prefix),
                service,
                calls: Arc::new(Mutex::new(Vec::new())),
                _temp: temp,
            }
        }

        fn enforcer(&self) -> OpenSearchPlugins {
            self.enforcer_failing(None)
        }

        fn enforcer_failing(&self, fail_install: Option<&'static str>) -> OpenSearchPlugins {
            OpenSearchPlugins::with_tool(
                self.paths.clone(),
                Box::new(RecordingTool {
                    calls: Arc::clone(&self.calls),
                    fail_install,
                }),
            )
        }

        fn seed_artifact(&self, plugin: &str, file: &str) {
            let dir = self.paths.plugin_dir(plugin);
            std::fs::create_dir_all(&dir).expect("create plugin dir");
            std::fs::write(dir.join(file), "").expect("write artifact");
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[tokio::test]
    async fn missing_plugin_dirs_trigger_fresh_installs() {
        let fixture = Fixture::new("opensearch/2.11.1/bin");

        let summary = fixture
            .enforcer()
            .enforce(&fixture.service, true)
            .await
            .expect("enforcement succeeds");

        assert_eq!(summary.installed, vec!["analysis-phonetic", "analysis-icu"]);
        assert!(summary.reinstalled.is_empty());
        assert_eq!(
            fixture.calls(),
            vec!["install analysis-phonetic", "install analysis-icu"]
        );
    }

    #[tokio::test]
    async fn stale_artifact_is_removed_then_reinstalled() {
        let fixture = Fixture::new("opensearch/2.11.1/bin");
        fixture.seed_artifact("analysis-icu", "analysis-icu-2.10.0.jar");
        fixture.seed_artifact("analysis-phonetic", "analysis-phonetic-2.11.1.jar");

        let summary = fixture
            .enforcer()
            .enforce(&fixture.service, true)
            .await
            .expect("enforcement succeeds");

        assert_eq!(summary.reinstalled, vec!["analysis-icu"]);
        assert!(summary.installed.is_empty());
        assert_eq!(
            fixture.calls(),
            vec!["remove analysis-icu", "install analysis-icu"]
        );
    }

    #[tokio::test]
    async fn enforcement_is_idempotent_for_a_matching_version() {
        let fixture = Fixture::new("opensearch/2.11.1/bin");
        fixture.seed_artifact("analysis-icu", "analysis-icu-2.11.1.jar");
        fixture.seed_artifact("analysis-phonetic", "analysis-phonetic-2.11.1.jar");

        for _ in 0..2 {
            let summary = fixture
                .enforcer()
                .enforce(&fixture.service, true)
                .await
                .expect("enforcement succeeds");
            assert!(summary.is_clean());
        }

        assert!(fixture.calls().is_empty());
    }

    #[tokio::test]
    async fn one_failing_plugin_does_not_stop_the_others() {
        let fixture = Fixture::new("opensearch/2.11.1/bin");

        let summary = fixture
            .enforcer_failing(Some("analysis-phonetic"))
            .enforce(&fixture.service, true)
            .await
            .expect("enforcement still succeeds overall");

        assert_eq!(summary.installed, vec!["analysis-icu"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].plugin, "analysis-phonetic");
        assert_eq!(
            fixture.calls(),
            vec!["install analysis-phonetic", "install analysis-icu"]
        );
    }

    #[tokio::test]
    async fn legacy_unversioned_keg_leaves_existing_plugins_alone() {
        let fixture = Fixture::new("opensearch1/bin");
        fixture.seed_artifact("analysis-icu", "analysis-icu-1.3.9.jar");
        fixture.seed_artifact("analysis-phonetic", "analysis-phonetic-1.3.9.jar");

        let summary = fixture
            .enforcer()
            .enforce(&fixture.service, true)
            .await
            .expect("enforcement succeeds");

        assert!(summary.is_clean());
        assert!(fixture.calls().is_empty());
    }

    #[tokio::test]
    async fn non_default_plugins_are_skipped_with_only_defaults() {
        static PLUGINS: &[PluginSpec] = &[
            PluginSpec {
                id: "analysis-icu",
                default: true,
            },
            PluginSpec {
                id: "repository-s3",
                default: false,
            },
        ];

        let fixture = Fixture::new("opensearch/2.11.1/bin");
        let enforcer = fixture.enforcer().with_plugins(PLUGINS);

        let summary = enforcer
            .enforce(&fixture.service, true)
            .await
            .expect("enforcement succeeds");

        assert_eq!(summary.installed, vec!["analysis-icu"]);
        assert_eq!(fixture.calls(), vec!["install analysis-icu"]);
    }

    #[tokio::test]
    async fn missing_plugin_tool_link_is_a_link_failure() {
        let temp = tempfile::tempdir().expect("create temp prefix");
        let fixture_service = VersionCatalog::search_stack()
            .get("opensearch@2")
            .expect("known id")
            .clone();
        let enforcer = OpenSearchPlugins::with_tool(
            ServicePaths::new(temp.path().to_path_buf()),
            Box::new(RecordingTool {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_install: None,
            }),
        );

        let error = enforcer
            .enforce(&fixture_service, true)
            .await
            .expect_err("unresolvable link must fail enforcement");

        assert!(matches!(error, BackendError::LinkFailed { .. }));
    }
}
