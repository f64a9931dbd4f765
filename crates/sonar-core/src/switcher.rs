use std::time::Duration;

use log::{info, warn};

use sonar_backend::{BackendError, ServiceBackend, ServiceVersion, VersionCatalog};
use sonar_config::DataPathStore;
use sonar_platform::ServicePaths;

use crate::error::{RollbackOutcome, StepError, SwitchError, SwitchStep};
use crate::plugins::{EnforceSummary, PluginEnforcer};
use crate::proxy::{ProxyRegistrar, RouteSpec};
use crate::retry::with_retry;

const START_ATTEMPTS: u32 = 3;
const START_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The requested version was already running; nothing was touched.
    AlreadyActive { id: &'static str },
    Switched {
        previous: Option<&'static str>,
        id: &'static str,
    },
}

/// Drives the full version switch: resolve the current version, validate
/// the target, tear the previous version down, bring the target up, and
/// keep config, plugins, and the proxy route consistent along the way.
///
/// Collaborators are injected at construction; the switcher holds no
/// mutable state of its own and performs every step strictly sequentially.
/// Rollback on a failed step is best-effort: the previously running version
/// is re-activated and restarted when there was one, otherwise the service
/// is left stopped.
pub struct VersionSwitcher<'a> {
    catalog: &'a VersionCatalog,
    native: &'a dyn ServiceBackend,
    container: &'a dyn ServiceBackend,
    data_path: &'a dyn DataPathStore,
    plugins: &'a dyn PluginEnforcer,
    proxy: &'a dyn ProxyRegistrar,
    paths: ServicePaths,
    route: RouteSpec,
}

impl<'a> VersionSwitcher<'a> {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        catalog: &'a VersionCatalog,
        native: &'a dyn ServiceBackend,
        container: &'a dyn ServiceBackend,
        data_path: &'a dyn DataPathStore,
        plugins: &'a dyn PluginEnforcer,
        proxy: &'a dyn ProxyRegistrar,
        paths: ServicePaths,
        route: RouteSpec,
    ) -> Self {
        Self {
            catalog,
            native,
            container,
            data_path,
            plugins,
            proxy,
            paths,
            route,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &'a VersionCatalog {
        self.catalog
    }

    #[must_use]
    pub fn route(&self) -> &RouteSpec {
        &self.route
    }

    fn backend_for(&self, service: &ServiceVersion) -> &'a dyn ServiceBackend {
        if service.is_docker() {
            self.container
        } else {
            self.native
        }
    }

    /// The version currently reported running, if any. Queried live on
    /// every call; nothing is cached.
    ///
    /// # Errors
    /// Returns an error when a backend query fails.
    pub async fn current_version(&self) -> Result<Option<&'a ServiceVersion>, BackendError> {
        if let Some(service) = self.native.currently_running(self.catalog).await? {
            return Ok(Some(service));
        }

        self.container.currently_running(self.catalog).await
    }

    /// Switch to the requested version (free-form input, resolved through
    /// the catalog).
    ///
    /// # Errors
    /// `UnsupportedVersion` when the input resolves to nothing — no side
    /// effects have happened at that point. Otherwise a step-tagged error
    /// carrying the rollback outcome.
    pub async fn use_version(&self, input: &str) -> Result<SwitchOutcome, SwitchError> {
        let target = self.catalog.normalize(input)?;
        self.switch_to(target).await
    }

    /// Install the requested version (default: the latest non-EOL entry)
    /// and switch to it.
    ///
    /// # Errors
    /// Same failure modes as [`Self::use_version`].
    pub async fn install(&self, input: Option<&str>) -> Result<SwitchOutcome, SwitchError> {
        let target = match input {
            Some(requested) => self.catalog.normalize(requested)?,
            None => self
                .catalog
                .latest()
                .ok_or_else(|| sonar_backend::UnsupportedVersion {
                    requested: "latest".to_string(),
                    supported: self.catalog.supported_ids(),
                })?,
        };

        self.switch_to(target).await
    }

    async fn switch_to(&self, target: &'a ServiceVersion) -> Result<SwitchOutcome, SwitchError> {
        let previous = self.current_version().await.map_err(|error| {
            SwitchError::step_failed(
                target.id,
                SwitchStep::Inspect,
                error,
                RollbackOutcome::NotNeeded,
            )
        })?;

        // Switching to the active version is an explicit no-op.
        if previous.map(|service| service.id) == Some(target.id) {
            info!("Already on {target}");
            return Ok(SwitchOutcome::AlreadyActive { id: target.id });
        }

        if let Some(prev) = previous {
            info!("Stopping {prev}");
            let backend = self.backend_for(prev);
            backend.stop(prev).await.map_err(|error| {
                SwitchError::step_failed(
                    target.id,
                    SwitchStep::Stop,
                    error,
                    RollbackOutcome::NotNeeded,
                )
            })?;
            if let Err(error) = backend.deactivate(prev).await {
                return Err(self.fail_step(target, SwitchStep::Stop, error, previous).await);
            }
        }

        let backend = self.backend_for(target);

        match backend.installed(target).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Installing {target}");
                if let Err(error) = backend.install(target).await {
                    return Err(self
                        .fail_step(target, SwitchStep::Install, error, previous)
                        .await);
                }
            }
            Err(error) => {
                return Err(self
                    .fail_step(target, SwitchStep::Install, error, previous)
                    .await);
            }
        }
        if let Err(error) = backend.activate(target).await {
            return Err(self
                .fail_step(target, SwitchStep::Install, error, previous)
                .await);
        }

        // Containerized versions carry no shared on-disk config and manage
        // their own plugin set inside the image.
        if !target.is_docker() {
            if let Err(error) = self.data_path.rewrite_data_path(target) {
                return Err(self
                    .fail_step(target, SwitchStep::Configure, error, previous)
                    .await);
            }

            match self.plugins.enforce(target, true).await {
                Ok(summary) => log_enforcement(target, &summary),
                Err(error) => {
                    warn!("Plugin enforcement for {target} failed, continuing: {error}");
                }
            }
        }

        info!("Starting {target}");
        let started = with_retry(START_ATTEMPTS, START_RETRY_DELAY, || backend.start(target)).await;
        if let Err(error) = started {
            return Err(self
                .fail_step(target, SwitchStep::Start, error, previous)
                .await);
        }

        // The target is up at this point; a route failure is surfaced
        // without tearing the freshly started service back down.
        let route = &self.route;
        if let Err(error) = self
            .proxy
            .register_route(&route.fqdn(), &route.upstream, route.secure)
            .await
        {
            return Err(SwitchError::step_failed(
                target.id,
                SwitchStep::RegisterRoute,
                error,
                RollbackOutcome::NotNeeded,
            ));
        }

        info!("Now using {target}");
        Ok(SwitchOutcome::Switched {
            previous: previous.map(|service| service.id),
            id: target.id,
        })
    }

    /// Remove every trace of the service: proxy route, all versions across
    /// both backends, version-namespaced and legacy state directories, and
    /// the binary symlink. Every removal checks existence first, so running
    /// this on a machine that never had the service installed succeeds
    /// without issuing any stop or remove call.
    ///
    /// # Errors
    /// Returns the first failing removal, tagged with its subject.
    pub async fn uninstall(&self) -> Result<(), SwitchError> {
        info!("Removing proxy route {}", self.route.fqdn());
        self.proxy
            .remove_route(&self.route.fqdn())
            .await
            .map_err(|error| SwitchError::uninstall_failed("proxy route", error))?;

        for service in self.catalog.entries() {
            let backend = self.backend_for(service);

            if backend
                .is_running(service)
                .await
                .map_err(|error| SwitchError::uninstall_failed(service.id, error))?
            {
                info!("Stopping {service}");
                backend
                    .stop(service)
                    .await
                    .map_err(|error| SwitchError::uninstall_failed(service.id, error))?;
            }

            if backend
                .installed(service)
                .await
                .map_err(|error| SwitchError::uninstall_failed(service.id, error))?
            {
                info!("Removing {service}");
                backend
                    .uninstall(service)
                    .await
                    .map_err(|error| SwitchError::uninstall_failed(service.id, error))?;
            }
        }

        self.remove_state().map_err(|error| {
            SwitchError::uninstall_failed("on-disk state", BackendError::from(error))
        })
    }

    async fn fail_step(
        &self,
        target: &ServiceVersion,
        step: SwitchStep,
        source: impl Into<StepError>,
        previous: Option<&ServiceVersion>,
    ) -> SwitchError {
        let rollback = self.roll_back(previous).await;
        SwitchError::step_failed(target.id, step, source, rollback)
    }

    async fn roll_back(&self, previous: Option<&ServiceVersion>) -> RollbackOutcome {
        let Some(prev) = previous else {
            return RollbackOutcome::NotNeeded;
        };

        warn!("Switch failed, rolling back to {prev}");
        let backend = self.backend_for(prev);
        let restored = async {
            backend.activate(prev).await?;
            backend.start(prev).await
        }
        .await;

        match restored {
            Ok(()) => RollbackOutcome::Restored {
                id: prev.id.to_string(),
            },
            Err(error) => {
                warn!("Rollback to {prev} failed: {error}");
                RollbackOutcome::Failed {
                    id: prev.id.to_string(),
                    details: error.to_string(),
                }
            }
        }
    }

    fn remove_state(&self) -> std::io::Result<()> {
        let mut dirs = self.paths.teardown_dirs();
        for service in self.catalog.entries() {
            dirs.push(self.paths.data_dir(service.id));
        }

        for dir in dirs {
            if dir.is_dir() {
                info!("Removing {}", dir.display());
                std::fs::remove_dir_all(&dir)?;
            }
        }

        for file in self.paths.teardown_files() {
            if file.is_file() {
                info!("Removing {}", file.display());
                std::fs::remove_file(&file)?;
            }
        }

        let link = self.paths.binary_link();
        if link.is_symlink() {
            info!("Removing {}", link.display());
            std::fs::remove_file(&link)?;
        }

        Ok(())
    }
}

fn log_enforcement(service: &ServiceVersion, summary: &EnforceSummary) {
    if summary.is_clean() {
        info!("Plugins for {service} already consistent");
        return;
    }

    for plugin in &summary.installed {
        info!("Installed plugin {plugin} for {service}");
    }
    for plugin in &summary.reinstalled {
        info!("Reinstalled plugin {plugin} for {service}");
    }
    for failure in &summary.failed {
        warn!(
            "Plugin {} could not be enforced for {service}: {}",
            failure.plugin, failure.details
        );
    }
}
