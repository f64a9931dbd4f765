use async_trait::async_trait;

use crate::catalog::VersionCatalog;
use crate::error::BackendError;
use crate::types::{BackendKind, ServiceVersion};

/// Uniform surface over the two execution backends.
///
/// Implementations shell out to an external supervisor (`brew services`,
/// `docker`) and never cache installed/running state: every query hits the
/// backend live, so state stays correct after changes made outside this
/// process. Stop and start are idempotent — stopping an already-stopped
/// service is a no-op, not an error.
#[async_trait]
pub trait ServiceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn installed(&self, service: &ServiceVersion) -> Result<bool, BackendError>;

    async fn install(&self, service: &ServiceVersion) -> Result<(), BackendError>;

    async fn uninstall(&self, service: &ServiceVersion) -> Result<(), BackendError>;

    async fn start(&self, service: &ServiceVersion) -> Result<(), BackendError>;

    async fn stop(&self, service: &ServiceVersion) -> Result<(), BackendError>;

    async fn is_running(&self, service: &ServiceVersion) -> Result<bool, BackendError>;

    /// Make this version the linked one. Containers have no link concept.
    async fn activate(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
        Ok(())
    }

    /// Drop this version's binary links. Containers have no link concept.
    async fn deactivate(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
        Ok(())
    }

    async fn restart(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        self.stop(service).await?;
        self.start(service).await
    }

    /// The first catalog entry of this backend's kind that reports running.
    async fn currently_running<'c>(
        &self,
        catalog: &'c VersionCatalog,
    ) -> Result<Option<&'c ServiceVersion>, BackendError> {
        for service in catalog.entries() {
            if service.backend != self.kind() {
                continue;
            }
            if self.is_running(service).await? {
                return Ok(Some(service));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{BackendError, BackendKind, ServiceBackend, ServiceVersion, VersionCatalog};

    struct RecordingBackend {
        kind: BackendKind,
        running: &'static str,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn new(kind: BackendKind, running: &'static str) -> Self {
            Self {
                kind,
                running,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl ServiceBackend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn installed(&self, _service: &ServiceVersion) -> Result<bool, BackendError> {
            Ok(true)
        }

        async fn install(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
            Ok(())
        }

        async fn uninstall(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
            Ok(())
        }

        async fn start(&self, service: &ServiceVersion) -> Result<(), BackendError> {
            self.record(format!("start {service}"));
            Ok(())
        }

        async fn stop(&self, service: &ServiceVersion) -> Result<(), BackendError> {
            self.record(format!("stop {service}"));
            Ok(())
        }

        async fn is_running(&self, service: &ServiceVersion) -> Result<bool, BackendError> {
            self.record(format!("is_running {service}"));
            Ok(service.id == self.running)
        }
    }

    #[tokio::test]
    async fn currently_running_scans_only_entries_of_own_kind() {
        let catalog = VersionCatalog::search_stack();
        let backend = RecordingBackend::new(BackendKind::Container, "elasticsearch@7");

        let running = backend
            .currently_running(&catalog)
            .await
            .expect("scan should succeed")
            .expect("elasticsearch@7 reports running");

        assert_eq!(running.id, "elasticsearch@7");
        let calls = backend.calls();
        assert!(calls.iter().all(|call| !call.contains("opensearch")));
    }

    #[tokio::test]
    async fn currently_running_returns_none_when_nothing_started() {
        let catalog = VersionCatalog::search_stack();
        let backend = RecordingBackend::new(BackendKind::Native, "nothing");

        let running = backend
            .currently_running(&catalog)
            .await
            .expect("scan should succeed");

        assert!(running.is_none());
    }

    #[tokio::test]
    async fn default_restart_stops_then_starts() {
        let catalog = VersionCatalog::search_stack();
        let service = catalog.get("opensearch@2").expect("known id").clone();
        let backend = RecordingBackend::new(BackendKind::Native, "nothing");

        backend
            .restart(&service)
            .await
            .expect("restart should succeed");

        assert_eq!(
            backend.calls(),
            vec!["stop opensearch@2", "start opensearch@2"]
        );
    }

    #[tokio::test]
    async fn default_activate_and_deactivate_are_no_ops() {
        let catalog = VersionCatalog::search_stack();
        let service = catalog.get("elasticsearch@7").expect("known id").clone();
        let backend = RecordingBackend::new(BackendKind::Container, "nothing");

        backend.activate(&service).await.expect("activate");
        backend.deactivate(&service).await.expect("deactivate");

        assert!(backend.calls().is_empty());
    }
}
