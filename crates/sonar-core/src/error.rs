use std::fmt;

use thiserror::Error;

use sonar_backend::{BackendError, UnsupportedVersion};
use sonar_config::ConfigError;

use crate::proxy::ProxyError;

/// The step of the switch sequence an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStep {
    Inspect,
    Stop,
    Install,
    Configure,
    Start,
    RegisterRoute,
}

impl SwitchStep {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inspect => "inspecting running services",
            Self::Stop => "stopping the previous version",
            Self::Install => "installing",
            Self::Configure => "rewriting the data path",
            Self::Start => "starting",
            Self::RegisterRoute => "registering the proxy route",
        }
    }
}

impl fmt::Display for SwitchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// What happened to the previously running version after a failed switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// Nothing was running before the switch, or the failure happened
    /// before any side effect.
    NotNeeded,
    /// The previous version was re-activated and restarted.
    Restored { id: String },
    /// Best-effort rollback also failed; the service is left stopped.
    Failed { id: String, details: String },
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNeeded => write!(f, "no rollback needed"),
            Self::Restored { id } => write!(f, "rolled back to {id}"),
            Self::Failed { id, details } => {
                write!(f, "rollback to {id} also failed: {details}; service left stopped")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedVersion),

    #[error("Switching to {version} failed while {step}: {source} ({rollback})")]
    StepFailed {
        version: String,
        step: SwitchStep,
        #[source]
        source: StepError,
        rollback: RollbackOutcome,
    },

    #[error("Uninstalling {subject} failed: {source}")]
    UninstallFailed {
        subject: String,
        #[source]
        source: StepError,
    },
}

impl SwitchError {
    pub fn step_failed(
        version: &str,
        step: SwitchStep,
        source: impl Into<StepError>,
        rollback: RollbackOutcome,
    ) -> Self {
        Self::StepFailed {
            version: version.to_string(),
            step,
            source: source.into(),
            rollback,
        }
    }

    pub fn uninstall_failed(subject: impl Into<String>, source: impl Into<StepError>) -> Self {
        Self::UninstallFailed {
            subject: subject.into(),
            source: source.into(),
        }
    }
}
