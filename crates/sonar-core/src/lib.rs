//! Orchestration core for sonar.
//!
//! This crate owns the version-switching engine and the contracts of its
//! collaborators:
//! - The switch/install/uninstall sequences and their rollback policy.
//! - The proxy-registrar and plugin-enforcer seams.
//! - A bounded-retry helper for flaky service supervision calls.

mod error;
mod plugins;
mod proxy;
mod retry;
mod switcher;

pub use error::{RollbackOutcome, StepError, SwitchError, SwitchStep};
pub use plugins::{DEFAULT_PLUGINS, EnforceSummary, PluginEnforcer, PluginFailure, PluginSpec};
pub use proxy::{ProxyError, ProxyRegistrar, RouteSpec};
pub use retry::with_retry;
pub use switcher::{SwitchOutcome, VersionSwitcher};
