mod catalog;
mod error;
mod traits;
mod types;

pub use catalog::{UnsupportedVersion, VersionCatalog};
pub use error::BackendError;
pub use traits::ServiceBackend;
pub use types::{BackendKind, Family, ServiceVersion};
