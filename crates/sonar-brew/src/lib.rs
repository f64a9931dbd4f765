mod backend;
mod client;
mod linked;
mod plugins;
mod services;

pub use backend::BrewBackend;
pub use client::BrewClient;
pub use linked::{LinkedInstall, parse_link_target};
pub use plugins::{OpenSearchPluginCli, OpenSearchPlugins, PluginTool};
pub use services::{BrewService, parse_services};
