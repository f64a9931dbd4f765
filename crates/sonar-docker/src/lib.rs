mod backend;
mod client;

pub use backend::DockerBackend;
pub use client::DockerClient;
