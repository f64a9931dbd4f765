mod data_path;

pub use data_path::{ConfigError, DATA_PATH_KEY, DataPathStore, YamlDataPath};
