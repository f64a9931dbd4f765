use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

const MAX_LOG_SIZE: u64 = 1024 * 1024;

fn log_file_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("sonar").join("debug.log"))
}

fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

/// Set up terminal + file logging.
///
/// The terminal shows warnings by default and everything with `--verbose`;
/// the file always captures debug output so a failed switch can be
/// diagnosed after the fact.
pub fn init(verbose: bool) {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("sonar")
        .build();

    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(log_path) = log_file_path() {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        trim_log_file_if_oversized(&log_path, MAX_LOG_SIZE);

        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
        }
    }

    let _ = CombinedLogger::init(loggers);
}

#[cfg(test)]
mod tests {
    use super::trim_log_file_if_oversized;

    #[test]
    fn oversized_log_keeps_the_recent_half() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let log_path = temp.path().join("debug.log");
        let original = "line-1\nline-2\nline-3\nline-4\nline-5\n";
        std::fs::write(&log_path, original).expect("write test log");

        trim_log_file_if_oversized(&log_path, 10);

        let trimmed = std::fs::read_to_string(&log_path).expect("read trimmed log");
        assert!(trimmed.starts_with("line-4\n") || trimmed.starts_with("line-3\n"));
        assert!(!trimmed.contains("line-1"));
    }

    #[test]
    fn small_log_is_left_alone() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let log_path = temp.path().join("debug.log");
        std::fs::write(&log_path, "short\n").expect("write test log");

        trim_log_file_if_oversized(&log_path, 1024);

        let contents = std::fs::read_to_string(&log_path).expect("read log");
        assert_eq!(contents, "short\n");
    }
}
