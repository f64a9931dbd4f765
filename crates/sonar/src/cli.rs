use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sonar")]
#[command(about = "Versioned search-service manager for local development")]
#[command(version)]
pub struct Cli {
    /// Print debug logging to the terminal
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Top-level domain for the proxy route
    #[arg(long, default_value = "test", global = true)]
    pub tld: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Switch to a version ("opensearch@2", "elasticsearch7", "7", ...)
    Use {
        /// Version id, alias, or bare major
        version: String,
    },
    /// Install a version and switch to it (defaults to the latest)
    Install {
        /// Version id, alias, or bare major
        version: Option<String>,
    },
    /// Stop and remove every managed version and its on-disk state
    Uninstall,
    /// Show the running version and the supported catalog
    Status,
}
