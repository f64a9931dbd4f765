mod backends;
mod cli;
mod logging;
mod proxy;

use anyhow::Result;
use clap::Parser;

use sonar_backend::VersionCatalog;
use sonar_config::YamlDataPath;
use sonar_core::{RouteSpec, SwitchOutcome, VersionSwitcher};
use sonar_platform::{ServicePaths, detect_brew_prefix};

use crate::cli::{Cli, Commands};
use crate::proxy::NginxRoutes;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    let catalog = VersionCatalog::search_stack();
    let paths = ServicePaths::new(detect_brew_prefix());

    let native = backends::native_backend();
    let container = backends::container_backend();
    let data_path = YamlDataPath::for_paths(&paths);
    let enforcer = sonar_brew::OpenSearchPlugins::new(paths.clone());
    let registrar = NginxRoutes::new(paths.prefix());

    let switcher = VersionSwitcher::new(
        &catalog,
        native.as_ref(),
        container.as_ref(),
        &data_path,
        &enforcer,
        &registrar,
        paths,
        RouteSpec::elasticsearch(args.tld.as_str()),
    );

    match args.command {
        Commands::Use { version } => {
            let outcome = switcher.use_version(&version).await?;
            report(&outcome);
        }
        Commands::Install { version } => {
            let outcome = switcher.install(version.as_deref()).await?;
            report(&outcome);
        }
        Commands::Uninstall => {
            switcher.uninstall().await?;
            println!("All managed versions and their state have been removed.");
        }
        Commands::Status => {
            status(&switcher).await?;
        }
    }

    Ok(())
}

fn report(outcome: &SwitchOutcome) {
    match outcome {
        SwitchOutcome::AlreadyActive { id } => println!("Already on {id}"),
        SwitchOutcome::Switched {
            previous: Some(previous),
            id,
        } => println!("Switched from {previous} to {id}. You might need to reindex your data."),
        SwitchOutcome::Switched { previous: None, id } => println!("Now using {id}"),
    }
}

async fn status(switcher: &VersionSwitcher<'_>) -> Result<()> {
    let current = switcher.current_version().await?;
    match current {
        Some(service) => println!("Running: {service}"),
        None => println!("Running: none"),
    }

    let route = switcher.route();
    println!("Route:   {} -> {}", route.fqdn(), route.upstream);

    println!("Supported versions:");
    let latest = switcher.catalog().latest().map(|service| service.id);
    for service in switcher.catalog().entries() {
        let mut notes = vec![service.backend.as_str()];
        if service.eol {
            notes.push("EOL");
        }
        if latest == Some(service.id) {
            notes.push("latest");
        }
        println!("  {:<17} ({})", service.id, notes.join(", "));
    }

    Ok(())
}
