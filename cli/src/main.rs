mod discount;
mod draft;
mod template;

use std::sync::Arc;
use std::time::Duration;

use clap::{Arg, Command};
use pulse::{config, Config, Database, TemplateStore};
use tokio_util::sync::CancellationToken;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");

/// Template store shared by all subcommands.
pub type Store = Arc<dyn TemplateStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // If executed in a context where the config file is available it gets
    // picked up right away. Otherwise the config file path can still be
    // provided through the `--config` argument.
    let mut config: Config = config::load().unwrap_or_default();

    let matches = cmd().get_matches();

    if let Some(config_path) = matches.get_one::<String>("config") {
        config = config::load_from(config_path)?;
    }
    if let Some(verbosity) = matches.get_one::<String>("verbosity") {
        config.tracing.level = pulse::tracing::Level::from(verbosity.as_str());
    }
    pulse::tracing::init(&config)?;

    let db = Database::open(&config.store)?;
    let store: Store = Arc::new(db);

    pulse::init::initialize(&config, &*store).await?;
    pulse::mock::generate(&config, &*store).await?;

    match matches.subcommand() {
        Some(("template", m)) => template::run(m, store, cancel.clone()).await?,
        Some(("discount", m)) => discount::run(m, &config, cancel.clone()).await?,
        Some(("draft", m)) => draft::run(m, &config, store, cancel.clone()).await?,
        _ => unreachable!("subcommand is required"),
    }

    // Wait for either ctrl_c signal or the subcommand signaling completion
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("Initiating graceful shutdown...");
            cancel.cancel();
        },
        _ = cancel.cancelled() => {},
    }

    // Give the log delivery task a moment to flush.
    tokio::time::sleep(Duration::from_millis(300)).await;

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("pulse")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .author(AUTHORS)
        .about("Compose, render and store marketing emails. Block by block.")
        .subcommand(template::cmd())
        .subcommand(discount::cmd())
        .subcommand(draft::cmd())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
}
