use anyhow::Result;
use clap::ArgMatches;
use tokio_util::sync::CancellationToken;

use pulse::email::discount;
use pulse::Config;

pub fn cmd() -> clap::Command {
    clap::Command::new("discount")
        .subcommand_required(true)
        .display_order(20)
        .about("Discount codes available for email offers")
        .subcommand(clap::Command::new("list").about("List currently active codes"))
}

pub async fn run(matches: &ArgMatches, config: &Config, cancel: CancellationToken) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let codes = discount::from_config(config).list_active_codes().await?;
            if codes.is_empty() {
                println!("No active discount codes");
            }
            for code in codes {
                let content = code.to_content();
                match content.expiry {
                    Some(expiry) => {
                        println!("{:<16} {} (expires {})", code.id, content.description, expiry)
                    }
                    None => println!("{:<16} {}", code.id, content.description),
                }
            }
        }
        _ => unreachable!(),
    }

    cancel.cancel();

    Ok(())
}
