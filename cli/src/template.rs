use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{builder::PossibleValue, Arg, ArgAction, ArgMatches};
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use pulse::init::TemplateFile;
use pulse::{email, Category, Document};

use crate::Store;

pub fn cmd() -> clap::Command {
    clap::Command::new("template")
        .subcommand_required(true)
        .display_order(10)
        .about("Manage stored email templates")
        .subcommand(
            clap::Command::new("list")
                .about("List stored templates, newest first")
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_name("CATEGORY")
                        .value_parser(
                            Category::iter()
                                .map(|c| PossibleValue::new(c.to_string()))
                                .collect::<Vec<PossibleValue>>(),
                        ),
                ),
        )
        .subcommand(
            clap::Command::new("show")
                .about("Print a stored template as json")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            clap::Command::new("render")
                .about("Render a stored template")
                .arg(Arg::new("id").required(true))
                .arg(
                    Arg::new("text")
                        .long("text")
                        .action(ArgAction::SetTrue)
                        .help("Output the plain-text alternative instead of html"),
                ),
        )
        .subcommand(
            clap::Command::new("import")
                .about("Store an email document file as a new template")
                .arg(Arg::new("file").required(true).value_name("PATH")),
        )
        .subcommand(
            clap::Command::new("remove")
                .about("Remove a stored template")
                .arg(Arg::new("id").required(true)),
        )
}

pub async fn run(matches: &ArgMatches, store: Store, cancel: CancellationToken) -> Result<()> {
    match matches.subcommand() {
        Some(("list", m)) => {
            let category = m
                .get_one::<String>("category")
                .map(|c| Category::from_str(c))
                .transpose()?;
            let templates = store.list(category).await?;
            if templates.is_empty() {
                println!("No templates found");
            }
            for template in templates {
                println!(
                    "{}  {:<14} v{:<3} {}  {}",
                    template.id,
                    template.category,
                    template.version,
                    template.updated_at.format("%Y-%m-%d %H:%M"),
                    template.name
                );
            }
        }
        Some(("show", m)) => {
            let template = store.get(id(m)?).await?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        Some(("render", m)) => {
            let template = store.get(id(m)?).await?;
            // Render from the blocks rather than printing the stored markup,
            // which reflects the renderer at save time.
            let document = Document::from_template(&template);
            if m.get_flag("text") {
                println!("{}", email::render_text(&document));
            } else {
                println!("{}", email::render(&document)?);
            }
        }
        Some(("import", m)) => {
            let path = m
                .get_one::<String>("file")
                .ok_or_else(|| anyhow!("file path is required"))?;
            let file = TemplateFile::from_path(path)?;
            let template = store.insert(file.to_template()?).await?;
            println!("Imported template `{}`: {}", template.name, template.id);
        }
        Some(("remove", m)) => {
            let id = id(m)?;
            if store.remove(id).await? {
                println!("Removed template {}", id);
            } else {
                println!("Template {} not found", id);
            }
        }
        _ => unreachable!(),
    }

    cancel.cancel();

    Ok(())
}

fn id(matches: &ArgMatches) -> Result<Uuid> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("template id is required"))?;
    Ok(Uuid::from_str(id)?)
}
