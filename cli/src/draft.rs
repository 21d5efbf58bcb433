use std::str::FromStr;

use anyhow::Result;
use clap::{builder::PossibleValue, Arg, ArgAction, ArgMatches};
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use pulse::email::draft::{DraftClient, DraftOptions, EmailType, Tone};
use pulse::{email, Category, Config, Editor};

use crate::Store;

pub fn cmd() -> clap::Command {
    clap::Command::new("draft")
        .display_order(30)
        .about("Generate an email draft and print it as html")
        .arg(
            Arg::new("type")
                .long("type")
                .short('t')
                .value_name("TYPE")
                .default_value("promotional")
                .value_parser(
                    EmailType::iter()
                        .map(|t| PossibleValue::new(t.to_string()))
                        .collect::<Vec<PossibleValue>>(),
                ),
        )
        .arg(
            Arg::new("tone")
                .long("tone")
                .value_name("TONE")
                .default_value("friendly")
                .value_parser(
                    Tone::iter()
                        .map(|t| PossibleValue::new(t.to_string()))
                        .collect::<Vec<PossibleValue>>(),
                ),
        )
        .arg(
            Arg::new("discount")
                .long("discount")
                .action(ArgAction::SetTrue)
                .help("Ask for a discount offer to be included"),
        )
        .arg(
            Arg::new("prompt")
                .long("prompt")
                .short('p')
                .value_name("TEXT")
                .help("Additional instructions for the draft"),
        )
        .arg(
            Arg::new("save")
                .long("save")
                .value_name("NAME")
                .help("Store the draft as a template with the given name"),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_name("CATEGORY")
                .requires("save")
                .value_parser(
                    Category::iter()
                        .map(|c| PossibleValue::new(c.to_string()))
                        .collect::<Vec<PossibleValue>>(),
                ),
        )
}

pub async fn run(
    matches: &ArgMatches,
    config: &Config,
    store: Store,
    cancel: CancellationToken,
) -> Result<()> {
    let options = DraftOptions {
        email_type: matches
            .get_one::<String>("type")
            .map(|t| EmailType::from_str(t))
            .transpose()?
            .unwrap_or_default(),
        tone: matches
            .get_one::<String>("tone")
            .map(|t| Tone::from_str(t))
            .transpose()?
            .unwrap_or_default(),
        include_discount: matches.get_flag("discount"),
        prompt: matches
            .get_one::<String>("prompt")
            .cloned()
            .unwrap_or_default(),
    };

    let client = DraftClient::new(&config.drafting)?;
    let mut editor = Editor::new(store);
    editor.apply_draft(&client, &options).await?;

    if let Some(name) = matches.get_one::<String>("save") {
        let category = matches
            .get_one::<String>("category")
            .map(|c| Category::from_str(c))
            .transpose()?
            .unwrap_or_default();
        let template = editor.save_as_template(name, category).await?;
        eprintln!("Saved draft as template `{}`: {}", template.name, template.id);
    }

    println!("{}", email::render(editor.document())?);

    cancel.cancel();

    Ok(())
}
