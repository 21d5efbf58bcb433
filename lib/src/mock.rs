//! Module tasked with generating mock data to populate the application.

use crate::email::block::{BlockKind, ContentPatch, Styles};
use crate::email::document::Document;
use crate::email::template::{Category, Template, TemplateStore};
use crate::{Config, Result};

pub const WELCOME_TEMPLATE: &str = "Welcome to the program";

/// Generates and saves various mocking data in the store.
pub async fn generate<S: TemplateStore + ?Sized>(config: &Config, store: &S) -> Result<()> {
    if !config.dev.enabled || !config.dev.mock {
        return Ok(());
    }
    welcome_template(config, store).await?;

    Ok(())
}

/// Creates the starter welcome template.
///
/// Returns `None` if a template with the same name already exists and mock
/// regeneration is disabled.
pub async fn welcome_template<S: TemplateStore + ?Sized>(
    config: &Config,
    store: &S,
) -> Result<Option<Template>> {
    let existing = store
        .list(None)
        .await?
        .into_iter()
        .filter(|t| t.name == WELCOME_TEMPLATE)
        .collect::<Vec<_>>();
    if !existing.is_empty() {
        if !config.dev.mock_regen {
            return Ok(None);
        }
        for template in existing {
            store.remove(template.id).await?;
        }
    }

    let mut doc = Document::new();
    doc.subject = format!("Welcome to {}!", config.name);

    let header = doc.append(BlockKind::Header).id.clone();
    doc.update(
        &header,
        ContentPatch::text("Welcome to the program"),
        Styles::new(),
    );
    let intro = doc.append(BlockKind::Text).id.clone();
    doc.update(
        &intro,
        ContentPatch::text(
            "We're excited to have you on board. Your first workout plan is ready \
            and waiting for you.",
        ),
        Styles::new(),
    );
    let cta = doc.append(BlockKind::Button).id.clone();
    let mut styles = Styles::new();
    styles.insert("background-color".to_string(), "#16a34a".to_string());
    doc.update(
        &cta,
        ContentPatch {
            text: Some("Start your first session".to_string()),
            url: Some("https://example.com/start".to_string()),
            ..Default::default()
        },
        styles,
    );
    doc.append(BlockKind::Divider);
    doc.append(BlockKind::Social);

    let template = store
        .insert(doc.to_template(WELCOME_TEMPLATE, Category::Transactional)?)
        .await?;
    tracing::debug!(id = %template.id, "generated mock welcome template");

    Ok(Some(template))
}
