//! Shortest path from an empty document to a stored, rendered email.

use pulse::email::block::{ContentPatch, Styles};
use pulse::email::discount::DiscountCode;
use pulse::{BlockKind, Category, Database, Editor};
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut editor = Editor::new(Database::temporary()?);
    editor.document_mut().subject = "Spring strength challenge".to_string();

    let header = editor.insert(BlockKind::Header).id.clone();
    let text = editor.insert(BlockKind::Text).id.clone();
    editor.insert_discount(&DiscountCode {
        id: "SPRING20".to_string(),
        percent_off: Some(dec!(20)),
        name: "Early bird".to_string(),
        ..Default::default()
    });
    let button = editor.insert(BlockKind::Button).id.clone();

    let doc = editor.document_mut();
    doc.update(&header, ContentPatch::text("Four weeks. Three sessions a week."), Styles::new());
    doc.update(
        &text,
        ContentPatch::text("Join the challenge and track your lifts with your coach."),
        Styles::new(),
    );
    doc.update(
        &button,
        ContentPatch {
            text: Some("Sign me up".to_string()),
            url: Some("https://example.com/spring".to_string()),
            ..Default::default()
        },
        Styles::new(),
    );

    let template = editor
        .save_as_template("Spring challenge", Category::Marketing)
        .await?;
    println!("{}", template.html_content);

    Ok(())
}
