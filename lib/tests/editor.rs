//! End-to-end editing sessions against stub collaborators and a temporary
//! database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use pulse::email::block::{ButtonContent, ContentPatch, Styles, TextContent};
use pulse::email::discount::{DiscountCode, DiscountSource, StaticDiscounts};
use pulse::email::draft::{Draft, DraftOptions, DraftSource};
use pulse::{
    email, Block, BlockKind, Category, Content, Database, Editor, ErrorKind, Result, Template,
    TemplateStore,
};

/// Store that records inserted templates and can be told to fail.
#[derive(Default)]
struct RecordingStore {
    inserted: Mutex<Vec<Template>>,
    fail: bool,
}

impl RecordingStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(ErrorKind::DbConflict("store unavailable".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for RecordingStore {
    async fn list(&self, _category: Option<Category>) -> Result<Vec<Template>> {
        self.check()?;
        Ok(self.inserted.lock().unwrap().clone())
    }

    async fn get(&self, id: Uuid) -> Result<Template> {
        self.check()?;
        self.inserted
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ErrorKind::TemplateNotFound(id).into())
    }

    async fn insert(&self, template: Template) -> Result<Template> {
        self.check()?;
        self.inserted.lock().unwrap().push(template.clone());
        Ok(template)
    }

    async fn update(&self, template: Template) -> Result<Template> {
        self.check()?;
        Ok(template)
    }

    async fn remove(&self, _id: Uuid) -> Result<bool> {
        self.check()?;
        Ok(false)
    }
}

struct StubDrafts(Draft);

#[async_trait]
impl DraftSource for StubDrafts {
    async fn draft(&self, _options: &DraftOptions) -> Result<Draft> {
        Ok(self.0.clone())
    }
}

struct FailingDrafts;

#[async_trait]
impl DraftSource for FailingDrafts {
    async fn draft(&self, _options: &DraftOptions) -> Result<Draft> {
        Err(ErrorKind::DraftFailed("500 Internal Server Error".to_string()).into())
    }
}

fn contents(blocks: &[Block]) -> Vec<Content> {
    blocks.iter().map(|b| b.content.clone()).collect()
}

#[test]
fn updated_header_is_rendered_once() -> anyhow::Result<()> {
    let mut editor = Editor::new(RecordingStore::default());
    let id = editor.insert(BlockKind::Header).id.clone();
    editor
        .document_mut()
        .update(&id, ContentPatch::text("Hello"), Styles::new());

    let html = email::render(editor.document())?;
    assert!(html.contains("<h1"));
    assert_eq!(html.matches("Hello").count(), 1);
    Ok(())
}

#[test]
fn default_button_links_nowhere() -> anyhow::Result<()> {
    let mut editor = Editor::new(RecordingStore::default());
    editor.insert(BlockKind::Button);

    let html = email::render(editor.document())?;
    assert!(html.contains("<a"));
    assert!(html.contains(r##"href="#""##));
    assert!(html.contains("Click Here"));
    Ok(())
}

#[test]
fn header_moves_to_the_end() {
    let mut editor = Editor::new(RecordingStore::default());
    editor.insert(BlockKind::Header);
    editor.insert(BlockKind::Text);
    editor.insert(BlockKind::Button);

    editor.document_mut().move_block(0, 2);
    let kinds: Vec<_> = editor
        .document()
        .blocks
        .iter()
        .map(|b| b.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(BlockKind::Text),
            Some(BlockKind::Button),
            Some(BlockKind::Header)
        ]
    );
}

#[tokio::test]
async fn saved_template_is_a_snapshot() -> anyhow::Result<()> {
    let store = Arc::new(RecordingStore::default());
    let mut editor = Editor::new(store.clone());
    editor.document_mut().subject = "Spring challenge".to_string();
    let header = editor.insert(BlockKind::Header).id.clone();

    let saved = editor
        .save_as_template("Promo A", Category::Marketing)
        .await?;

    editor.document_mut().subject = "Changed afterwards".to_string();
    editor
        .document_mut()
        .update(&header, ContentPatch::text("Edited"), Styles::new());
    editor.insert(BlockKind::Divider);

    let sent = store.inserted.lock().unwrap()[0].clone();
    assert_eq!(sent.subject, "Spring challenge");
    assert_eq!(sent.name, "Promo A");
    assert_eq!(sent.category, Category::Marketing);
    assert_eq!(sent.json_content.blocks.len(), 1);
    assert!(!sent.html_content.contains("Edited"));
    assert_eq!(saved, sent);
    assert!(editor.loaded().is_none());
    Ok(())
}

#[tokio::test]
async fn draft_without_optional_fields() -> anyhow::Result<()> {
    let draft: Draft = serde_json::from_str(
        r#"{ "subject": "X", "headerText": "Welcome", "ctaText": "Go", "ctaUrl": "https://x" }"#,
    )?;
    let mut editor = Editor::new(RecordingStore::default());
    editor.insert(BlockKind::Spacer);

    let options = DraftOptions {
        include_discount: false,
        ..Default::default()
    };
    editor.apply_draft(&StubDrafts(draft), &options).await?;

    assert_eq!(editor.document().subject, "X");
    assert_eq!(
        contents(&editor.document().blocks),
        vec![
            Content::Header(TextContent {
                text: "Welcome".to_string()
            }),
            Content::Button(ButtonContent {
                text: "Go".to_string(),
                url: "https://x".to_string()
            }),
            Content::Divider,
            Content::Social,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn failed_draft_leaves_document_untouched() {
    let mut editor = Editor::new(RecordingStore::default());
    editor.document_mut().subject = "Keep me".to_string();
    editor.insert(BlockKind::Header);
    let before = editor.document().clone();

    let err = editor
        .apply_draft(&FailingDrafts, &DraftOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DraftFailed(_)));
    assert_eq!(editor.document(), &before);
}

#[tokio::test]
async fn draft_with_blank_subject_keeps_subject() -> anyhow::Result<()> {
    let mut editor = Editor::new(RecordingStore::default());
    editor.document_mut().subject = "Existing".to_string();
    let draft = Draft {
        header_text: Some("Hi".to_string()),
        ..Default::default()
    };
    editor
        .apply_draft(&StubDrafts(draft), &DraftOptions::default())
        .await?;
    assert_eq!(editor.document().subject, "Existing");
    assert_eq!(editor.document().blocks.len(), 3);
    Ok(())
}

#[tokio::test]
async fn failed_store_leaves_document_untouched() {
    let mut editor = Editor::new(RecordingStore::failing());
    editor.insert(BlockKind::Text);
    let before = editor.document().clone();

    assert!(editor.load_template(Uuid::new_v4()).await.is_err());
    assert!(editor
        .save_as_template("Nope", Category::Notification)
        .await
        .is_err());
    assert_eq!(editor.document(), &before);
    assert!(editor.loaded().is_none());
}

#[tokio::test]
async fn unknown_blocks_survive_a_round_trip() -> anyhow::Result<()> {
    let db = Database::temporary()?;
    let stored: Template = serde_json::from_value(serde_json::json!({
        "id": Uuid::new_v4(),
        "name": "From the future",
        "subject": "Hello",
        "html_content": "",
        "json_content": { "blocks": [
            { "id": "a", "kind": "header", "content": { "text": "Hi" } },
            { "id": "b", "kind": "countdown", "content": { "until": "2026-12-31" } }
        ] },
        "category": "newsletter",
        "is_template": true,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    }))?;
    let id = stored.id;
    (&db as &dyn TemplateStore).insert(stored.clone()).await?;

    let mut editor = Editor::new(db);
    editor.load_template(id).await?;
    assert_eq!(editor.document().unknown_blocks(), 1);

    let html = email::render(editor.document())?;
    assert!(!html.contains("countdown"));
    assert!(!html.contains("2026-12-31"));

    let saved = editor.save().await?;
    assert_eq!(saved.version, 1);
    assert_eq!(saved.json_content.blocks, stored.json_content.blocks);
    Ok(())
}

#[tokio::test]
async fn concurrent_editors_conflict() -> anyhow::Result<()> {
    let db = Arc::new(Database::temporary()?);
    let mut first = Editor::new(db.clone());
    first.insert(BlockKind::Header);
    let template = first
        .save_as_template("Shared", Category::Newsletter)
        .await?;

    let mut second = Editor::new(db.clone());
    second.load_template(template.id).await?;

    first.load_template(template.id).await?;
    first.document_mut().subject = "First".to_string();
    first.save().await?;

    second.document_mut().subject = "Second".to_string();
    let before = second.document().clone();
    let err = second.save().await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TemplateConflict { .. }));
    assert_eq!(err.template, Some(template.id));
    assert_eq!(second.document(), &before);

    let stored = (&*db as &dyn TemplateStore).get(template.id).await?;
    assert_eq!(stored.subject, "First");
    Ok(())
}

#[tokio::test]
async fn discount_from_source() -> anyhow::Result<()> {
    let source = StaticDiscounts::new(vec![DiscountCode {
        id: "STRONG15".to_string(),
        percent_off: Some(rust_decimal::Decimal::new(15, 0)),
        ..Default::default()
    }]);
    let codes = source.list_active_codes().await?;

    let mut editor = Editor::new(RecordingStore::default());
    editor.insert_discount(&codes[0]);

    let html = email::render(editor.document())?;
    assert!(html.contains("STRONG15"));
    assert!(html.contains("15% off"));
    Ok(())
}
