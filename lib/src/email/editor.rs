//! Editing session tying a document to the outside collaborators.

use uuid::Uuid;

use crate::email::block::{Block, BlockKind, Content};
use crate::email::discount::DiscountCode;
use crate::email::document::Document;
use crate::email::draft::{DraftOptions, DraftSource};
use crate::email::render;
use crate::email::template::{Category, Template, TemplateContent, TemplateStore};
use crate::{ErrorKind, Result};

/// Owns the document being edited along with a handle to the template
/// store.
///
/// Every operation that reaches out to a collaborator leaves the document
/// as it was when the collaborator fails.
pub struct Editor<S> {
    document: Document,
    store: S,
    /// Stored template the document is bound to, as last seen in the store.
    loaded: Option<Template>,
}

impl<S: TemplateStore> Editor<S> {
    /// Starts a session with an empty document.
    pub fn new(store: S) -> Self {
        Self::with_document(store, Document::new())
    }

    pub fn with_document(store: S, document: Document) -> Self {
        Self {
            document,
            store,
            loaded: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Template the document was loaded from.
    pub fn loaded(&self) -> Option<&Template> {
        self.loaded.as_ref()
    }

    /// Discards the current document and starts over with an empty one.
    pub fn reset(&mut self) {
        self.document = Document::new();
        self.loaded = None;
    }

    /// Replaces the document's subject and blocks with the stored
    /// template's.
    pub async fn load_template(&mut self, id: Uuid) -> Result<()> {
        let template = self.store.get(id).await?;
        self.document = Document::from_template(&template);

        let unknown = self.document.unknown_blocks();
        if unknown > 0 {
            tracing::warn!(%id, unknown, "template contains blocks of unknown kinds");
        }
        tracing::info!(%id, name = %template.name, "loaded email template");

        self.loaded = Some(template);
        Ok(())
    }

    /// Stores a snapshot of the document as a new template.
    ///
    /// The snapshot, markup included, is taken before anything is sent to
    /// the store, so later edits never leak into it. The session stays
    /// bound to whatever it was loaded from; call `load_template` with the
    /// returned id to keep editing the new template.
    pub async fn save_as_template(
        &mut self,
        name: impl Into<String>,
        category: Category,
    ) -> Result<Template> {
        let template = self.document.to_template(name, category)?;
        let stored = self.store.insert(template).await?;
        tracing::info!(id = %stored.id, name = %stored.name, "saved email as template");

        Ok(stored)
    }

    /// Writes the document back over the template it was loaded from.
    ///
    /// Fails with `TemplateConflict` if the stored template changed since
    /// it was loaded.
    pub async fn save(&mut self) -> Result<Template> {
        let Some(loaded) = &self.loaded else {
            return Err(ErrorKind::NoLoadedTemplate.into());
        };
        let id = loaded.id;
        let template = Template {
            subject: self.document.subject.clone(),
            html_content: render::render(&self.document)?,
            json_content: TemplateContent {
                blocks: self.document.blocks.clone(),
            },
            ..loaded.clone()
        };

        let stored = self
            .store
            .update(template)
            .await
            .map_err(|e| e.with_template(id))?;
        tracing::info!(id = %stored.id, version = stored.version, "saved email template");

        self.loaded = Some(stored.clone());
        Ok(stored)
    }

    /// Appends a discount block advertising the given code.
    pub fn insert_discount(&mut self, code: &DiscountCode) -> &Block {
        self.document
            .push(Block::new(Content::Discount(code.to_content())))
    }

    /// Appends a block of the given kind with default content.
    pub fn insert(&mut self, kind: BlockKind) -> &Block {
        self.document.append(kind)
    }

    /// Requests a draft and replaces the document's blocks with it.
    ///
    /// The subject is only replaced when the draft comes with a non-empty
    /// one.
    pub async fn apply_draft<D>(&mut self, source: &D, options: &DraftOptions) -> Result<()>
    where
        D: DraftSource + ?Sized,
    {
        let draft = source.draft(options).await?;
        if !draft.subject.trim().is_empty() {
            self.document.subject = draft.subject.clone();
        }
        let blocks = draft.into_blocks(options.include_discount);
        tracing::debug!(blocks = blocks.len(), "applying email draft");
        self.document.replace_blocks(blocks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::block::ContentPatch;
    use crate::email::block::Styles;
    use crate::Database;

    fn editor() -> Editor<Database> {
        Editor::new(Database::temporary().unwrap())
    }

    #[tokio::test]
    async fn save_requires_loaded_template() {
        let mut editor = editor();
        editor.insert(BlockKind::Header);
        let err = editor.save().await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NoLoadedTemplate));
    }

    #[tokio::test]
    async fn save_as_then_save() {
        let mut editor = editor();
        editor.document_mut().subject = "Week 1".to_string();
        let id = editor.insert(BlockKind::Header).id.clone();

        let stored = editor
            .save_as_template("Weekly", Category::Newsletter)
            .await
            .unwrap();
        assert!(editor.loaded().is_none());

        editor.load_template(stored.id).await.unwrap();
        assert_eq!(editor.loaded().map(|t| t.id), Some(stored.id));
        editor
            .document_mut()
            .update(&id, ContentPatch::text("Week 2 recap"), Styles::new());
        let saved = editor.save().await.unwrap();

        assert_eq!(saved.id, stored.id);
        assert_eq!(saved.version, 1);
        assert_eq!(saved.name, "Weekly");
        assert!(saved.html_content.contains("Week 2 recap"));
    }

    #[tokio::test]
    async fn load_missing_template_keeps_document() {
        let mut editor = editor();
        editor.insert(BlockKind::Text);
        let before = editor.document().clone();

        let err = editor.load_template(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TemplateNotFound(_)));
        assert_eq!(editor.document(), &before);
        assert!(editor.loaded().is_none());
    }

    #[test]
    fn insert_discount_copies_code() {
        let mut editor = editor();
        let code = DiscountCode {
            id: "COACH10".to_string(),
            name: "Coach special".to_string(),
            ..Default::default()
        };
        let block = editor.insert_discount(&code).clone();
        match block.content {
            Content::Discount(d) => {
                assert_eq!(d.code, "COACH10");
                assert_eq!(d.description, "Coach special: Special offer");
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[tokio::test]
    async fn save_as_keeps_loaded_template() {
        let mut editor = editor();
        editor.document_mut().subject = "Original".to_string();
        let original = editor
            .save_as_template("Original", Category::Marketing)
            .await
            .unwrap();
        editor.load_template(original.id).await.unwrap();

        editor.document_mut().subject = "Copy".to_string();
        let copy = editor
            .save_as_template("Copy", Category::Marketing)
            .await
            .unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(editor.loaded().map(|t| t.id), Some(original.id));

        let saved = editor.save().await.unwrap();
        assert_eq!(saved.id, original.id);
        assert_eq!(saved.subject, "Copy");

        let store: &dyn TemplateStore = editor.store();
        let copy = store.get(copy.id).await.unwrap();
        assert_eq!(copy.version, 0);
        assert_eq!(copy.name, "Copy");
    }

    #[tokio::test]
    async fn reset_unbinds() {
        let mut editor = editor();
        let stored = editor
            .save_as_template("Scratch", Category::Marketing)
            .await
            .unwrap();
        editor.load_template(stored.id).await.unwrap();
        assert!(editor.loaded().is_some());
        editor.insert(BlockKind::Divider);
        editor.reset();
        assert!(editor.loaded().is_none());
        assert!(editor.document().blocks.is_empty());
    }
}
