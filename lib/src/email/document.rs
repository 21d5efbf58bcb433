//! In-memory email being edited.

use chrono::Utc;
use uuid::Uuid;

use crate::email::block::{self, Block, BlockKind, Content, ContentPatch, Styles};
use crate::email::render;
use crate::email::template::{Category, Template, TemplateContent};
use crate::Result;

/// Ordered list of blocks plus a subject line.
///
/// Block order is the vertical order in which blocks get rendered. All block
/// operations address blocks by id, never by position, except for
/// `move_block` which mirrors a drag-and-drop gesture.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Document {
    pub subject: String,
    pub blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document with no subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates a document from a stored template.
    ///
    /// Stored blocks sharing an id keep the first one's id, later ones get
    /// fresh ids.
    pub fn from_template(template: &Template) -> Self {
        Self::from_parts(
            template.subject.clone(),
            template.json_content.blocks.iter().cloned(),
        )
    }

    /// Builds a document out of a subject and blocks coming from outside,
    /// e.g. a file. Ids are deduplicated as in `from_template`.
    pub fn from_parts(subject: String, blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut document = Self {
            subject,
            blocks: Vec::new(),
        };
        for block in blocks {
            document.push(block);
        }
        document
    }

    /// Appends a new block of the given kind, holding the kind's default
    /// content.
    pub fn append(&mut self, kind: BlockKind) -> &Block {
        self.push(Block::with_kind(kind))
    }

    /// Appends an existing block. A block whose id is already taken gets
    /// assigned a fresh one.
    pub fn push(&mut self, mut block: Block) -> &Block {
        if self.get(&block.id).is_some() {
            block.id = block::new_id();
        }
        self.blocks.push(block);
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// Merges the patch into the block's content and the given entries into
    /// its styles.
    ///
    /// Stale ids are tolerated: if no block matches, nothing happens and
    /// `false` is returned.
    pub fn update(&mut self, id: &str, patch: ContentPatch, styles: Styles) -> bool {
        match self.blocks.iter_mut().find(|b| b.id == id) {
            Some(block) => {
                block.content.apply(patch);
                block.styles.extend(styles);
                true
            }
            None => false,
        }
    }

    /// Removes the block with the given id, if present.
    pub fn remove(&mut self, id: &str) -> bool {
        let len = self.blocks.len();
        self.blocks.retain(|b| b.id != id);
        self.blocks.len() != len
    }

    /// Moves the block at `from` so that it ends up at `to`.
    ///
    /// An out of range `from` is ignored, `to` is clamped to the last index.
    pub fn move_block(&mut self, from: usize, to: usize) {
        if from >= self.blocks.len() {
            return;
        }
        let block = self.blocks.remove(from);
        let to = to.min(self.blocks.len());
        self.blocks.insert(to, block);
    }

    /// Inserts a copy of the block right after the original. The copy gets a
    /// fresh id.
    pub fn duplicate(&mut self, id: &str) -> Option<&Block> {
        let pos = self.position(id)?;
        let mut copy = self.blocks[pos].clone();
        copy.id = block::new_id();
        self.blocks.insert(pos + 1, copy);
        self.blocks.get(pos + 1)
    }

    /// Replaces all blocks with the given sequence, keeping the subject.
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks.clear();
        for block in blocks {
            self.push(block);
        }
    }

    /// Number of blocks the renderer will skip because their kind is
    /// unknown.
    pub fn unknown_blocks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b.content, Content::Unknown { .. }))
            .count()
    }

    /// Takes a snapshot of the document in the form of a new template.
    ///
    /// Markup is rendered right away so that both representations describe
    /// the same state.
    pub fn to_template(&self, name: impl Into<String>, category: Category) -> Result<Template> {
        let now = Utc::now();
        Ok(Template {
            id: Uuid::new_v4(),
            name: name.into(),
            subject: self.subject.clone(),
            html_content: render::render(self)?,
            json_content: TemplateContent {
                blocks: self.blocks.clone(),
            },
            category,
            is_template: true,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }
}
