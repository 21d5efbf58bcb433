//! Typed content blocks making up an email.

use std::collections::BTreeMap;
use std::str::FromStr;

use uuid::Uuid;

pub type BlockId = String;

/// Free-form style overrides, keyed by css property name.
///
/// Ordered so that rendering the same block always yields the same output.
pub type Styles = BTreeMap<String, String>;

/// All the block kinds known to this version of the editor.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BlockKind {
    Header,
    Text,
    Image,
    Button,
    Divider,
    Spacer,
    Social,
    Discount,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextContent {
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageContent {
    pub url: String,
    pub alt: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ButtonContent {
    pub text: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpacerContent {
    /// Css length, e.g. `20px`.
    pub height: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscountContent {
    /// Code the reader types in at checkout. Not checked against any
    /// discount source.
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

/// Kind-specific block payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Header(TextContent),
    Text(TextContent),
    Image(ImageContent),
    Button(ButtonContent),
    Divider,
    Spacer(SpacerContent),
    Social,
    Discount(DiscountContent),
    /// Block of a kind this version doesn't know about, e.g. written by a
    /// newer editor. Kept verbatim so that saving doesn't lose it; never
    /// rendered.
    Unknown {
        kind: String,
        payload: serde_json::Value,
    },
}

impl Content {
    /// Content a freshly added block of the given kind starts out with.
    pub fn default_for(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Header => Content::Header(TextContent {
                text: "Your Header Here".to_string(),
            }),
            BlockKind::Text => Content::Text(TextContent {
                text: "Add your text content here...".to_string(),
            }),
            BlockKind::Image => Content::Image(ImageContent {
                url: String::new(),
                alt: "Image".to_string(),
            }),
            BlockKind::Button => Content::Button(ButtonContent {
                text: "Click Here".to_string(),
                url: "#".to_string(),
            }),
            BlockKind::Divider => Content::Divider,
            BlockKind::Spacer => Content::Spacer(SpacerContent {
                height: "20px".to_string(),
            }),
            BlockKind::Social => Content::Social,
            BlockKind::Discount => Content::Discount(DiscountContent {
                code: "SAVE20".to_string(),
                description: "Get 20% off your next purchase".to_string(),
                expiry: None,
            }),
        }
    }

    /// Known kind of the content, `None` for unknown blocks.
    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Content::Header(_) => Some(BlockKind::Header),
            Content::Text(_) => Some(BlockKind::Text),
            Content::Image(_) => Some(BlockKind::Image),
            Content::Button(_) => Some(BlockKind::Button),
            Content::Divider => Some(BlockKind::Divider),
            Content::Spacer(_) => Some(BlockKind::Spacer),
            Content::Social => Some(BlockKind::Social),
            Content::Discount(_) => Some(BlockKind::Discount),
            Content::Unknown { .. } => None,
        }
    }

    /// Kind tag as it appears in the serialized form.
    pub fn kind_name(&self) -> &str {
        match self {
            Content::Unknown { kind, .. } => kind,
            known => known.kind().map(<&'static str>::from).unwrap_or_default(),
        }
    }

    /// Shallow-merges the patch into the content. Patch fields the kind
    /// doesn't carry are ignored.
    pub fn apply(&mut self, patch: ContentPatch) {
        fn set(field: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *field = value;
            }
        }

        match self {
            Content::Header(c) | Content::Text(c) => set(&mut c.text, patch.text),
            Content::Image(c) => {
                set(&mut c.url, patch.url);
                set(&mut c.alt, patch.alt);
            }
            Content::Button(c) => {
                set(&mut c.text, patch.text);
                set(&mut c.url, patch.url);
            }
            Content::Spacer(c) => set(&mut c.height, patch.height),
            Content::Discount(c) => {
                set(&mut c.code, patch.code);
                set(&mut c.description, patch.description);
                if let Some(expiry) = patch.expiry {
                    c.expiry = expiry;
                }
            }
            Content::Divider | Content::Social | Content::Unknown { .. } => (),
        }
    }

    fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Content::Header(c) | Content::Text(c) => serde_json::to_value(c),
            Content::Image(c) => serde_json::to_value(c),
            Content::Button(c) => serde_json::to_value(c),
            Content::Spacer(c) => serde_json::to_value(c),
            Content::Discount(c) => serde_json::to_value(c),
            Content::Divider | Content::Social => Ok(serde_json::Value::Object(Default::default())),
            Content::Unknown { payload, .. } => Ok(payload.clone()),
        }
    }

    fn from_payload(kind: &str, payload: serde_json::Value) -> serde_json::Result<Self> {
        // Missing or null payloads are treated as empty objects so that all
        // fields fall back to their defaults.
        let payload = match payload {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };
        let Ok(known) = BlockKind::from_str(kind) else {
            return Ok(Content::Unknown {
                kind: kind.to_string(),
                payload,
            });
        };
        Ok(match known {
            BlockKind::Header => Content::Header(serde_json::from_value(payload)?),
            BlockKind::Text => Content::Text(serde_json::from_value(payload)?),
            BlockKind::Image => Content::Image(serde_json::from_value(payload)?),
            BlockKind::Button => Content::Button(serde_json::from_value(payload)?),
            BlockKind::Divider => Content::Divider,
            BlockKind::Spacer => Content::Spacer(serde_json::from_value(payload)?),
            BlockKind::Social => Content::Social,
            BlockKind::Discount => Content::Discount(serde_json::from_value(payload)?),
        })
    }
}

/// Partial content update. Fields left as `None` are not touched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentPatch {
    pub text: Option<String>,
    pub url: Option<String>,
    pub alt: Option<String>,
    pub height: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the expiry. In JSON that is an explicit `null`,
    /// a missing field leaves the expiry alone.
    #[serde(
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<Option<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Option<String> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

impl ContentPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Single content unit of an email document.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    pub content: Content,
    pub styles: Styles,
}

impl Block {
    /// Creates a block with a fresh id.
    pub fn new(content: Content) -> Self {
        Self {
            id: new_id(),
            content,
            styles: Styles::new(),
        }
    }

    /// Creates a block of the given kind holding the kind's default content.
    pub fn with_kind(kind: BlockKind) -> Self {
        Self::new(Content::default_for(kind))
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.content.kind()
    }
}

/// Generates a block id. Random, so ids are never reused within a document,
/// including ids of blocks loaded from storage.
pub fn new_id() -> BlockId {
    Uuid::new_v4().to_string()
}

/// Serialized shape of a block, as stored in `Template::json_content`.
#[derive(Clone, Debug, Deserialize, Serialize)]
struct RawBlock {
    id: BlockId,
    kind: String,
    #[serde(default)]
    content: serde_json::Value,
    #[serde(default)]
    styles: Styles,
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let content = Content::from_payload(&raw.kind, raw.content)
            .map_err(|e| format!("invalid content for `{}` block {}: {}", raw.kind, raw.id, e))?;
        Ok(Block {
            id: raw.id,
            content,
            styles: raw.styles,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            kind: block.content.kind_name().to_string(),
            // Payload structs are plain strings and options, conversion
            // can't fail.
            content: block.content.payload().unwrap_or_default(),
            id: block.id,
            styles: block.styles,
        }
    }
}
