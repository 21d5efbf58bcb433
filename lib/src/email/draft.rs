//! Email drafts produced by an external text-generation service.
//!
//! The service receives a [`DraftRequest`] and answers with a structured
//! [`Draft`]. Turning the draft into blocks is a pure mapping, see
//! [`Draft::into_blocks`].

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::email::block::{Block, BlockKind, Content, ContentPatch};
use crate::{config, ErrorKind, Result};

/// Path of the generation function, relative to the configured endpoint.
pub const DRAFT_PATH: &str = "functions/v1/generate-email";

const SYSTEM_PROMPT: &str = "You are an email copywriter for an online fitness coaching business. \
Write concise, encouraging emails for clients and prospects. \
Respond with a single JSON object with the fields subject, headerText, introText, bodyText, \
ctaText, ctaUrl and, when a discount is requested, discountCode, discountDescription and \
discountExpiry. Omit fields you have no content for. Use plain text only, no markdown or html.";

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmailType {
    #[default]
    Promotional,
    Newsletter,
    Welcome,
    Announcement,
    FollowUp,
    ReEngagement,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    Professional,
    #[default]
    Friendly,
    Motivational,
    Urgent,
    Casual,
}

/// What the user asked for when requesting a draft.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DraftOptions {
    pub email_type: EmailType,
    pub tone: Tone,
    pub include_discount: bool,
    /// Free-form instructions, e.g. "announce the new 8-week strength
    /// program".
    pub prompt: String,
}

impl DraftOptions {
    /// Builds the request sent to the generation service.
    pub fn request(&self) -> DraftRequest {
        let email_type = self.email_type.to_string().replace('_', " ");
        let mut user_prompt = format!(
            "Write a {} email in a {} tone.",
            email_type, self.tone
        );
        if self.include_discount {
            user_prompt.push_str(" Include a discount code offer.");
        }
        if !self.prompt.trim().is_empty() {
            user_prompt.push_str(" Details: ");
            user_prompt.push_str(self.prompt.trim());
        }

        DraftRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt,
            email_type: self.email_type,
            tone: self.tone,
            include_discount: self.include_discount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub email_type: EmailType,
    pub tone: Tone,
    pub include_discount: bool,
}

/// Structured draft returned by the generation service.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Draft {
    pub subject: String,
    pub header_text: Option<String>,
    pub intro_text: Option<String>,
    pub body_text: Option<String>,
    pub cta_text: Option<String>,
    pub cta_url: Option<String>,
    pub discount_code: Option<String>,
    pub discount_description: Option<String>,
    pub discount_expiry: Option<String>,
}

impl Draft {
    /// Maps the draft onto a block sequence.
    ///
    /// Order is fixed: header, intro, discount, call to action, body,
    /// divider, social links. Fields missing from the draft (or empty) are
    /// skipped; fields of a block that the draft doesn't provide keep the
    /// kind's defaults. The discount block is only produced when
    /// `include_discount` is set and the draft carries a code.
    pub fn into_blocks(self, include_discount: bool) -> Vec<Block> {
        let mut blocks = Vec::new();

        if let Some(text) = present(self.header_text) {
            blocks.push(block(BlockKind::Header, ContentPatch::text(text)));
        }
        if let Some(text) = present(self.intro_text) {
            blocks.push(block(BlockKind::Text, ContentPatch::text(text)));
        }
        if include_discount {
            if let Some(code) = present(self.discount_code) {
                blocks.push(block(
                    BlockKind::Discount,
                    ContentPatch {
                        code: Some(code),
                        description: present(self.discount_description),
                        expiry: present(self.discount_expiry).map(Some),
                        ..Default::default()
                    },
                ));
            }
        }
        if let Some(text) = present(self.cta_text) {
            blocks.push(block(
                BlockKind::Button,
                ContentPatch {
                    text: Some(text),
                    url: present(self.cta_url),
                    ..Default::default()
                },
            ));
        }
        if let Some(text) = present(self.body_text) {
            blocks.push(block(BlockKind::Text, ContentPatch::text(text)));
        }
        blocks.push(Block::with_kind(BlockKind::Divider));
        blocks.push(Block::with_kind(BlockKind::Social));

        blocks
    }
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

fn block(kind: BlockKind, patch: ContentPatch) -> Block {
    let mut content = Content::default_for(kind);
    content.apply(patch);
    Block::new(content)
}

/// Anything able to produce drafts.
#[async_trait]
pub trait DraftSource: Send + Sync {
    async fn draft(&self, options: &DraftOptions) -> Result<Draft>;
}

/// Client for the http generation service.
#[derive(Clone, Debug)]
pub struct DraftClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl DraftClient {
    pub fn new(config: &config::Drafting) -> Result<Self> {
        let mut base = Url::parse(&config.endpoint)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(DRAFT_PATH)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl DraftSource for DraftClient {
    /// Requests a draft. Any non-success status fails the whole request,
    /// partial drafts are never returned.
    async fn draft(&self, options: &DraftOptions) -> Result<Draft> {
        let mut request = self.http.post(self.endpoint.clone()).json(&options.request());
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "draft generation failed");
            return Err(ErrorKind::DraftFailed(format!("{}: {}", status, body)).into());
        }

        let draft: Draft = response.json().await?;
        tracing::debug!(subject = %draft.subject, "received email draft");
        Ok(draft)
    }
}
