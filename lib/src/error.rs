use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};

use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
    /// Template the failed operation was working on, if any.
    pub template: Option<Uuid>,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            template: None,
        }
    }

    pub fn new_with(kind: ErrorKind, template: Option<Uuid>) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            template,
        }
    }

    /// Attaches template context to the error.
    pub fn with_template(mut self, template: Uuid) -> Self {
        self.template = Some(template);
        self
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(template) = self.template {
            write!(f, ", template: {}", template)?;
        }
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("unexpected error")]
    StdIoError(#[from] std::io::Error),

    #[error("unexpected error")]
    Unexpected,

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("failed parsing value from string: {0}")]
    ParsingError(String),

    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("other error: {0}")]
    Other(String),

    #[error("bad input: {0}")]
    BadInput(String),

    /// Entry changed between being read and written back.
    #[error("db conflict: {0}")]
    DbConflict(String),
    #[error("sled db error: {0}")]
    SledError(#[from] sled::Error),

    #[error("template not found: {0}")]
    TemplateNotFound(Uuid),
    /// Stored template changed since it was loaded into the editor.
    #[error("template was modified concurrently: expected version {expected}, found {found}")]
    TemplateConflict { expected: u64, found: u64 },
    #[error("editor has no loaded template to save over")]
    NoLoadedTemplate,

    #[error("draft request failed: {0}")]
    DraftFailed(String),

    #[error("render error: {0}")]
    RenderError(#[from] askama::Error),

    #[cfg(feature = "stripe")]
    #[error("stripe error: {0}")]
    StripeError(#[from] stripe::StripeError),

    #[error("json decode error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("pot decode error: {0}")]
    PotError(#[from] pot::Error),

    #[error("uuid error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("url parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::new(ErrorKind::ReqwestError(e))
    }
}

impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Self::new(ErrorKind::UuidError(e))
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Self::new(ErrorKind::SledError(e))
    }
}

impl From<askama::Error> for Error {
    fn from(e: askama::Error) -> Self {
        Self::new(ErrorKind::RenderError(e))
    }
}

#[cfg(feature = "stripe")]
impl From<stripe::StripeError> for Error {
    fn from(e: stripe::StripeError) -> Self {
        Self::new(ErrorKind::StripeError(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::JsonError(e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::new(ErrorKind::TomlError(e))
    }
}

impl From<pot::Error> for Error {
    fn from(e: pot::Error) -> Self {
        Self::new(ErrorKind::PotError(e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::new(ErrorKind::UrlParseError(e))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::new(ErrorKind::ConfigError(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::StdIoError(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}
