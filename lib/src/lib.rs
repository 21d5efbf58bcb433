//! Email composition toolkit for the coaching storefront admin.
//!
//! Emails are built out of an ordered list of typed blocks, rendered into
//! a standalone html document and persisted as named templates. Drafts can
//! be requested from an external text-generation service and discount codes
//! pulled from the payment provider.
//!
//! ```ignore
//! let mut doc = pulse::Document::new();
//! doc.subject = "Spring challenge".to_string();
//! doc.append(pulse::BlockKind::Header);
//! let html = pulse::email::render(&doc)?;
//! ```

#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod init;
pub mod mock;
pub mod tracing;

pub use config::Config;
pub use db::Database;
pub use email::block::{Block, BlockId, BlockKind, Content};
pub use email::document::Document;
pub use email::editor::Editor;
pub use email::template::{Category, Template, TemplateStore};
pub use error::{Error, ErrorKind, Result};
