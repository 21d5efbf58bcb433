//! Block-based email composition.
//!
//! A [`Document`](document::Document) is an ordered list of typed
//! [`Block`](block::Block)s. Documents get rendered into html with
//! [`render`], snapshotted into [`Template`](template::Template)s and driven
//! by an [`Editor`](editor::Editor) that talks to the outside collaborators:
//! template storage, discount codes and draft generation.

pub mod block;
pub mod discount;
pub mod document;
pub mod draft;
pub mod editor;
pub mod render;
pub mod template;

pub use render::{render, render_text};
