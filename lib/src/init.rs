//! Data initialization procedures.
//!
//! The configured templates directory can contain email documents expected
//! to exist as templates after the application is started. This module
//! turns those files into stored templates.

use std::path::Path;

use crate::email::block::Block;
use crate::email::document::Document;
use crate::email::template::{Category, Template, TemplateStore};
use crate::{Config, Error, ErrorKind, Result};

/// Email document as found in the templates directory.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateFile {
    pub name: String,
    pub subject: String,
    pub category: Category,
    pub blocks: Vec<Block>,
}

impl TemplateFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut file: TemplateFile = serde_json::from_str(&contents)?;
        if file.name.trim().is_empty() {
            // Fall back to the file name.
            file.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .ok_or_else(|| {
                    ErrorKind::BadInput(format!("template file without a name: {:?}", path))
                })?;
        }
        Ok(file)
    }

    pub fn to_template(&self) -> Result<Template> {
        Document::from_parts(self.subject.clone(), self.blocks.iter().cloned())
            .to_template(&self.name, self.category)
    }
}

/// Initializes store state based on entries found at configured locations.
pub async fn initialize<S: TemplateStore + ?Sized>(config: &Config, store: &S) -> Result<()> {
    if !config.init.enabled {
        return Ok(());
    }
    let count = templates(&config.init.templates, store).await?;
    tracing::info!(count, dir = %config.init.templates, "initialized email templates");
    Ok(())
}

/// Loads every `*.json` file in the directory as a template, replacing
/// stored templates with the same name.
///
/// Templates are re-created with each call, which means they end up with
/// different ids on each initialization. Refer to them by name instead.
pub async fn templates<S: TemplateStore + ?Sized>(
    dir: impl AsRef<Path>,
    store: &S,
) -> Result<usize> {
    let entries = match std::fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        // A missing directory simply means there's nothing to load.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let existing = store.list(None).await?;
    let mut count = 0;
    for path in paths {
        let file = TemplateFile::from_path(&path).map_err(|e| {
            Error::new(ErrorKind::BadInput(format!(
                "failed loading template file {:?}: {}",
                path, e.kind
            )))
        })?;
        for stale in existing.iter().filter(|t| t.name == file.name) {
            store.remove(stale.id).await?;
        }
        let template = store.insert(file.to_template()?).await?;
        tracing::debug!(id = %template.id, name = %template.name, "loaded template file");
        count += 1;
    }

    Ok(count)
}
