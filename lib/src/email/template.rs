//! Named, persisted email templates and the store they live in.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Collectable, Identifiable};
use crate::email::block::Block;
use crate::{Database, Error, ErrorKind, Result};

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    #[default]
    Marketing,
    Transactional,
    Newsletter,
    Notification,
}

/// Structured form of a stored email.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateContent {
    pub blocks: Vec<Block>,
}

/// Stored email template.
///
/// Keeps both the structured block list, used to load the email back into
/// the editor, and the markup rendered from it at save time.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub html_content: String,
    pub json_content: TemplateContent,
    pub category: Category,
    pub is_template: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every update, used to detect concurrent edits.
    #[serde(default)]
    pub version: u64,
}

impl Collectable for Template {
    fn get_collection_name() -> &'static str {
        "email_templates"
    }
}

impl Identifiable for Template {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

/// Persistence for email templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Lists templates, newest first, optionally restricted to a single
    /// category.
    async fn list(&self, category: Option<Category>) -> Result<Vec<Template>>;

    async fn get(&self, id: Uuid) -> Result<Template>;

    /// Stores a new template, returning it as stored.
    async fn insert(&self, template: Template) -> Result<Template>;

    /// Overwrites a stored template.
    ///
    /// The template's `version` must match the stored one, otherwise the
    /// call fails with `TemplateConflict`. On success the stored version is
    /// bumped and returned.
    async fn update(&self, template: Template) -> Result<Template>;

    /// Removes a template. Returns whether it existed.
    async fn remove(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
impl TemplateStore for Database {
    async fn list(&self, category: Option<Category>) -> Result<Vec<Template>> {
        let mut templates = self.get_collection::<Template>()?;
        if let Some(category) = category {
            templates.retain(|t| t.category == category);
        }
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    async fn get(&self, id: Uuid) -> Result<Template> {
        self.find::<Template>(id)?
            .ok_or_else(|| Error::new_with(ErrorKind::TemplateNotFound(id), Some(id)))
    }

    async fn insert(&self, template: Template) -> Result<Template> {
        if self.find::<Template>(template.id)?.is_some() {
            return Err(Error::new_with(
                ErrorKind::BadInput(format!("template with id {} already exists", template.id)),
                Some(template.id),
            ));
        }
        self.set(&template)?;
        tracing::debug!(id = %template.id, name = %template.name, "inserted email template");
        Ok(template)
    }

    async fn update(&self, template: Template) -> Result<Template> {
        let id = template.id;
        let expected = template.version;
        let updated = self.update_with::<Template, _>(id, move |current| {
            if current.version != expected {
                return Err(ErrorKind::TemplateConflict {
                    expected,
                    found: current.version,
                }
                .into());
            }
            Ok(Template {
                created_at: current.created_at,
                updated_at: Utc::now(),
                version: current.version + 1,
                ..template
            })
        });
        let updated = match updated {
            Err(e) if matches!(e.kind, ErrorKind::DbConflict(_)) => {
                return Err(lost_race(self, id, expected)?);
            }
            other => other.map_err(|e| e.with_template(id))?,
        };

        match updated {
            Some(template) => {
                tracing::debug!(%id, version = template.version, "updated email template");
                Ok(template)
            }
            None => Err(Error::new_with(ErrorKind::TemplateNotFound(id), Some(id))),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let removed = self.remove_by_id::<Template>(id)?;
        if removed {
            tracing::debug!(%id, "removed email template");
        }
        Ok(removed)
    }
}

/// Error for an update that lost the write to a concurrent one, reported
/// the same way as a stale version.
fn lost_race(db: &Database, id: Uuid, expected: u64) -> Result<Error> {
    let kind = match db.find::<Template>(id)? {
        Some(current) => ErrorKind::TemplateConflict {
            expected,
            found: current.version,
        },
        None => ErrorKind::TemplateNotFound(id),
    };
    Ok(Error::new_with(kind, Some(id)))
}

#[async_trait]
impl<S: TemplateStore + ?Sized> TemplateStore for Arc<S> {
    async fn list(&self, category: Option<Category>) -> Result<Vec<Template>> {
        (**self).list(category).await
    }

    async fn get(&self, id: Uuid) -> Result<Template> {
        (**self).get(id).await
    }

    async fn insert(&self, template: Template) -> Result<Template> {
        (**self).insert(template).await
    }

    async fn update(&self, template: Template) -> Result<Template> {
        (**self).update(template).await
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        (**self).remove(id).await
    }
}
