use crate::model::{now_rfc3339, Id};
use serde::{Deserialize, Serialize};

/// A named, described grouping of apps.
///
/// `apps` keeps the order in which apps were added and never holds the
/// same app twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub apps: Vec<Id>,
    pub created_at: String, // ISO 8601 timestamp
    pub modified_at: String,
}

impl Collection {
    pub fn new(id: Id, name: String, description: String) -> Self {
        let now = now_rfc3339();
        Self {
            id,
            name,
            description,
            apps: Vec::new(),
            created_at: now.clone(),
            modified_at: now,
        }
    }

    pub fn contains_app(&self, app_id: Id) -> bool {
        self.apps.contains(&app_id)
    }

    /// URLs of the member apps, in membership order
    pub fn app_urls(&self, prefix: &str) -> Vec<String> {
        self.apps.iter().map(|id| app_url(prefix, *id)).collect()
    }

    /// Apply a partial update of the scalar fields
    pub fn apply(&mut self, update: CollectionUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        self.modified_at = now_rfc3339();
    }
}

pub fn app_url(prefix: &str, app_id: Id) -> String {
    if prefix.ends_with('/') {
        format!("{}{}/", prefix, app_id)
    } else {
        format!("{}/{}/", prefix, app_id)
    }
}

/// Input model for creating a new collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Partial update of a collection's scalar fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}
