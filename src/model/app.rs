use crate::model::Id;
use serde::{Deserialize, Serialize};

/// A marketplace app. Only referenced by primary key from collections;
/// the rest of its lifecycle is owned elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: Id,
    pub name: String,
    pub slug: String,
}

impl App {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self { id, name, slug }
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
