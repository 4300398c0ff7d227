use serde::{Deserialize, Serialize};

pub type Id = i64;

/// Standard paging metadata attached to list responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub limit: usize,
    pub offset: usize,
    pub total_count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl PageMeta {
    /// Build paging metadata for `path`, linking to the neighbouring pages
    pub fn new(path: &str, limit: usize, offset: usize, total_count: usize) -> Self {
        // Offsets come straight from the query string.
        let next_offset = offset.saturating_add(limit);
        let next = if next_offset < total_count {
            Some(format!("{}?limit={}&offset={}", path, limit, next_offset))
        } else {
            None
        };

        let previous = if offset > 0 {
            Some(format!(
                "{}?limit={}&offset={}",
                path,
                limit,
                offset.saturating_sub(limit)
            ))
        } else {
            None
        };

        Self {
            limit,
            offset,
            total_count,
            next,
            previous,
        }
    }
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
