use serde::{Deserialize, Serialize};

/// Identity of an authenticated caller, taken from request headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

impl UserContext {
    /// Caller known only by id
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            user_email: None,
            user_name: None,
        }
    }

    pub fn with_details(user_id: String, email: Option<String>, name: Option<String>) -> Self {
        Self {
            user_id,
            user_email: email,
            user_name: name,
        }
    }
}

/// The caller of a request. Anonymous callers hold no grants.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Anonymous,
    User(UserContext),
}

impl Principal {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::User(ctx) => Some(ctx.user_id.as_str()),
        }
    }

    /// Label used in log lines
    pub fn label(&self) -> &str {
        self.user_id().unwrap_or("anonymous")
    }
}
