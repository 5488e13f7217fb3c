use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The identity an upstream proxy attached to the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

impl UserContext {
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

    /// Look up a user property by its serialized name, used for ownership checks.
    pub fn property(&self, name: &str) -> Option<Value> {
        match name {
            "user_id" | "id" => Some(Value::String(self.user_id.clone())),
            "user_email" | "email" => self.user_email.clone().map(Value::String),
            "user_name" | "name" => self.user_name.clone().map(Value::String),
            _ => None,
        }
    }

    /// Name shown in rendered views.
    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .or(self.user_email.as_deref())
            .unwrap_or(&self.user_id)
    }
}
