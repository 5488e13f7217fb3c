use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Error,
}

/// A one-line notice shown above a rendered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
    /// Machine-readable error code, only set on errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
            code: None,
        }
    }

    pub fn error(code: &str, text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
            code: Some(code.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some("not_found")
    }
}

impl From<&crate::error::CrudError> for Message {
    fn from(err: &crate::error::CrudError) -> Self {
        Message::error(err.code(), err.to_string())
    }
}
