use serde::Serialize;

pub type CrudResult<T> = Result<T, CrudError>;

/// Everything that can go wrong between a request and the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    /// An Entity method the adapter never overrode.
    #[error("Entity method '{0}' is not implemented")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),

    #[error("No results")]
    NotFound,

    /// The backend reported success but handed back an unusable record.
    #[error("An error occured, please try again. #{0}")]
    Consistency(u16),

    #[error("Not implemented. {0}")]
    UnimplementedRoute(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Template(#[from] tera::Error),

    #[error("Invalid controller configuration: {0}")]
    Config(String),

    /// An owned record was written without a current user.
    #[error("Sign in to save records")]
    OwnerRequired,
}

impl CrudError {
    pub fn code(&self) -> &'static str {
        match self {
            CrudError::NotImplemented(_) => "not_implemented",
            CrudError::Persistence(_) => "persistence",
            CrudError::NotFound => "not_found",
            CrudError::Consistency(_) => "consistency",
            CrudError::UnimplementedRoute(_) => "unimplemented_route",
            CrudError::InvalidBody(_) => "invalid_body",
            CrudError::Template(_) => "template",
            CrudError::Config(_) => "config",
            CrudError::OwnerRequired => "owner_required",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CrudError::NotFound)
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.code(), &self.to_string())
    }
}

/// JSON error envelope sent to clients that negotiate JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}
