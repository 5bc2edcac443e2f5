use thiserror::Error;

/// A client-side precondition that was not met. Never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Offending field names, in the order they were checked.
    pub fields: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: vec![field.into()],
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        let message = format!("Missing required fields: {}", fields.join(", "));
        Self { message, fields }
    }
}

#[derive(Debug, Error)]
pub enum CdcError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend answered but rejected the request. `message` is the
    /// backend's own text whenever it sent one.
    #[error("{message}")]
    Request {
        status: Option<u16>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type CdcResult<T> = Result<T, CdcError>;

impl CdcError {
    pub fn validation(message: impl Into<String>) -> Self {
        CdcError::Validation(ValidationError::new(message))
    }

    pub fn request(status: Option<u16>, message: impl Into<String>) -> Self {
        CdcError::Request {
            status,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CdcError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CdcError::Request { status: Some(404), .. })
    }

    /// Text suitable for showing to an operator.
    pub fn user_message(&self) -> String {
        match self {
            CdcError::Validation(err) => err.message.clone(),
            CdcError::Request { message, .. } => message.clone(),
            CdcError::Transport(_) => "Unable to reach the CDC backend".to_string(),
        }
    }
}

impl From<reqwest::Error> for CdcError {
    fn from(err: reqwest::Error) -> Self {
        CdcError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CdcError {
    fn from(err: serde_json::Error) -> Self {
        CdcError::Transport(format!("invalid response payload: {}", err))
    }
}
