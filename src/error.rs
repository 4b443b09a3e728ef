pub type ThumbResult<T> = Result<T, ThumbError>;

/// Failure classes surfaced to the user for AI-service and export actions.
///
/// Every action-boundary failure collapses into exactly one of these; the
/// mapping rules live in [`crate::service::classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureClass {
    /// Invalid or missing API credential (entity-not-found, 403/404).
    Auth,
    /// Content or image refused by the backend's safety system.
    Safety,
    /// Network errors, timeouts, anything unclassified.
    Transient,
}

impl FailureClass {
    /// The single user-facing message for this class.
    pub fn user_message(self) -> &'static str {
        match self {
            FailureClass::Auth => "Invalid API key or model. Select a paid key and retry.",
            FailureClass::Safety => "The image or text was refused by the AI for safety reasons.",
            FailureClass::Transient => "AI connection failed. Please retry in a moment.",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("action already in progress: {0}")]
    Busy(&'static str),

    #[error("service failure ({class:?}): {message}")]
    Service {
        class: FailureClass,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThumbError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn service(class: FailureClass, message: impl Into<String>) -> Self {
        Self::Service {
            class,
            message: message.into(),
        }
    }

    /// Failure class for user display, if this error carries one.
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            Self::Service { class, .. } => Some(*class),
            _ => None,
        }
    }
}
