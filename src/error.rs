use thiserror::Error;

/// Typed error for "resource not found", recovered by downcast in the
/// API error handler.
#[derive(Debug, Error)]
#[error("{resource} not found: {id}")]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

/// Fatal errors of a provisioning run. Any of them aborts the run and
/// rolls back its transaction.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// An entity or operator input violates field constraints
    #[error("invalid {entity}: {message}")]
    Validation { entity: String, message: String },

    /// An expected unique physical relationship is absent or ambiguous
    #[error("topology error: {0}")]
    Topology(String),

    /// A referenced named entity does not exist
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl ProvisionError {
    pub fn invalid(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology(message.into())
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(NotFoundError::new(resource, &id.to_string()))
    }
}

impl From<anyhow::Error> for ProvisionError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ProvisionError>() {
            Ok(e) => return e,
            Err(err) => err,
        };
        match err.downcast::<NotFoundError>() {
            Ok(nf) => Self::NotFound(nf),
            Err(err) => Self::Store(err),
        }
    }
}

impl From<sqlx::Error> for ProvisionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.into())
    }
}
