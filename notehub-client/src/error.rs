//! Error types for the client.

use crate::api_client::ApiClientError;
use crate::config::ConfigError;
use notehub_core::{MutationError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error("Failed to initialise logging: {0}")]
    Telemetry(String),
}

/// Why submitting the create form did not produce a note.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("The create form is not open")]
    NoForm,
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}
