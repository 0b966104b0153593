//! CLI error types.

use wikilift_config::CredentialsError;
use wikilift_core::{ConvertError, DiscoverError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Credentials(#[from] CredentialsError),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Discover(#[from] DiscoverError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} file(s) failed")]
    Batch(usize),
}
