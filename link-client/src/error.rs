use link_common::{LinkError, ReorderError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid link: {0}")]
    Validation(#[from] LinkError),
    #[error(transparent)]
    Reorder(#[from] ReorderError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("no tokio runtime to run saves on: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}
