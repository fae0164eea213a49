//! The wire level of a partner call. A transport performs exactly one request
//! to a fixed address and hands back the raw response body.

use {
    crate::domain::time::{Deadline, DeadlineExceeded},
    thiserror::Error,
};

mod http;

pub use self::http::Http;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Performs one call, giving up once the deadline is reached. Never
    /// retries.
    async fn call(&self, deadline: Deadline) -> Result<Vec<u8>, Error>;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("http error: {0:?}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response status {0}")]
    Status(u16),
    #[error("the response was too large, the limit was {limit_bytes} bytes")]
    ResponseTooLarge { limit_bytes: usize },
    #[error(transparent)]
    DeadlineExceeded(#[from] DeadlineExceeded),
}
