//! Per-partner client. Binds a transport to the partner's own timeout and
//! enforces that timeout against the deadline of the round.

use {
    super::transport::{self, Transport},
    crate::domain::time::Deadline,
    serde::Deserialize,
    std::time::Duration,
    thiserror::Error,
    url::Url,
};

/// How the partner is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Http,
    /// Reserved. Rejected when the client is built.
    Grpc,
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Grpc => "grpc",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub connection: ConnectionKind,
    /// Upper bound for a single call. The round deadline still applies when it
    /// is tighter.
    pub timeout: Duration,
}

pub struct Client {
    transport: Box<dyn Transport>,
    timeout: Duration,
}

impl Client {
    /// Builds the client for the configured connection kind. Unsupported
    /// kinds fail here and are never downgraded to another transport.
    pub fn try_new(config: &Config, http: reqwest::Client) -> Result<Self, Error> {
        match config.connection {
            ConnectionKind::Http => Ok(Self::new(
                transport::Http::new(http, config.endpoint.clone()),
                config.timeout,
            )),
            kind @ ConnectionKind::Grpc => Err(Error::Unsupported(kind)),
        }
    }

    pub fn new(transport: impl Transport + 'static, timeout: Duration) -> Self {
        Self {
            transport: Box::new(transport),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Calls the partner. Returns as soon as either the transport finishes or
    /// the tighter of `deadline` and the partner timeout expires, in which case
    /// the pending transport call is dropped.
    pub async fn call(&self, deadline: Deadline) -> Result<Vec<u8>, Error> {
        let deadline = deadline.tighten(self.timeout);
        let budget = deadline
            .instant()
            .saturating_duration_since(tokio::time::Instant::now());
        tokio::time::timeout_at(deadline.instant(), self.transport.call(deadline))
            .await
            .map_err(|_| Error::Timeout(budget))?
            .map_err(Into::into)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} connections are not supported")]
    Unsupported(ConnectionKind),
    #[error("partner call timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Transport(#[from] transport::Error),
}
