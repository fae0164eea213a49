//! Partners with scripted behaviour for exercising the auction without a
//! network.

use {
    super::{Partner, time::Deadline},
    crate::infra::{
        client::Client,
        transport::{self, Transport},
    },
    std::{sync::Arc, time::Duration},
};

pub enum Reply {
    /// A well formed bid with the given price.
    Bid(f64),
    /// A raw response body.
    Body(&'static str),
    /// An error status.
    Status(u16),
    Panic,
}

/// Answers with `reply` after `delay`.
pub struct Scripted {
    delay: Duration,
    reply: Reply,
}

#[async_trait::async_trait]
impl Transport for Scripted {
    async fn call(&self, _: Deadline) -> Result<Vec<u8>, transport::Error> {
        tokio::time::sleep(self.delay).await;
        match self.reply {
            Reply::Bid(cpm) => Ok(serde_json::to_vec(&serde_json::json!({
                "cpm": cpm,
                "time_wait": self.delay.as_millis().to_string(),
            }))
            .unwrap()),
            Reply::Body(body) => Ok(body.as_bytes().to_vec()),
            Reply::Status(status) => Err(transport::Error::Status(status)),
            Reply::Panic => panic!("scripted partner panicked"),
        }
    }
}

/// Partner with a generous timeout that answers after `delay_ms`.
pub fn partner(name: &str, delay_ms: u64, reply: Reply) -> Arc<Partner> {
    partner_with_timeout(name, delay_ms, reply, Duration::from_secs(10))
}

pub fn partner_with_timeout(
    name: &str,
    delay_ms: u64,
    reply: Reply,
    timeout: Duration,
) -> Arc<Partner> {
    let transport = Scripted {
        delay: Duration::from_millis(delay_ms),
        reply,
    };
    Arc::new(Partner::new(name.into(), Client::new(transport, timeout)))
}
