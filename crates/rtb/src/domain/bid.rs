use {
    super::{Partner, time::Deadline},
    crate::infra::{client, observe},
    serde::{Deserialize, Serialize},
    std::{
        sync::{Arc, OnceLock},
        time::Duration,
    },
    thiserror::Error,
    tokio::time::Instant,
};

/// The bid a partner answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidResponse {
    /// Latency indicator reported by the partner. Informational only, so a
    /// missing value is empty.
    #[serde(default)]
    pub time_wait: String,
    /// Offered price per thousand impressions.
    pub cpm: f64,
}

/// One partner's participation in one auction round.
///
/// The outcome is written exactly once, either by [`Bid::run`] or by the
/// executor giving up on the bid. Readers see either no outcome at all or the
/// complete one.
#[derive(Debug)]
pub struct Bid {
    partner: Arc<Partner>,
    outcome: OnceLock<Outcome>,
}

#[derive(Debug)]
struct Outcome {
    response: Option<BidResponse>,
    errors: Vec<String>,
    elapsed: Duration,
}

impl Bid {
    pub fn new(partner: Arc<Partner>) -> Self {
        Self {
            partner,
            outcome: OnceLock::new(),
        }
    }

    /// Requests, decodes and validates the partner's bid. There is no timeout
    /// besides `deadline`, which the partner client enforces.
    pub async fn run(&self, deadline: Deadline) {
        if self.is_finished() {
            observe::bid_already_finished(self.partner.name());
            return;
        }

        let started = Instant::now();
        let result = self.fetch(deadline).await;
        let elapsed = started.elapsed();
        let outcome = match result {
            Ok(response) => {
                observe::bid_ok(self.partner.name(), &response, elapsed);
                Outcome {
                    response: Some(response),
                    errors: Vec::new(),
                    elapsed,
                }
            }
            Err(err) => {
                observe::bid_failed(self.partner.name(), &err, elapsed);
                Outcome {
                    response: None,
                    errors: vec![err.to_string()],
                    elapsed,
                }
            }
        };
        self.finish(outcome);
    }

    async fn fetch(&self, deadline: Deadline) -> Result<BidResponse, Error> {
        let body = self.partner.client().call(deadline).await?;
        let response: BidResponse = serde_json::from_slice(&body)?;
        if !response.cpm.is_finite() || response.cpm < 0.0 {
            return Err(Error::InvalidPrice(response.cpm));
        }
        Ok(response)
    }

    /// Fails a bid that did not finish on its own.
    pub(crate) fn abandon(&self, reason: &str, elapsed: Duration) {
        observe::bid_abandoned(self.partner.name(), reason);
        self.finish(Outcome {
            response: None,
            errors: vec![reason.to_owned()],
            elapsed,
        });
    }

    fn finish(&self, outcome: Outcome) {
        if self.outcome.set(outcome).is_err() {
            observe::bid_already_finished(self.partner.name());
        }
    }

    pub fn partner(&self) -> &Partner {
        &self.partner
    }

    /// The decoded bid, if the call succeeded.
    pub fn response(&self) -> Option<&BidResponse> {
        self.outcome.get()?.response.as_ref()
    }

    /// Errors in the order they occurred. Empty while the bid is running.
    pub fn errors(&self) -> &[String] {
        self.outcome
            .get()
            .map(|outcome| outcome.errors.as_slice())
            .unwrap_or_default()
    }

    /// How long it took to build the bid.
    pub fn elapsed(&self) -> Option<Duration> {
        self.outcome.get().map(|outcome| outcome.elapsed)
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Whether the bid can take part in the ranking.
    pub fn is_valid(&self) -> bool {
        self.outcome
            .get()
            .is_some_and(|outcome| outcome.errors.is_empty() && outcome.response.is_some())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] client::Error),
    #[error("failed to decode bid: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid bid price {0}")]
    InvalidPrice(f64),
}
