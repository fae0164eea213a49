use {
    super::{
        Bid,
        BidResponse,
        Partner,
        time::Deadline,
        transaction,
    },
    crate::infra::observe,
    serde::Serialize,
    std::{cmp::Ordering, sync::Arc, time::Duration},
    thiserror::Error,
    tokio::time::Instant,
};

/// Sells one impression to the highest bidding partner.
#[derive(Debug)]
pub struct Auction {
    partners: Vec<Arc<Partner>>,
    round_timeout: Duration,
}

impl Auction {
    pub fn new(partners: Vec<Arc<Partner>>, round_timeout: Duration) -> Self {
        Self {
            partners,
            round_timeout,
        }
    }

    pub fn partners(&self) -> &[Arc<Partner>] {
        &self.partners
    }

    pub fn round_timeout(&self) -> Duration {
        self.round_timeout
    }

    /// Runs one round: every partner is asked for a bid concurrently and the
    /// highest valid bid that arrived before the round timeout wins.
    pub async fn run(&self) -> Result<Settled, Error> {
        let started = Instant::now();
        observe::round_started(self.partners.len());

        let bids: Vec<_> = self
            .partners
            .iter()
            .map(|partner| Arc::new(Bid::new(Arc::clone(partner))))
            .collect();
        let status = match transaction::execute(&bids, Deadline::after(self.round_timeout)).await
        {
            Ok(()) => Status::Completed,
            Err(_) => Status::TimedOut,
        };
        let round = Round {
            bids,
            status,
            elapsed: started.elapsed(),
        };

        let winner = rank(&round.bids)
            .first()
            .map(|(bid, response)| (Arc::clone(bid), Payload::new(bid, response)));
        observe::round_finished(&round, winner.as_ref().map(|(bid, _)| &**bid));
        match winner {
            Some((winner, payload)) => Ok(Settled {
                winner,
                payload,
                round,
            }),
            None => Err(Error::EmptyAuction(round)),
        }
    }
}

/// Valid bids ordered by price, highest first. Equal prices keep the order
/// in which the partners were configured.
pub fn rank(bids: &[Arc<Bid>]) -> Vec<(&Arc<Bid>, &BidResponse)> {
    let mut ranked: Vec<_> = bids
        .iter()
        .filter(|bid| bid.is_valid())
        .filter_map(|bid| Some((bid, bid.response()?)))
        .collect();
    // Prices are finite, so only `-0.0` and `0.0` need to compare equal.
    ranked.sort_by(|(_, a), (_, b)| b.cpm.partial_cmp(&a.cpm).unwrap_or(Ordering::Equal));
    ranked
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every bid finished before the round timeout.
    Completed,
    /// The round timeout expired first.
    TimedOut,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// All bids of one round, including the losing and failed ones.
#[derive(Debug)]
pub struct Round {
    bids: Vec<Arc<Bid>>,
    status: Status,
    elapsed: Duration,
}

impl Round {
    pub fn bids(&self) -> &[Arc<Bid>] {
        &self.bids
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// A round with a winner.
#[derive(Debug)]
pub struct Settled {
    winner: Arc<Bid>,
    payload: Payload,
    round: Round,
}

impl Settled {
    pub fn winner(&self) -> &Bid {
        &self.winner
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn round(&self) -> &Round {
        &self.round
    }
}

/// The response body announcing the winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub dsp: String,
    /// How long the winning partner took to bid.
    pub time_req: String,
    #[serde(rename = "Bid")]
    pub bid: BidResponse,
}

impl Payload {
    fn new(bid: &Bid, response: &BidResponse) -> Self {
        Self {
            dsp: bid.partner().name().to_string(),
            time_req: format!("{:?}", bid.elapsed().unwrap_or_default()),
            bid: response.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty auction: no valid bids")]
    EmptyAuction(Round),
}
