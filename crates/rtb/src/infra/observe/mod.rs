//! This module implements the observability for the auction service. It
//! exposes functions which represent events that are meaningful to the system.
//! These functions are called when the corresponding events occur. They log the
//! event and update the metrics, if the event is worth measuring.

use {
    crate::domain::{
        Bid,
        BidResponse,
        auction::{self, Round},
        bid,
        partner,
    },
    std::{net::SocketAddr, time::Duration},
};

mod metrics;

/// Setup the observability.
pub fn init(config: &observe::Config) {
    observe::tracing::initialize_reentrant(config);
    metrics::init();
}

/// Observe that a round is about to start.
pub fn round_started(partners: usize) {
    tracing::trace!(partners, "starting auction round");
}

/// Observe the end of a round.
pub fn round_finished(round: &Round, winner: Option<&Bid>) {
    let metrics = metrics::get();
    metrics
        .round_duration_seconds
        .observe(round.elapsed().as_secs_f64());
    let status = round.status().as_str();
    match winner {
        Some(winner) => {
            tracing::debug!(
                winner = %winner.partner().name(),
                cpm = ?winner.response().map(|response| response.cpm),
                bids = round.bids().len(),
                %status,
                elapsed = ?round.elapsed(),
                "auction settled"
            );
            metrics
                .rounds
                .with_label_values(&["settled", status])
                .inc();
        }
        None => {
            tracing::debug!(
                bids = round.bids().len(),
                %status,
                elapsed = ?round.elapsed(),
                "auction without valid bids"
            );
            metrics
                .rounds
                .with_label_values(&["empty", status])
                .inc();
        }
    }
}

/// Observe a valid bid.
pub fn bid_ok(partner: &partner::Name, response: &BidResponse, elapsed: Duration) {
    tracing::trace!(%partner, ?response, ?elapsed, "received bid");
    bid_result(partner, "ok", elapsed);
}

/// Observe that a partner failed to bid.
pub fn bid_failed(partner: &partner::Name, err: &bid::Error, elapsed: Duration) {
    tracing::warn!(%partner, ?err, ?elapsed, "partner failed to bid");
    let result = match err {
        bid::Error::Client(crate::infra::client::Error::Timeout(_)) => "timeout",
        bid::Error::Client(_) => "client_error",
        bid::Error::Decode(_) => "decode_error",
        bid::Error::InvalidPrice(_) => "invalid_price",
    };
    bid_result(partner, result, elapsed);
}

fn bid_result(partner: &partner::Name, result: &str, elapsed: Duration) {
    let metrics = metrics::get();
    metrics
        .bids
        .with_label_values(&[partner.as_str(), result])
        .inc();
    metrics
        .bid_duration_seconds
        .with_label_values(&[partner.as_str()])
        .observe(elapsed.as_secs_f64());
}

/// Observe that a bid was given up on before it finished.
pub fn bid_abandoned(partner: &partner::Name, reason: &str) {
    tracing::warn!(%partner, reason, "abandoned bid");
    metrics::get()
        .bids
        .with_label_values(&[partner.as_str(), "abandoned"])
        .inc();
}

/// Observe an attempt to record a second outcome for a bid.
pub fn bid_already_finished(partner: &partner::Name) {
    tracing::error!(%partner, "bid already finished, keeping first outcome");
}

/// Observe that a bid task terminated abnormally.
pub fn bid_task_failed(err: &tokio::task::JoinError) {
    tracing::error!(?err, "bid task failed");
}

/// Observe that a partner timeout was capped to the round timeout.
pub fn partner_timeout_clamped(partner: &str, timeout: Duration, round_timeout: Duration) {
    tracing::warn!(
        %partner,
        ?timeout,
        ?round_timeout,
        "partner timeout exceeds round timeout, using round timeout"
    );
}

/// Observe that a round ended without a winner and the request is answered
/// with no content.
pub fn empty_auction(err: &auction::Error) {
    tracing::info!(%err, "no winner");
}

/// Observe that the API is listening.
pub fn serving(addr: SocketAddr) {
    tracing::info!(%addr, "serving auction API");
}

/// Observe that the service is shutting down.
pub fn shutting_down() {
    tracing::info!("received shutdown signal");
}
