mod auction;
mod bid;
mod metrics;
mod ping;

pub(super) use {auction::auction, bid::bid, metrics::metrics, ping::ping};
