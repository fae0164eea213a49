pub mod auction;
pub mod bid;
pub mod partner;
pub mod time;
pub mod transaction;

pub use {
    auction::Auction,
    bid::{Bid, BidResponse},
    partner::Partner,
    time::Deadline,
};

#[cfg(test)]
pub(crate) mod testing;
