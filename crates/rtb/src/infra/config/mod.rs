use {
    crate::{
        domain::partner,
        infra::{api, client},
    },
    std::time::Duration,
};

pub mod file;

pub use file::load;

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound for a whole auction round.
    pub round_timeout: Duration,
    pub api: api::Config,
    /// Partners in the order they were configured. The order breaks ties
    /// between equal bids.
    pub partners: Vec<Partner>,
}

#[derive(Debug, Clone)]
pub struct Partner {
    pub name: partner::Name,
    pub client: client::Config,
}
