pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod observe;
pub mod transport;

pub use {api::Api, client::Client, config::Config};
