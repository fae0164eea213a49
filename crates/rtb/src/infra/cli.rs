use std::{net::SocketAddr, path::PathBuf};

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// The address to bind the auction API to.
    #[clap(long, env, default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// The log filter.
    #[clap(long, env, default_value = "warn,rtb=debug")]
    pub log: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    /// Path to the service configuration file. This file should be in TOML
    /// format. For an example see `crates/rtb/example.toml`.
    #[clap(long, env)]
    pub config: PathBuf,
}

impl Args {
    pub fn observe(&self) -> observe::Config {
        observe::Config::new(&self.log, self.stderr_threshold, self.use_json_logs)
    }
}
