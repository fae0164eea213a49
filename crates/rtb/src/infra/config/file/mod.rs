use {
    crate::infra::client::ConnectionKind,
    serde::Deserialize,
    std::time::Duration,
    url::Url,
};

mod load;

pub use load::load;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// Time budget of one auction round. Bids arriving later are discarded.
    #[serde(with = "humantime_serde", default = "default_round_timeout")]
    round_timeout: Duration,

    /// Settings of the HTTP front door.
    #[serde(default)]
    server: ServerConfig,

    /// Demand side partners asked for bids in every round.
    #[serde(default, rename = "partner")]
    partners: Vec<PartnerConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ServerConfig {
    /// Value of the `Server` response header.
    #[serde(default = "default_server_name")]
    name: String,

    /// Upper bound for handling a single request.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    request_timeout: Duration,

    /// Maximum number of requests served at the same time.
    #[serde(default = "default_concurrency")]
    concurrency: usize,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_size")]
    max_body_size: usize,

    /// Whether to serve random bids on `/bid`, useful to run the service
    /// against itself.
    #[serde(default = "default_synthetic_bids")]
    synthetic_bids: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            request_timeout: default_request_timeout(),
            concurrency: default_concurrency(),
            max_body_size: default_max_body_size(),
            synthetic_bids: default_synthetic_bids(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartnerConfig {
    /// Unique name, reported as `dsp` when the partner wins.
    name: String,

    /// URL bids are requested from.
    endpoint: Url,

    /// How to reach the partner.
    #[serde(default = "default_connection")]
    connection: ConnectionKind,

    /// Timeout of a single bid request. Defaults to the round timeout and is
    /// capped by it.
    #[serde(default, with = "humantime_serde")]
    timeout: Option<Duration>,
}

fn default_round_timeout() -> Duration {
    Duration::from_millis(100)
}

fn default_server_name() -> String {
    "simple rtb".to_owned()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_concurrency() -> usize {
    256 * 1024
}

fn default_max_body_size() -> usize {
    4096
}

fn default_synthetic_bids() -> bool {
    true
}

fn default_connection() -> ConnectionKind {
    ConnectionKind::Http
}
