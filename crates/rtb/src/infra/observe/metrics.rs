/// Metrics for the auction service.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
pub struct Metrics {
    /// The results of partner bids.
    #[metric(labels("partner", "result"))]
    pub bids: prometheus::IntCounterVec,
    /// Time partners took to answer, including failed answers.
    #[metric(
        labels("partner"),
        buckets(0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.5, 1.0)
    )]
    pub bid_duration_seconds: prometheus::HistogramVec,
    /// The results of auction rounds and whether they ran into the timeout.
    #[metric(labels("result", "status"))]
    pub rounds: prometheus::IntCounterVec,
    /// Wall clock duration of auction rounds.
    #[metric(buckets(0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.5, 1.0))]
    pub round_duration_seconds: prometheus::Histogram,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry_reentrant(Some("rtb".to_owned()), None);
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
