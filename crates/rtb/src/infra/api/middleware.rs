use {
    axum::{
        extract::{MatchedPath, Request, State},
        http::{HeaderMap, HeaderValue, Method, StatusCode, header},
        middleware::Next,
        response::{IntoResponse, Response},
    },
    std::{sync::Arc, time::Instant},
    tokio::sync::Semaphore,
    url::Url,
};

/// Allows browsers on any origin to call the API with credentials. The origin
/// is taken from the `Origin` header, falling back to the `Referer`.
/// Pre-flight requests are answered right away.
pub(super) async fn cors(req: Request, next: Next) -> Response {
    let origin = origin(req.headers());
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        origin.unwrap_or(HeaderValue::from_static("*")),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    response
}

fn origin(headers: &HeaderMap) -> Option<HeaderValue> {
    if let Some(origin) = headers.get(header::ORIGIN).filter(|origin| !origin.is_empty()) {
        return Some(origin.clone());
    }
    let referer = Url::parse(headers.get(header::REFERER)?.to_str().ok()?).ok()?;
    let origin = referer.origin();
    if !origin.is_tuple() {
        return None;
    }
    HeaderValue::from_str(&origin.ascii_serialization()).ok()
}

/// Rejects requests while the configured number of requests is in flight.
pub(super) async fn limit_concurrency(
    State(permits): State<Arc<Semaphore>>,
    req: Request,
    next: Next,
) -> Response {
    let Ok(_permit) = permits.try_acquire() else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    next.run(req).await
}

pub(super) async fn with_matched_path_metric(req: Request, next: Next) -> Response {
    let metrics = ApiMetrics::instance(observe::metrics::get_storage_registry()).unwrap();

    let method = req.method().as_str();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or("unknown");
    // Label in the format "METHOD /path".
    let label = format!("{method} {matched_path}");

    let timer = Instant::now();
    let response = next.run(req).await;
    let status = response.status();

    metrics.on_request_completed(&label, status, timer);
    if status.is_client_error() || status.is_server_error() {
        metrics
            .requests_rejected
            .with_label_values(&[status.as_str()])
            .inc();
    }

    response
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "api")]
struct ApiMetrics {
    /// Number of completed API requests.
    #[metric(labels("method", "status_code"))]
    requests_complete: prometheus::IntCounterVec,

    /// Number of rejected API requests.
    #[metric(labels("status_code"))]
    requests_rejected: prometheus::IntCounterVec,

    /// Execution time for each API request.
    #[metric(
        labels("method"),
        buckets(0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0)
    )]
    requests_duration_seconds: prometheus::HistogramVec,
}

impl ApiMetrics {
    fn on_request_completed(&self, method: &str, status: StatusCode, timer: Instant) {
        self.requests_complete
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.requests_duration_seconds
            .with_label_values(&[method])
            .observe(timer.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(name, value)| (name.clone(), HeaderValue::from_static(*value)))
            .collect()
    }

    #[test]
    fn origin_header_is_mirrored() {
        let origin = origin(&headers(&[
            (header::ORIGIN, "https://publisher.example"),
            (header::REFERER, "https://other.example/page"),
        ]));
        assert_eq!(origin.unwrap(), "https://publisher.example");
    }

    #[test]
    fn origin_falls_back_to_referer() {
        let origin = origin(&headers(&[(
            header::REFERER,
            "http://publisher.example:8000/articles/1?ref=x",
        )]));
        assert_eq!(origin.unwrap(), "http://publisher.example:8000");
    }

    #[test]
    fn no_origin() {
        assert!(origin(&HeaderMap::new()).is_none());
        assert!(origin(&headers(&[(header::REFERER, "not a url")])).is_none());
    }
}
