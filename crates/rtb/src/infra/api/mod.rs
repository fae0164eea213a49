use {
    crate::{domain::Auction, infra::observe},
    axum::http::{HeaderValue, header},
    std::{future::Future, net::SocketAddr, sync::Arc, time::Duration},
    tokio::sync::{Semaphore, oneshot},
    tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer},
};

mod middleware;
mod routes;

const JSON: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone)]
pub struct Config {
    /// Sent in the `Server` response header.
    pub name: String,
    pub request_timeout: Duration,
    /// Requests beyond this many in flight are rejected.
    pub concurrency: usize,
    pub max_body_size: usize,
    /// Serve random bids on `/bid`.
    pub synthetic_bids: bool,
}

pub struct Api {
    pub auction: Arc<Auction>,
    pub config: Config,
    pub addr: SocketAddr,
    /// If this channel is specified, the bound address will be sent to it. This
    /// allows the service to bind to 0.0.0.0:0 during testing.
    pub addr_sender: Option<oneshot::Sender<SocketAddr>>,
}

impl Api {
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let app = router(self.auction, &self.config);

        // Start the server.
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        observe::serving(local_addr);
        if let Some(addr_sender) = self.addr_sender {
            // The receiver only goes away if the caller lost interest.
            let _ = addr_sender.send(local_addr);
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

fn router(auction: Arc<Auction>, config: &Config) -> axum::Router {
    let mut app = axum::Router::new();
    app = routes::auction(app);
    app = routes::ping(app);
    if config.synthetic_bids {
        app = routes::bid(app);
    }
    let app = app
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON),
        ))
        .with_state(State(auction));
    let app = routes::metrics(app);

    let server = HeaderValue::from_str(&config.name)
        .unwrap_or_else(|_| HeaderValue::from_static("simple rtb"));
    app.layer(TimeoutLayer::new(config.request_timeout))
        .layer(axum::middleware::from_fn_with_state(
            Arc::new(Semaphore::new(config.concurrency)),
            middleware::limit_concurrency,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_size))
        .layer(axum::middleware::from_fn(middleware::cors))
        .layer(SetResponseHeaderLayer::overriding(header::SERVER, server))
        .layer(axum::middleware::from_fn(
            middleware::with_matched_path_metric,
        ))
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct State(Arc<Auction>);

impl State {
    fn auction(&self) -> &Auction {
        &self.0
    }
}
