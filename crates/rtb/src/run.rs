use {
    crate::{
        domain::{Auction, Partner},
        infra::{self, Api, Client, cli, config, observe},
    },
    anyhow::Context,
    clap::Parser,
    std::{net::SocketAddr, sync::Arc, time::Duration},
    tokio::sync::oneshot,
};

/// Runs the service until it is asked to shut down. Exits the process with a
/// non-zero code on failure.
pub async fn start(args: impl Iterator<Item = String>) {
    if let Err(err) = run(args, None).await {
        tracing::error!(?err, "auction service failed");
        std::process::exit(1);
    }
}

/// This function exists to enable running the service for testing. The
/// `addr_sender` parameter is used so that the testing framework can get the
/// address of the server and connect to it. Outside the test suite, the
/// `addr_sender` parameter is unused.
pub async fn run(
    args: impl Iterator<Item = String>,
    addr_sender: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let args = cli::Args::parse_from(args);
    observe::init(&args.observe());
    tracing::info!("running auction service with validated arguments:\n{args:#?}");

    let config = config::load(&args.config).await?;
    let auction = Arc::new(auction(&config)?);

    let (shutdown_sender, shutdown_receiver) = oneshot::channel();
    let serve = Api {
        auction,
        config: config.api,
        addr: args.addr,
        addr_sender,
    }
    .serve(async {
        let _ = shutdown_receiver.await;
    });

    futures::pin_mut!(serve);
    tokio::select! {
        result = &mut serve => result.context("serving the auction API"),
        _ = shutdown_signal() => {
            observe::shutting_down();
            let _ = shutdown_sender.send(());
            tokio::time::timeout(Duration::from_secs(10), serve)
                .await
                .context("API shutdown exceeded timeout")?
                .context("API failed during shutdown")
        }
    }
}

/// Builds the partner clients, failing on the first partner that can not be
/// reached with the configured connection.
fn auction(config: &infra::Config) -> anyhow::Result<Auction> {
    let http = reqwest::Client::builder()
        .build()
        .context("building the HTTP client")?;
    let partners = config
        .partners
        .iter()
        .map(|partner| -> anyhow::Result<Arc<Partner>> {
            let client = Client::try_new(&partner.client, http.clone())
                .with_context(|| format!("partner {}", partner.name))?;
            Ok(Arc::new(Partner::new(partner.name.clone(), client)))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Auction::new(partners, config.round_timeout))
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept signals for graceful shutdown. Kubernetes sends sigterm, Ctrl-C
    // sends sigint.
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => signal.recv().await,
            Err(_) => std::future::pending().await,
        }
    };
    let sigint = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()) {
            Ok(mut signal) => signal.recv().await,
            Err(_) => std::future::pending().await,
        }
    };
    futures::pin_mut!(sigint);
    futures::pin_mut!(sigterm);
    futures::future::select(sigterm, sigint).await;
}

#[cfg(windows)]
async fn shutdown_signal() {
    // No support for signal handling on Windows.
    std::future::pending().await
}
