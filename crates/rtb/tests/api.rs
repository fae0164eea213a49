use {
    reqwest::{StatusCode, header},
    serde_json::{Value, json},
    std::{
        net::SocketAddr,
        time::{Duration, Instant},
    },
    tokio::sync::oneshot,
};

/// Serves `app` on a random local port and returns its `/bid` endpoint.
async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/bid")
}

/// Partner that bids `cpm` after `delay`.
async fn bidding(cpm: f64, delay: Duration) -> String {
    serve(axum::Router::new().route(
        "/bid",
        axum::routing::get(move || async move {
            tokio::time::sleep(delay).await;
            axum::Json(json!({
                "cpm": cpm,
                "time_wait": delay.as_millis().to_string(),
            }))
        }),
    ))
    .await
}

/// Partner that always fails.
async fn failing() -> String {
    serve(axum::Router::new().route(
        "/bid",
        axum::routing::get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await
}

fn args(config: &tempfile::NamedTempFile) -> std::vec::IntoIter<String> {
    [
        "rtb",
        "--addr",
        "127.0.0.1:0",
        "--config",
        config.path().to_str().unwrap(),
    ]
    .into_iter()
    .map(ToOwned::to_owned)
    .collect::<Vec<_>>()
    .into_iter()
}

async fn json(response: reqwest::Response) -> Value {
    serde_json::from_str(&response.text().await.unwrap()).unwrap()
}

fn config(toml: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), toml).unwrap();
    file
}

/// Starts the service with the given partners and returns its address.
async fn start(partners: &[(&str, &str)]) -> SocketAddr {
    let mut toml = String::from("round-timeout = \"500ms\"\n");
    for (name, endpoint) in partners {
        toml.push_str(&format!(
            "\n[[partner]]\nname = \"{name}\"\nendpoint = \"{endpoint}\"\n"
        ));
    }
    let config = config(&toml);

    let (addr_sender, addr_receiver) = oneshot::channel();
    let args = args(&config);
    tokio::spawn(rtb::run(args, Some(addr_sender)));
    // The configuration is read before the address is reported.
    let addr = addr_receiver.await.unwrap();
    drop(config);
    addr
}

#[tokio::test]
async fn highest_bid_wins() {
    let a = bidding(3.2, Duration::from_millis(5)).await;
    let b = bidding(7.5, Duration::from_millis(10)).await;
    let c = bidding(1.0, Duration::from_millis(5)).await;
    let addr = start(&[("a", a.as_str()), ("b", b.as_str()), ("c", c.as_str())]).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert_eq!(response.headers()[header::SERVER], "simple rtb");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let body = json(response).await;
    assert_eq!(body["dsp"], "b");
    assert_eq!(body["Bid"], json!({ "time_wait": "10", "cpm": 7.5 }));
    assert!(body["time_req"].as_str().unwrap().ends_with('s'));
}

#[tokio::test]
async fn failing_partners_are_skipped() {
    let a = failing().await;
    let b = bidding(4.0, Duration::from_millis(5)).await;
    let addr = start(&[("a", a.as_str()), ("b", b.as_str())]).await;

    let body = json(reqwest::get(format!("http://{addr}/")).await.unwrap()).await;
    assert_eq!(body["dsp"], "b");
}

#[tokio::test]
async fn no_valid_bid_is_no_content() {
    let a = failing().await;
    let addr = start(&[("a", a.as_str())]).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn slow_partner_is_cut_off() {
    let fast = bidding(1.0, Duration::from_millis(5)).await;
    let slow = bidding(99.0, Duration::from_secs(5)).await;
    let addr = start(&[("fast", fast.as_str()), ("slow", slow.as_str())]).await;

    let started = Instant::now();
    let body = json(reqwest::get(format!("http://{addr}/")).await.unwrap()).await;
    assert_eq!(body["dsp"], "fast");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn ping_and_preflight() {
    let addr = start(&[]).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/ping"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/"))
        .header(header::ORIGIN, "https://publisher.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://publisher.example"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
    assert_eq!(response.headers()[header::VARY], "Origin");
}

#[tokio::test]
async fn synthetic_bid() {
    let addr = start(&[]).await;

    let body = json(reqwest::get(format!("http://{addr}/bid")).await.unwrap()).await;
    let cpm = body["cpm"].as_f64().unwrap();
    assert!((1.0..100.0).contains(&cpm));
    let wait: u64 = body["time_wait"].as_str().unwrap().parse().unwrap();
    assert!((1..100).contains(&wait));
}

#[tokio::test]
async fn exposes_metrics() {
    let a = bidding(2.0, Duration::from_millis(5)).await;
    let addr = start(&[("metrics-partner", a.as_str())]).await;
    reqwest::get(format!("http://{addr}/")).await.unwrap();

    let metrics = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(r#"rtb_bids{partner="metrics-partner",result="ok"} 1"#));
    assert!(metrics.contains("rtb_rounds"));
    assert!(metrics.contains("rtb_api_requests_complete"));
}

#[tokio::test]
async fn grpc_partner_fails_startup() {
    let config = config(
        r#"
        [[partner]]
        name = "dsp-1"
        endpoint = "http://127.0.0.1:8081"
        connection = "grpc"
        "#,
    );

    let err = rtb::run(args(&config), None).await.unwrap_err();
    assert!(format!("{err:#}").contains("grpc connections are not supported"));
}
