use {
    crate::{domain::BidResponse, infra::api::State},
    axum::response::Json,
    rand::Rng,
    std::time::Duration,
};

pub(in crate::infra::api) fn bid(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/bid", axum::routing::get(route))
}

/// Behaves like a demand side partner: answers with a random price after a
/// random delay.
async fn route() -> Json<BidResponse> {
    let (wait, cpm) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(1..100u64), rng.gen_range(1.0..100.0))
    };
    tokio::time::sleep(Duration::from_millis(wait)).await;
    Json(BidResponse {
        time_wait: wait.to_string(),
        cpm,
    })
}
