use {
    crate::infra::{api::State, observe},
    axum::{
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
};

pub(in crate::infra::api) fn auction(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/", axum::routing::get(route))
}

/// Runs one auction round and announces the winner. A round without a winner
/// is answered with no content.
async fn route(state: axum::extract::State<State>) -> Response {
    match state.auction().run().await {
        Ok(settled) => Json(settled.payload()).into_response(),
        Err(err) => {
            observe::empty_auction(&err);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
