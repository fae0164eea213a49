use {crate::infra::api::State, axum::http::StatusCode};

pub(in crate::infra::api) fn ping(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/ping", axum::routing::get(route))
}

async fn route() -> StatusCode {
    StatusCode::NO_CONTENT
}
