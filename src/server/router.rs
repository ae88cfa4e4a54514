use super::{handlers, SharedRepository};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tracing::debug;

/// Binds the three metric routes to a repository.
///
/// Unknown paths fall through to axum's 404. Known paths reached with the
/// wrong method get a 405 with a plain-text body.
pub fn build_router(repo: SharedRepository) -> Router {
    Router::new()
        .route("/update/{type}/{name}/{value}", post(handlers::update_metric))
        .route("/value/{type}/{name}", get(handlers::get_value))
        .route("/", get(handlers::list_metrics))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(middleware::from_fn(log_request))
        .with_state(repo)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    debug!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}
