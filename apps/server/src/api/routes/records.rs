use crate::api::handlers::records;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/records",
            post(records::create_record).get(records::list_records),
        )
        .route("/records/:id/send", post(records::send_record))
}
