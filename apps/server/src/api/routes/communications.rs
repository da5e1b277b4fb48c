use crate::api::handlers::communications;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn communication_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/communications/receive",
            post(communications::receive_communication),
        )
        .route("/communications", get(communications::list_communications))
        .route(
            "/communications/:id/status",
            patch(communications::update_communication_status),
        )
}
