use axum::routing::get;
use axum::Router;

pub mod content;
pub mod events;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/content", content::router(state.clone()))
        .route("/events", get(events::handler))
        .with_state(state)
}
