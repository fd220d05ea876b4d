use axum::Router;
use http::header::{HeaderName, ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod client;
pub mod v0;

use crate::ServiceState;

/// Any origin, no credentials. Browsers may send the transaction header.
fn cors() -> CorsLayer {
    let transaction = HeaderName::from_static(v0::content::TRANSACTION_HEADER);
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([ACCEPT, CONTENT_TYPE, ORIGIN, transaction])
        .allow_credentials(false)
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/v0", v0::router(state.clone()))
        .with_state(state)
        .layer(cors())
}
