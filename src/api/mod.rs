//! HTTP JSON API over [`SubscriptionService`].

pub mod docs;
pub mod dto;
mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::application::SubscriptionService;

/// Shared state handed to every handler. Cloning is cheap, the pool is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub service: SubscriptionService,
}

/// Build the API router, including the OpenAPI document and Swagger UI.
/// Middleware is layered on by the server.
pub fn router(service: SubscriptionService) -> Router {
    let state = AppState { service };

    Router::new()
        .route(
            "/subscriptions",
            post(handlers::create_subscription).get(handlers::list_subscriptions),
        )
        .route("/subscriptions/total", get(handlers::total_cost))
        .route(
            "/subscriptions/:id",
            get(handlers::get_subscription)
                .put(handlers::update_subscription)
                .delete(handlers::delete_subscription),
        )
        .route("/health", get(handlers::health))
        .merge(docs::docs_routes())
        .with_state(state)
}
