pub mod auth;
pub mod error;
pub mod ticket;

use std::{any::Any, sync::Arc};

use axum::{
    http::{
        header::{InvalidHeaderValue, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer,
};

use crate::{api, config, service};

pub use self::{auth::ApiKey, error::Error};

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    pub tickets: service::Tickets,

    pub api_key: ApiKey,
}

/// Builds the whole HTTP surface, authentication included.
pub fn router(
    state: AppState,
    cors: &config::Cors,
) -> Result<Router, InvalidHeaderValue> {
    let state = Arc::new(state);

    let mut cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, auth::API_KEY_HEADER.clone()]);
    for origin in &cors.allowed_origins {
        cors_layer = cors_layer.allow_origin(origin.parse::<HeaderValue>()?);
    }

    Ok(Router::new()
        .route("/health", get(health))
        .route("/test", get(test))
        .route(
            "/tickets",
            get(ticket::list_tickets).post(ticket::create_ticket),
        )
        .route(
            "/tickets/:id",
            get(ticket::get_ticket)
                .patch(ticket::update_ticket)
                .delete(ticket::delete_ticket),
        )
        .route("/tickets/:id/assign", patch(ticket::assign_ticket))
        .route("/tickets/:id/comments", post(ticket::add_comment))
        .route("/tickets/:id/escalate", patch(ticket::escalate_ticket))
        .route("/tickets/:id/status", patch(ticket::update_status))
        .route("/tickets/:id/feedback", post(ticket::submit_feedback))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(internal_error))
        .with_state(state))
}

async fn health() -> &'static str {
    "OK"
}

async fn test() -> &'static str {
    "API is working"
}

async fn not_found() -> (StatusCode, Json<api::Error>) {
    (
        StatusCode::NOT_FOUND,
        Json(api::Error::new("Resource not found")),
    )
}

fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(api::Error::new("An unexpected error occurred")),
    )
        .into_response()
}
