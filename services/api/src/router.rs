//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the streaming endpoints and OpenAPI documentation.

use crate::{
    handlers,
    models::{CourseInput, ErrorResponse, RefinementInput, Session},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::stream_outline,
        handlers::stream_lessons,
        handlers::stream_refine_lessons,
        handlers::get_session,
    ),
    components(
        schemas(Session, CourseInput, RefinementInput, ErrorResponse)
    ),
    tags(
        (name = "Coursecraft API", description = "Streaming course outline, lessons, and refinement generation")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/stream_outline", post(handlers::stream_outline))
        .route(
            "/stream_lessons/{session_id}",
            get(handlers::stream_lessons),
        )
        .route(
            "/stream_refine_lessons",
            post(handlers::stream_refine_lessons),
        )
        .route("/sessions/{id}", get(handlers::get_session))
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Create the final router that merges the stateful routes
    // with the stateless routes (like Swagger UI).
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
