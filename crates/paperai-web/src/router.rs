//! Axum router: maps all URL paths to handlers.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    auth::{login_page, login_submit, logout, signup_page, signup_submit},
    chat::{chat_submit, transcript},
    dashboard::{dashboard, upload},
};

/// Room for the multipart framing and the edit mode field on top of the
/// file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes.saturating_add(MULTIPART_OVERHEAD);
    let static_dir = ServeDir::new(&state.config.server.static_dir);
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Public pages
        .route("/login",  get(login_page).post(login_submit))
        .route("/signup", get(signup_page).post(signup_submit))
        .route("/logout", get(logout).post(logout))

        // Protected pages
        .route("/dashboard",            get(dashboard))
        .route("/dashboard/upload",     post(upload))
        .route("/dashboard/chat",       post(chat_submit))
        .route("/dashboard/transcript", get(transcript))

        // Static files
        .nest_service("/static", static_dir)

        // Anything else lands on the login page
        .fallback(login_page)

        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
