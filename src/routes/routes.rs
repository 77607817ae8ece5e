//! Defines routes for the profile directory API.
//!
//! ## Structure
//! - **Profile endpoints**
//!   - `GET    /profiles` — list every stored profile
//!   - `POST   /new-profile` — create a profile from a multipart submission
//!   - `DELETE /delete-profile?id=<uuid>` — delete a profile by id
//!
//! - **Media endpoint**
//!   - `GET    /images/{filename}` — serve a stored picture read-only
//!
//! No endpoint performs authorization; any caller who can reach the API can
//! create or delete any profile.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        profile_handlers::{create_profile, delete_profile, get_image, list_profiles},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build and return the router for all profile and media routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Profile endpoints
        .route("/profiles", get(list_profiles))
        .route("/new-profile", post(create_profile))
        .route("/delete-profile", delete(delete_profile))
        // Media endpoint
        .route("/images/{filename}", get(get_image))
}
