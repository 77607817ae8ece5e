//! Shared application state handed to every handler.

use crate::services::{profile_service::ProfileService, upload_service::UploadService};

/// The two core services, cloned cheaply into each request handler.
///
/// The profile store owns the record collection; the upload service owns the
/// media directory. Neither reaches into the other.
#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(profiles: ProfileService, uploads: UploadService) -> Self {
        Self { profiles, uploads }
    }
}
