pub mod profile_service;
pub mod upload_service;
