//! HTTP handlers for the profile directory.
//!
//! Every response uses the same envelope: `{message, payload?}` on success,
//! `{message, data?}` with status 400 on failure. Store and upload errors
//! are translated here; none of them escape as a 500 or kill the process.

use crate::{errors::AppError, models::profile::Profile, state::AppState};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// The uniform success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

/// Query params accepted by the delete endpoint.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: String,
}

/// GET `/profiles` — every stored profile, possibly empty.
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Profile>>>, AppError> {
    let profiles = state
        .profiles
        .list()
        .await
        .map_err(|err| AppError::request("error in get request", err))?;

    Ok(Json(Envelope {
        message: "profiles found",
        payload: Some(profiles),
    }))
}

/// POST `/new-profile` — multipart body with `username`, `description`, and
/// an optional `image` file field.
///
/// The upload runs before the record insert so the stored filename can land
/// in the record. A file with an unsupported declared type is skipped, not
/// an error; the profile is simply created without a picture.
pub async fn create_profile(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Envelope<Profile>>, AppError> {
    let mut username = String::new();
    let mut description = String::new();
    let mut picture_ref = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::request("error in post request", err))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "username" => {
                username = field
                    .text()
                    .await
                    .map_err(|err| AppError::request("error in post request", err))?;
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|err| AppError::request("error in post request", err))?;
            }
            "image" => {
                let original_name = field.file_name().unwrap_or("").to_string();
                let declared_type = field.content_type().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::request("error in post request", err))?;

                picture_ref = state
                    .uploads
                    .accept(&original_name, &declared_type, data)
                    .await
                    .map_err(|err| AppError::request("error in post request", err))?;
            }
            _ => continue,
        }
    }

    let profile = state
        .profiles
        .create(&username, &description, picture_ref)
        .await
        .map_err(|err| AppError::request("error in post request", err))?;

    Ok(Json(Envelope {
        message: "profile created",
        payload: Some(profile),
    }))
}

/// DELETE `/delete-profile?id=<uuid>` — removes the record, reporting
/// success whether or not the id matched anything.
pub async fn delete_profile(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Envelope<()>>, AppError> {
    let id = Uuid::parse_str(&query.id)
        .map_err(|err| AppError::request("error in delete request", err))?;

    state
        .profiles
        .delete_by_id(id)
        .await
        .map_err(|err| AppError::request("error in delete request", err))?;

    Ok(Json(Envelope {
        message: "profile deleted",
        payload: None,
    }))
}

/// GET `/images/{filename}` — read-only exposure of the media directory.
///
/// Streams the file rather than buffering it; a `pictureRef` value from any
/// profile resolves here.
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    use crate::services::upload_service::UploadError;

    let (file, content_type) = state.uploads.open(&filename).await.map_err(|err| match err {
        UploadError::NotFound(name) => AppError::not_found(format!("file `{}` not found", name)),
        UploadError::InvalidFilename => {
            AppError::new(StatusCode::BAD_REQUEST, "invalid filename")
        }
        other => AppError::internal(other.to_string()),
    })?;

    let stream = ReaderStream::new(file);
    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    Ok(response)
}
