//! The profile record — the single entity this service stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One directory entry: a username, a blurb, and optionally a picture.
///
/// Records are immutable once created; the only write operations are insert
/// and delete. The `Profile` struct stores a reference to the picture file,
/// not the picture bytes themselves.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Profile {
    /// Internal UUID, assigned by the store on insert. Sole deletion key.
    pub id: Uuid,

    /// Display name. Unique across all live profiles.
    pub username: String,

    /// Free-form description text.
    pub description: String,

    /// Stored filename of the uploaded picture, resolvable under
    /// `/images/{filename}`. `None` when no accepted file was uploaded.
    #[serde(rename = "pictureRef")]
    pub picture_ref: Option<String>,

    /// Timestamp when the record was inserted.
    pub created_at: DateTime<Utc>,
}
