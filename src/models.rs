use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, Sqlite, Type};
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub database: Pool<Sqlite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub room_no: Option<String>,
    pub course_name: Option<String>,
    pub department_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum MachineStatus {
    #[default]
    Available,
    InUse,
    Maintenance,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    pub model: String,
    pub status: MachineStatus,
    pub last_maintenance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Upcoming,
    Active,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub machine_id: String,
    pub date: String,
    pub time: String,
    pub status: BookingStatus,
}

/// A booking joined with the student who made it.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub id: String,
    pub user_id: String,
    pub machine_id: String,
    pub date: String,
    pub time: String,
    pub status: BookingStatus,
    pub user_name: String,
    pub user_room: Option<String>,
    pub user_phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Slot {
    pub time: String,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BlockedDate {
    pub id: String,
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: String,
    pub subject: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub timestamp: OffsetDateTime,
    pub media: Option<String>,
    pub media_type: Option<String>,
}

/// Document metadata; the file contents are only served by the download route.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub filetype: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub uploaded_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

/// Builds a fresh row id such as `book-5f0c...`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
