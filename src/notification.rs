use actix_web::{
    delete, get, post,
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::{new_id, AppState, CreatedResponse, MessageResponse, Notification},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationSubmission {
    pub subject: String,
    pub message: String,
    /// Base64 encoded attachment.
    pub media: Option<String>,
    pub media_type: Option<String>,
}

#[utoipa::path(
    responses(
        (status = 200, description = "List of all notifications, newest first", body = Vec<Notification>, example = json!([{
            "id": "notif-7c9e1a3b-5d7f-4b2a-9c4e-6f8a0b2c4d6e",
            "subject": "Machine WM-02 repaired",
            "message": "WM-02 is available for booking again.",
            "timestamp": "2024-03-01T08:30:00Z",
            "media": null,
            "media_type": null
        }])),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/notifications")]
pub async fn get_all_notifications(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let notifications = query_as::<_, Notification>(
        r#"
        SELECT id, subject, message, timestamp, media, media_type
        FROM notifications
        ORDER BY timestamp DESC, rowid DESC
        "#,
    )
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok().json(notifications))
}

#[utoipa::path(
    request_body(content = NotificationSubmission, content_type = "application/json", example = json!({
        "subject": "Machine WM-02 repaired",
        "message": "WM-02 is available for booking again."
    })),
    responses(
        (status = 201, description = "The notification was published", body = CreatedResponse),
        (status = 400, description = "The subject or message is blank"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/notifications")]
pub async fn add_notification(
    data: Data<AppState>,
    Json(submission): Json<NotificationSubmission>,
) -> Result<HttpResponse, ApiError> {
    if submission.subject.trim().is_empty() || submission.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Subject and message are required.".to_string(),
        ));
    }

    let id = new_id("notif");
    query(
        r#"
        INSERT INTO notifications (id, subject, message, timestamp, media, media_type)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(submission.subject.trim())
    .bind(submission.message.trim())
    .bind(OffsetDateTime::now_utc())
    .bind(submission.media)
    .bind(submission.media_type)
    .execute(&data.database)
    .await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The notification was deleted", body = MessageResponse),
        (status = 404, description = "The requested notification was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[delete("/api/notifications/{notification_id}")]
pub async fn delete_notification(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let notification_id = path.into_inner();

    let result = query("DELETE FROM notifications WHERE id = ?")
        .bind(&notification_id)
        .execute(&data.database)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Notification id {notification_id} was not found."
        )));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Notification deleted")))
}
