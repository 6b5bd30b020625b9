use actix_web::{
    delete, get, post,
    web::{Data, Json, Path},
    HttpResponse,
};
use log::info;
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::{new_id, AppState, BlockedDate, MessageResponse},
    schedule::parse_date,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BlockedDateSubmission {
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDateCreated {
    pub id: String,
    pub cancelled_bookings: u64,
}

#[utoipa::path(
    responses(
        (status = 200, description = "List of all blocked dates", body = Vec<BlockedDate>, example = json!([{
            "id": "block-3e5a7c9b-2d4f-4a6b-8c0d-1e3f5a7b9c2d",
            "date": "2024-03-08",
            "reason": "Plumbing work"
        }])),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/blocked-dates")]
pub async fn get_all_blocked_dates(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let blocked_dates =
        query_as::<_, BlockedDate>("SELECT id, date, reason FROM blocked_dates ORDER BY date")
            .fetch_all(&data.database)
            .await?;

    Ok(HttpResponse::Ok().json(blocked_dates))
}

#[utoipa::path(
    request_body(content = BlockedDateSubmission, content_type = "application/json", example = json!({
        "date": "2024-03-08",
        "reason": "Plumbing work"
    })),
    responses(
        (status = 201, description = "The date was blocked and its bookings cancelled", body = BlockedDateCreated, example = json!({
            "id": "block-3e5a7c9b-2d4f-4a6b-8c0d-1e3f5a7b9c2d",
            "cancelledBookings": 3
        })),
        (status = 400, description = "The date is malformed"),
        (status = 409, description = "The date is already blocked"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/blocked-dates")]
pub async fn add_blocked_date(
    data: Data<AppState>,
    Json(submission): Json<BlockedDateSubmission>,
) -> Result<HttpResponse, ApiError> {
    let date = parse_date(&submission.date)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
        .to_string();
    let reason = submission
        .reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());
    let id = new_id("block");

    let mut transaction = data.database.begin().await?;

    query("INSERT INTO blocked_dates (id, date, reason) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&date)
        .bind(reason)
        .execute(&mut *transaction)
        .await
        .map_err(|err| ApiError::conflict_on_unique(err, &format!("{date} is already blocked.")))?;

    let cancelled_bookings = query("DELETE FROM bookings WHERE date = ?")
        .bind(&date)
        .execute(&mut *transaction)
        .await?
        .rows_affected();

    transaction.commit().await?;

    info!("Blocked {date} and cancelled {cancelled_bookings} booking(s)");

    Ok(HttpResponse::Created().json(BlockedDateCreated {
        id,
        cancelled_bookings,
    }))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The date was unblocked", body = MessageResponse),
        (status = 404, description = "The requested blocked date was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[delete("/api/blocked-dates/{blocked_date_id}")]
pub async fn delete_blocked_date(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let blocked_date_id = path.into_inner();

    let result = query("DELETE FROM blocked_dates WHERE id = ?")
        .bind(&blocked_date_id)
        .execute(&data.database)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Blocked date id {blocked_date_id} was not found."
        )));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Date unblocked")))
}
