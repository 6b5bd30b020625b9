//! Booking list, creation, cancellation and status changes.
//!
//! A user may hold one `upcoming` booking at a time and a machine slot
//! (machine, date, time) may be booked once. Both rules are checked inside
//! the inserting transaction and backed by unique indexes, so a request that
//! races past the checks still fails with a conflict.

use std::time::Duration as StdDuration;

use actix_web::{
    delete, get, post, put,
    rt::time::sleep,
    web::{Data, Json, Path},
    HttpResponse,
};
use log::warn;
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, Pool, Sqlite};
use utoipa::ToSchema;

use crate::{
    database::{is_date_blocked, is_machine_present, is_user_present},
    error::{is_busy, ApiError},
    models::{new_id, AppState, Booking, BookingDetails, BookingStatus, MessageResponse},
    schedule::{format_clock, parse_clock, parse_date},
    settings::load_slot_settings,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub user_id: String,
    pub machine_id: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingCreated {
    pub message: String,
    pub id: String,
}

#[utoipa::path(
    responses(
        (status = 200, description = "List of all bookings with the booking student", body = Vec<BookingDetails>, example = json!([{
            "id": "book-0b8f7a52-1d3c-4c6e-8f0a-9e2d4b6a8c1f",
            "userId": "user-6f1c2a47-3c2e-4df1-9d6b-2b1f3a4c5d6e",
            "machineId": "WM-01",
            "date": "2024-03-01",
            "time": "10:00",
            "status": "upcoming",
            "userName": "Asha Verma",
            "userRoom": "B-204",
            "userPhone": "9876543210"
        }])),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/bookings")]
pub async fn get_all_bookings(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let bookings = query_as::<_, BookingDetails>(
        r#"
        SELECT
            b.id,
            b.user_id,
            b.machine_id,
            b.date,
            b.time,
            b.status,
            u.name AS user_name,
            u.room_no AS user_room,
            u.phone AS user_phone
        FROM bookings b
        JOIN users u ON b.user_id = u.id
        ORDER BY b.date, b.time, b.machine_id
        "#,
    )
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok().json(bookings))
}

#[utoipa::path(
    responses(
        (status = 200, description = "List of the bookings made by the requested user", body = Vec<Booking>),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/bookings/user/{user_id}")]
pub async fn get_user_bookings(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();

    let bookings = query_as::<_, Booking>(
        r#"
        SELECT id, user_id, machine_id, date, time, status
        FROM bookings
        WHERE user_id = ?
        ORDER BY date DESC, time DESC
        "#,
    )
    .bind(&user_id)
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok().json(bookings))
}

#[utoipa::path(
    request_body(content = BookingSubmission, content_type = "application/json", example = json!({
        "userId": "user-6f1c2a47-3c2e-4df1-9d6b-2b1f3a4c5d6e",
        "machineId": "WM-01",
        "date": "2024-03-01",
        "time": "10:00"
    })),
    responses(
        (status = 201, description = "The booking was created", body = BookingCreated),
        (status = 400, description = "The date or time is malformed or the time is not a slot start"),
        (status = 404, description = "The user or machine was not found"),
        (status = 409, description = "The user already has an upcoming booking, the slot is taken or the date is blocked"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/bookings")]
pub async fn add_booking(
    data: Data<AppState>,
    Json(submission): Json<BookingSubmission>,
) -> Result<HttpResponse, ApiError> {
    let date =
        parse_date(&submission.date).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let time =
        parse_clock(&submission.time).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    if !is_user_present(&data.database, &submission.user_id).await? {
        return Err(ApiError::NotFound(format!(
            "User id {} was not found.",
            submission.user_id
        )));
    }

    if !is_machine_present(&data.database, &submission.machine_id).await? {
        return Err(ApiError::NotFound(format!(
            "Machine id {} was not found.",
            submission.machine_id
        )));
    }

    let settings = load_slot_settings(&data.database).await?;
    if !settings.slot_times(date).contains(&time) {
        return Err(ApiError::BadRequest(format!(
            "{} is not a bookable slot time.",
            format_clock(time)
        )));
    }

    let slot = BookingSlot {
        user_id: &submission.user_id,
        machine_id: &submission.machine_id,
        date: date.to_string(),
        time: format_clock(time),
    };

    let mut attempt = 1;
    let id = loop {
        match insert_booking(&data.database, &slot).await {
            Err(ApiError::Database(err)) if is_busy(&err) && attempt < BUSY_RETRIES => {
                warn!("Booking insert hit a locked database, retrying (attempt {attempt})");
                sleep(StdDuration::from_millis(10 * attempt)).await;
                attempt += 1;
            }
            result => break result?,
        }
    };

    Ok(HttpResponse::Created().json(BookingCreated {
        message: "Booking created".to_string(),
        id,
    }))
}

const BUSY_RETRIES: u64 = 5;

struct BookingSlot<'a> {
    user_id: &'a str,
    machine_id: &'a str,
    date: String,
    time: String,
}

/// Runs the blocked-date, one-upcoming and slot checks and the insert in a
/// single transaction. A writer that loses the race to another transaction
/// fails with `SQLITE_BUSY`; the caller retries, and the retry sees the
/// committed winner.
async fn insert_booking(
    database: &Pool<Sqlite>,
    slot: &BookingSlot<'_>,
) -> Result<String, ApiError> {
    let mut transaction = database.begin().await?;

    if is_date_blocked(&mut *transaction, &slot.date).await? {
        return Err(ApiError::Conflict(
            "Bookings are not allowed on a blocked date.".to_string(),
        ));
    }

    let existing_booking = query("SELECT id FROM bookings WHERE user_id = ? AND status = ?")
        .bind(slot.user_id)
        .bind(BookingStatus::Upcoming)
        .fetch_optional(&mut *transaction)
        .await?;

    if existing_booking.is_some() {
        return Err(ApiError::Conflict(
            "You already have an upcoming booking.".to_string(),
        ));
    }

    let slot_taken = query("SELECT id FROM bookings WHERE machine_id = ? AND date = ? AND time = ?")
        .bind(slot.machine_id)
        .bind(&slot.date)
        .bind(&slot.time)
        .fetch_optional(&mut *transaction)
        .await?;

    if slot_taken.is_some() {
        return Err(ApiError::Conflict(
            "This slot is no longer available.".to_string(),
        ));
    }

    let id = new_id("book");
    query(
        r#"
        INSERT INTO bookings (id, user_id, machine_id, date, time, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(slot.user_id)
    .bind(slot.machine_id)
    .bind(&slot.date)
    .bind(&slot.time)
    .bind(BookingStatus::Upcoming)
    .execute(&mut *transaction)
    .await
    .map_err(|err| ApiError::conflict_on_unique(err, "This slot is no longer available."))?;

    transaction.commit().await?;

    Ok(id)
}

#[utoipa::path(
    request_body(content = BookingStatusUpdate, content_type = "application/json", example = json!({
        "status": "completed"
    })),
    responses(
        (status = 200, description = "The booking status was changed", body = MessageResponse),
        (status = 404, description = "The requested booking was not found"),
        (status = 409, description = "The user already has another upcoming booking"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[put("/api/bookings/{booking_id}/status")]
pub async fn update_booking_status(
    data: Data<AppState>,
    path: Path<String>,
    Json(update): Json<BookingStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();

    let result = query("UPDATE bookings SET status = ? WHERE id = ?")
        .bind(update.status)
        .bind(&booking_id)
        .execute(&data.database)
        .await
        .map_err(|err| {
            ApiError::conflict_on_unique(err, "The user already has another upcoming booking.")
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Booking id {booking_id} was not found."
        )));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Booking updated")))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The booking was cancelled", body = MessageResponse),
        (status = 404, description = "The requested booking was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[delete("/api/bookings/{booking_id}")]
pub async fn delete_booking(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();

    let result = query("DELETE FROM bookings WHERE id = ?")
        .bind(&booking_id)
        .execute(&data.database)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Booking id {booking_id} was not found."
        )));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Booking deleted")))
}
