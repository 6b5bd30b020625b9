use actix_web::{
    get, put,
    web::{Data, Json},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, Pool, Sqlite};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::AppState,
    schedule::{
        format_clock, parse_clock, ScheduleError, SlotSettings, END_TIME_KEY, SLOT_DURATION_KEY,
        START_TIME_KEY,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotSettingsBody {
    pub start_time: String,
    pub end_time: String,
    pub slot_duration: i64,
}

impl From<SlotSettings> for SlotSettingsBody {
    fn from(settings: SlotSettings) -> Self {
        SlotSettingsBody {
            start_time: format_clock(settings.start_time()),
            end_time: format_clock(settings.end_time()),
            slot_duration: settings.slot_minutes(),
        }
    }
}

fn parse_submission(submission: &SlotSettingsBody) -> Result<SlotSettings, ScheduleError> {
    let start_time = parse_clock(&submission.start_time)?;
    let end_time = parse_clock(&submission.end_time)?;
    SlotSettings::new(start_time, end_time, submission.slot_duration)
}

pub async fn load_slot_settings(database: &Pool<Sqlite>) -> Result<SlotSettings, sqlx::Error> {
    let rows = query_as::<_, (String, String)>("SELECT key, value FROM settings")
        .fetch_all(database)
        .await?;

    Ok(SlotSettings::from_pairs(
        rows.iter().map(|(key, value)| (key.as_str(), value.as_str())),
    ))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The business hours and slot width used for booking", body = SlotSettingsBody, example = json!({
            "startTime": "09:00",
            "endTime": "21:00",
            "slotDuration": 60
        })),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/settings")]
pub async fn get_settings(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let settings = load_slot_settings(&data.database).await?;
    Ok(HttpResponse::Ok().json(SlotSettingsBody::from(settings)))
}

#[utoipa::path(
    request_body(content = SlotSettingsBody, content_type = "application/json", example = json!({
        "startTime": "08:00",
        "endTime": "22:00",
        "slotDuration": 45
    })),
    responses(
        (status = 200, description = "The settings were stored", body = SlotSettingsBody),
        (status = 400, description = "The times or duration are invalid"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[put("/api/settings")]
pub async fn update_settings(
    data: Data<AppState>,
    Json(submission): Json<SlotSettingsBody>,
) -> Result<HttpResponse, ApiError> {
    let settings =
        parse_submission(&submission).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let body = SlotSettingsBody::from(settings);
    let entries = [
        (START_TIME_KEY, body.start_time.clone()),
        (END_TIME_KEY, body.end_time.clone()),
        (SLOT_DURATION_KEY, body.slot_duration.to_string()),
    ];

    let mut transaction = data.database.begin().await?;
    for (key, value) in entries {
        query(
            r#"
            INSERT INTO settings (key, value)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *transaction)
        .await?;
    }
    transaction.commit().await?;

    Ok(HttpResponse::Ok().json(body))
}
