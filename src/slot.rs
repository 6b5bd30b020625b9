use std::collections::HashSet;

use actix_web::{
    get,
    web::{Data, Query},
    HttpResponse,
};
use serde::Deserialize;
use sqlx::query_as;
use utoipa::IntoParams;

use crate::{
    database::{is_date_blocked, is_machine_present},
    error::ApiError,
    models::{AppState, Slot},
    schedule::{availability, parse_date},
    settings::load_slot_settings,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    /// Machine to list slots for.
    pub machine_id: Option<String>,
    /// Day to list slots for, as `YYYY-MM-DD`.
    pub date: Option<String>,
}

#[utoipa::path(
    params(SlotQuery),
    responses(
        (status = 200, description = "Every slot of the day with its availability", body = Vec<Slot>, example = json!([
            { "time": "09:00", "available": true },
            { "time": "10:00", "available": false }
        ])),
        (status = 400, description = "The machine id or date is missing or malformed"),
        (status = 404, description = "The requested machine was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/slots")]
pub async fn get_slots(
    data: Data<AppState>,
    Query(slot_query): Query<SlotQuery>,
) -> Result<HttpResponse, ApiError> {
    let (Some(machine_id), Some(date_text)) = (
        slot_query.machine_id.filter(|id| !id.trim().is_empty()),
        slot_query.date.filter(|date| !date.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Machine ID and date are required.".to_string(),
        ));
    };

    let date = parse_date(&date_text).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    if !is_machine_present(&data.database, &machine_id).await? {
        return Err(ApiError::NotFound(format!(
            "Machine id {machine_id} was not found."
        )));
    }

    let settings = load_slot_settings(&data.database).await?;
    let day = date.to_string();
    let blocked = is_date_blocked(&data.database, &day).await?;

    let booked: HashSet<String> =
        query_as::<_, (String,)>("SELECT time FROM bookings WHERE machine_id = ? AND date = ?")
            .bind(&machine_id)
            .bind(&day)
            .fetch_all(&data.database)
            .await?
            .into_iter()
            .map(|(time,)| time)
            .collect();

    Ok(HttpResponse::Ok().json(availability(&settings, date, &booked, blocked)))
}
