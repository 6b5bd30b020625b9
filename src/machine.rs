use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    models::{AppState, CreatedResponse, Machine, MachineStatus, MessageResponse},
    schedule::parse_date,
};

const MACHINE_COLUMNS: &str = "id, model, status, last_maintenance";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MachineQuery {
    /// Only list machines in this state.
    pub status: Option<MachineStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineSubmission {
    pub id: String,
    pub model: String,
    #[serde(default)]
    pub status: MachineStatus,
    pub last_maintenance: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineUpdate {
    pub model: String,
    pub status: MachineStatus,
    pub last_maintenance: String,
}

fn maintenance_date(value: &str) -> Result<String, ApiError> {
    parse_date(value)
        .map(|date| date.to_string())
        .map_err(|err| ApiError::BadRequest(err.to_string()))
}

#[utoipa::path(
    params(MachineQuery),
    responses(
        (status = 200, description = "List of all machines", body = Vec<Machine>, example = json!([{
            "id": "WM-01",
            "model": "LG FH4U2",
            "status": "available",
            "lastMaintenance": "2024-01-15"
        }])),
        (status = 400, description = "The status filter is not a machine status"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/machines")]
pub async fn get_all_machines(
    data: Data<AppState>,
    Query(machine_query): Query<MachineQuery>,
) -> Result<HttpResponse, ApiError> {
    let machines = match machine_query.status {
        Some(status) => {
            query_as::<_, Machine>(&format!(
                "SELECT {MACHINE_COLUMNS} FROM machines WHERE status = ? ORDER BY id"
            ))
            .bind(status)
            .fetch_all(&data.database)
            .await?
        }
        None => {
            query_as::<_, Machine>(&format!("SELECT {MACHINE_COLUMNS} FROM machines ORDER BY id"))
                .fetch_all(&data.database)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(machines))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The requested machine", body = Machine),
        (status = 404, description = "The requested machine was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/machines/{machine_id}")]
pub async fn get_machine(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let machine_id = path.into_inner();

    match query_as::<_, Machine>(&format!(
        "SELECT {MACHINE_COLUMNS} FROM machines WHERE id = ?"
    ))
    .bind(&machine_id)
    .fetch_optional(&data.database)
    .await?
    {
        Some(machine) => Ok(HttpResponse::Ok().json(machine)),
        None => Err(ApiError::NotFound(format!(
            "Machine id {machine_id} was not found."
        ))),
    }
}

#[utoipa::path(
    request_body(content = MachineSubmission, content_type = "application/json", example = json!({
        "id": "WM-01",
        "model": "LG FH4U2",
        "status": "available",
        "lastMaintenance": "2024-01-15"
    })),
    responses(
        (status = 201, description = "The machine was added", body = CreatedResponse, example = json!({ "id": "WM-01" })),
        (status = 400, description = "The maintenance date is malformed"),
        (status = 409, description = "A machine with this id already exists"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/machines")]
pub async fn add_machine(
    data: Data<AppState>,
    Json(submission): Json<MachineSubmission>,
) -> Result<HttpResponse, ApiError> {
    let id = submission.id.trim().to_string();
    if id.is_empty() || submission.model.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Machine id and model are required.".to_string(),
        ));
    }
    let last_maintenance = maintenance_date(&submission.last_maintenance)?;

    query("INSERT INTO machines (id, model, status, last_maintenance) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(submission.model.trim())
        .bind(submission.status)
        .bind(last_maintenance)
        .execute(&data.database)
        .await
        .map_err(|err| {
            ApiError::conflict_on_unique(err, &format!("Machine id {id} already exists."))
        })?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

#[utoipa::path(
    request_body(content = MachineUpdate, content_type = "application/json", example = json!({
        "model": "LG FH4U2",
        "status": "maintenance",
        "lastMaintenance": "2024-02-01"
    })),
    responses(
        (status = 200, description = "The machine was updated", body = MessageResponse),
        (status = 400, description = "The maintenance date is malformed"),
        (status = 404, description = "The requested machine was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[put("/api/machines/{machine_id}")]
pub async fn update_machine(
    data: Data<AppState>,
    path: Path<String>,
    Json(update): Json<MachineUpdate>,
) -> Result<HttpResponse, ApiError> {
    let machine_id = path.into_inner();
    let last_maintenance = maintenance_date(&update.last_maintenance)?;

    let result =
        query("UPDATE machines SET model = ?, status = ?, last_maintenance = ? WHERE id = ?")
            .bind(update.model.trim())
            .bind(update.status)
            .bind(last_maintenance)
            .bind(&machine_id)
            .execute(&data.database)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Machine id {machine_id} was not found."
        )));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Machine updated")))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The machine and its bookings were deleted", body = MessageResponse),
        (status = 404, description = "The requested machine was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[delete("/api/machines/{machine_id}")]
pub async fn delete_machine(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let machine_id = path.into_inner();

    let result = query("DELETE FROM machines WHERE id = ?")
        .bind(&machine_id)
        .execute(&data.database)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Machine id {machine_id} was not found."
        )));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Machine deleted")))
}
