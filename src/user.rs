use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, Pool, Sqlite};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::{AppState, MessageResponse, Role, User, UserResponse},
    password::{hash_password, verify_password},
};

pub const USER_COLUMNS: &str =
    "id, name, phone, email, room_no, course_name, department_name, role";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub room_no: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub user_id: String,
    pub current_password: String,
    pub new_password: String,
}

/// Trims the value and maps empty strings to `None`, so blank optional
/// fields never collide on the unique phone and email columns.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub async fn fetch_user(database: &Pool<Sqlite>, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(database)
        .await
}

pub async fn fetch_password_hash(
    database: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    query_as::<_, (String,)>("SELECT password_hash FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(database)
        .await
        .map(|row| row.map(|(password_hash,)| password_hash))
}

#[utoipa::path(
    responses(
        (status = 200, description = "List of all students", body = Vec<User>, example = json!([{
            "id": "user-6f1c2a47-3c2e-4df1-9d6b-2b1f3a4c5d6e",
            "name": "Asha Verma",
            "phone": "9876543210",
            "email": "asha@example.com",
            "roomNo": "B-204",
            "courseName": "B.Tech",
            "departmentName": "Computer Science",
            "role": "student"
        }])),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/users")]
pub async fn get_all_users(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY name"
    ))
    .bind(Role::Student)
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    responses(
        (status = 200, description = "The requested user", body = User),
        (status = 404, description = "The requested user was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/users/{user_id}")]
pub async fn get_user(data: Data<AppState>, path: Path<String>) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();

    match fetch_user(&data.database, &user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound(format!("User id {user_id} was not found."))),
    }
}

#[utoipa::path(
    request_body(content = UserUpdate, content_type = "application/json", example = json!({
        "name": "Asha Verma",
        "email": "asha@example.com",
        "phone": "9876543210",
        "roomNo": "C-101"
    })),
    responses(
        (status = 200, description = "The profile was updated", body = UserResponse),
        (status = 400, description = "The name is blank"),
        (status = 404, description = "The requested user was not found"),
        (status = 409, description = "The phone or email belongs to another user"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[put("/api/users/{user_id}")]
pub async fn update_user(
    data: Data<AppState>,
    path: Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();

    let name = update.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required.".to_string()));
    }

    let result = query("UPDATE users SET name = ?, email = ?, phone = ?, room_no = ? WHERE id = ?")
        .bind(name)
        .bind(non_blank(update.email))
        .bind(non_blank(update.phone))
        .bind(non_blank(update.room_no))
        .bind(&user_id)
        .execute(&data.database)
        .await
        .map_err(|err| {
            ApiError::conflict_on_unique(err, "Another user already uses this phone or email.")
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("User id {user_id} was not found.")));
    }

    let user = fetch_user(&data.database, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User id {user_id} was not found.")))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        message: "User updated".to_string(),
        user,
    }))
}

#[utoipa::path(
    request_body(content = PasswordChange, content_type = "application/json", example = json!({
        "userId": "user-6f1c2a47-3c2e-4df1-9d6b-2b1f3a4c5d6e",
        "currentPassword": "old-secret",
        "newPassword": "new-secret"
    })),
    responses(
        (status = 200, description = "The password was changed", body = MessageResponse),
        (status = 400, description = "The new password is blank"),
        (status = 401, description = "The current password is incorrect"),
        (status = 404, description = "The requested user was not found"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/users/change-password")]
pub async fn change_password(
    data: Data<AppState>,
    Json(change): Json<PasswordChange>,
) -> Result<HttpResponse, ApiError> {
    if change.new_password.is_empty() {
        return Err(ApiError::BadRequest("New password is required.".to_string()));
    }

    let password_hash = fetch_password_hash(&data.database, &change.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    if !verify_password(&change.current_password, &password_hash)? {
        return Err(ApiError::Unauthorized(
            "Incorrect current password.".to_string(),
        ));
    }

    query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(hash_password(&change.new_password)?)
        .bind(&change.user_id)
        .execute(&data.database)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated successfully.")))
}
