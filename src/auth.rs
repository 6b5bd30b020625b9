//! Signup and login for students and administrators.
//!
//! Login hands back the user record; there is no session or token, the
//! client keeps the returned user itself.

use actix_web::{
    post,
    web::{Data, Json},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, Pool, Sqlite};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::{new_id, AppState, MessageResponse, Role, UserResponse},
    password::{hash_password, verify_password},
    user::{fetch_user, non_blank},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupSubmission {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub room_no: Option<String>,
    pub course_name: Option<String>,
    pub department_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentLogin {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLogin {
    pub email: String,
    pub password: String,
}

/// Looks up `(id, password_hash)` with `sql`, checks the password and loads
/// the full user on success.
async fn authenticate(
    database: &Pool<Sqlite>,
    sql: &str,
    identifier: &str,
    role: Role,
    password: &str,
    not_found: &str,
) -> Result<HttpResponse, ApiError> {
    let (user_id, password_hash) = query_as::<_, (String, String)>(sql)
        .bind(identifier.trim())
        .bind(role)
        .fetch_optional(database)
        .await?
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))?;

    if !verify_password(password, &password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials.".to_string()));
    }

    let user = fetch_user(database, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(not_found.to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        message: "Login successful".to_string(),
        user,
    }))
}

#[utoipa::path(
    request_body(content = SignupSubmission, content_type = "application/json", example = json!({
        "name": "Asha Verma",
        "phone": "9876543210",
        "email": "asha@example.com",
        "roomNo": "B-204",
        "courseName": "B.Tech",
        "departmentName": "Computer Science",
        "password": "secret"
    })),
    responses(
        (status = 201, description = "The student account was created", body = MessageResponse),
        (status = 400, description = "Name, phone or password is missing"),
        (status = 409, description = "The phone or email is already registered"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/auth/signup/student")]
pub async fn signup_student(
    data: Data<AppState>,
    Json(submission): Json<SignupSubmission>,
) -> Result<HttpResponse, ApiError> {
    let password = submission.password.filter(|password| !password.is_empty());
    let (Some(name), Some(phone), Some(password)) =
        (non_blank(submission.name), non_blank(submission.phone), password)
    else {
        return Err(ApiError::BadRequest(
            "Name, phone, and password are required.".to_string(),
        ));
    };
    let email = non_blank(submission.email);

    let existing = query_as::<_, (String,)>("SELECT id FROM users WHERE phone = ? OR email = ?")
        .bind(&phone)
        .bind(&email)
        .fetch_optional(&data.database)
        .await?;

    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User with this phone or email already exists.".to_string(),
        ));
    }

    query(
        r#"
        INSERT INTO users (id, name, phone, email, room_no, course_name, department_name, password_hash, role)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_id("user"))
    .bind(name)
    .bind(phone)
    .bind(email)
    .bind(non_blank(submission.room_no))
    .bind(non_blank(submission.course_name))
    .bind(non_blank(submission.department_name))
    .bind(hash_password(&password)?)
    .bind(Role::Student)
    .execute(&data.database)
    .await
    .map_err(|err| {
        ApiError::conflict_on_unique(err, "User with this phone or email already exists.")
    })?;

    Ok(HttpResponse::Created().json(MessageResponse::new("User created successfully.")))
}

#[utoipa::path(
    request_body(content = StudentLogin, content_type = "application/json", example = json!({
        "phone": "9876543210",
        "password": "secret"
    })),
    responses(
        (status = 200, description = "The credentials are valid", body = UserResponse),
        (status = 401, description = "The password is incorrect"),
        (status = 404, description = "No student is registered with this phone"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/auth/login/student")]
pub async fn login_student(
    data: Data<AppState>,
    Json(login): Json<StudentLogin>,
) -> Result<HttpResponse, ApiError> {
    authenticate(
        &data.database,
        "SELECT id, password_hash FROM users WHERE phone = ? AND role = ?",
        &login.phone,
        Role::Student,
        &login.password,
        "Student not found or invalid credentials.",
    )
    .await
}

#[utoipa::path(
    request_body(content = AdminLogin, content_type = "application/json", example = json!({
        "email": "admin@hostel.com",
        "password": "password"
    })),
    responses(
        (status = 200, description = "The credentials are valid", body = UserResponse),
        (status = 401, description = "The password is incorrect"),
        (status = 404, description = "No administrator is registered with this email"),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[post("/api/auth/login/admin")]
pub async fn login_admin(
    data: Data<AppState>,
    Json(login): Json<AdminLogin>,
) -> Result<HttpResponse, ApiError> {
    authenticate(
        &data.database,
        "SELECT id, password_hash FROM users WHERE email = ? AND role = ?",
        &login.email,
        Role::Admin,
        &login.password,
        "Admin not found or invalid credentials.",
    )
    .await
}
