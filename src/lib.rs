pub mod auth;
pub mod blocked_date;
pub mod booking;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod machine;
pub mod models;
pub mod notification;
pub mod password;
pub mod report;
pub mod schedule;
pub mod settings;
pub mod slot;
pub mod user;

use actix_web::{
    http::Method,
    middleware::DefaultHeaders,
    web::{self, ServiceConfig},
    HttpRequest, HttpResponse,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;

/// Largest accepted JSON body; document uploads travel base64 encoded.
pub const MAX_JSON_PAYLOAD: usize = 50 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_student,
        auth::login_student,
        auth::login_admin,
        user::get_all_users,
        user::get_user,
        user::update_user,
        user::change_password,
        machine::get_all_machines,
        machine::get_machine,
        machine::add_machine,
        machine::update_machine,
        machine::delete_machine,
        booking::get_all_bookings,
        booking::get_user_bookings,
        booking::add_booking,
        booking::update_booking_status,
        booking::delete_booking,
        slot::get_slots,
        blocked_date::get_all_blocked_dates,
        blocked_date::add_blocked_date,
        blocked_date::delete_blocked_date,
        notification::get_all_notifications,
        notification::add_notification,
        notification::delete_notification,
        document::get_all_documents,
        document::download_document,
        document::upload_document,
        document::delete_document,
        settings::get_settings,
        settings::update_settings,
        report::get_summary,
        report::export_bookings,
    ),
    components(schemas(
        models::Role,
        models::User,
        models::MachineStatus,
        models::Machine,
        models::BookingStatus,
        models::Booking,
        models::BookingDetails,
        models::Slot,
        models::BlockedDate,
        models::Notification,
        models::DocumentSummary,
        models::MessageResponse,
        models::CreatedResponse,
        models::UserResponse,
        auth::SignupSubmission,
        auth::StudentLogin,
        auth::AdminLogin,
        user::UserUpdate,
        user::PasswordChange,
        machine::MachineSubmission,
        machine::MachineUpdate,
        booking::BookingSubmission,
        booking::BookingStatusUpdate,
        booking::BookingCreated,
        blocked_date::BlockedDateSubmission,
        blocked_date::BlockedDateCreated,
        notification::NotificationSubmission,
        document::DocumentSubmission,
        settings::SlotSettingsBody,
        report::ReportSummary,
        report::MachineUsage,
    ))
)]
pub struct ApiDoc;

/// Permissive CORS headers for the browser client, added to every response.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
}

/// Answers CORS preflights and turns every other unmatched request into a
/// JSON 404.
pub async fn fallback(request: HttpRequest) -> Result<HttpResponse, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(HttpResponse::Ok().finish());
    }

    Err(ApiError::NotFound(format!(
        "No route for {} {}",
        request.method(),
        request.path()
    )))
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_JSON_PAYLOAD)
            .error_handler(|err, _request| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _request| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(auth::signup_student)
    .service(auth::login_student)
    .service(auth::login_admin)
    .service(user::get_all_users)
    .service(user::change_password)
    .service(user::get_user)
    .service(user::update_user)
    .service(machine::get_all_machines)
    .service(machine::get_machine)
    .service(machine::add_machine)
    .service(machine::update_machine)
    .service(machine::delete_machine)
    .service(booking::get_all_bookings)
    .service(booking::get_user_bookings)
    .service(booking::add_booking)
    .service(booking::update_booking_status)
    .service(booking::delete_booking)
    .service(slot::get_slots)
    .service(blocked_date::get_all_blocked_dates)
    .service(blocked_date::add_blocked_date)
    .service(blocked_date::delete_blocked_date)
    .service(notification::get_all_notifications)
    .service(notification::add_notification)
    .service(notification::delete_notification)
    .service(document::get_all_documents)
    .service(document::download_document)
    .service(document::upload_document)
    .service(document::delete_document)
    .service(settings::get_settings)
    .service(settings::update_settings)
    .service(report::get_summary)
    .service(report::export_bookings)
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
