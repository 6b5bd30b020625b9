use std::borrow::Cow;

use actix_web::{
    get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web::Data,
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query_as, query_scalar, FromRow};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::{AppState, BookingStatus, MachineStatus, Role},
};

const CSV_HEADER: &str = "Booking ID,Student Name,Room No,Phone,Machine ID,Date,Time,Status";
const CSV_MISSING: &str = "N/A";

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_bookings: i64,
    pub upcoming_bookings: i64,
    pub active_bookings: i64,
    pub completed_bookings: i64,
    pub total_students: i64,
    pub machines_in_use: i64,
    pub machines_in_maintenance: i64,
    pub bookings_per_machine: Vec<MachineUsage>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineUsage {
    pub machine_id: String,
    pub bookings: i64,
}

#[derive(Debug, FromRow)]
struct BookingExportRow {
    id: String,
    user_name: Option<String>,
    user_room: Option<String>,
    user_phone: Option<String>,
    machine_id: String,
    date: String,
    time: String,
    status: BookingStatus,
}

/// Quotes a CSV field when it holds a separator, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn csv_optional(value: &Option<String>) -> Cow<'_, str> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => csv_field(value),
        _ => Cow::Borrowed(CSV_MISSING),
    }
}

fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Upcoming => "upcoming",
        BookingStatus::Active => "active",
        BookingStatus::Completed => "completed",
    }
}

fn bookings_csv(rows: &[BookingExportRow]) -> String {
    let mut csv = String::from(CSV_HEADER);
    for row in rows {
        let fields = [
            csv_field(&row.id),
            csv_optional(&row.user_name),
            csv_optional(&row.user_room),
            csv_optional(&row.user_phone),
            csv_field(&row.machine_id),
            csv_field(&row.date),
            csv_field(&row.time),
            Cow::Borrowed(status_label(row.status)),
        ];
        csv.push('\n');
        csv.push_str(&fields.join(","));
    }
    csv
}

#[utoipa::path(
    responses(
        (status = 200, description = "Booking, student and machine totals", body = ReportSummary, example = json!({
            "totalBookings": 4,
            "upcomingBookings": 3,
            "activeBookings": 0,
            "completedBookings": 1,
            "totalStudents": 12,
            "machinesInUse": 1,
            "machinesInMaintenance": 1,
            "bookingsPerMachine": [{ "machineId": "WM-01", "bookings": 4 }]
        })),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/reports/summary")]
pub async fn get_summary(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let mut summary = ReportSummary::default();

    let booking_counts =
        query_as::<_, (BookingStatus, i64)>("SELECT status, COUNT(*) FROM bookings GROUP BY status")
            .fetch_all(&data.database)
            .await?;
    for (status, count) in booking_counts {
        summary.total_bookings += count;
        match status {
            BookingStatus::Upcoming => summary.upcoming_bookings = count,
            BookingStatus::Active => summary.active_bookings = count,
            BookingStatus::Completed => summary.completed_bookings = count,
        }
    }

    summary.total_students = query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(Role::Student)
        .fetch_one(&data.database)
        .await?;

    let machine_counts =
        query_as::<_, (MachineStatus, i64)>("SELECT status, COUNT(*) FROM machines GROUP BY status")
            .fetch_all(&data.database)
            .await?;
    for (status, count) in machine_counts {
        match status {
            MachineStatus::InUse => summary.machines_in_use = count,
            MachineStatus::Maintenance => summary.machines_in_maintenance = count,
            MachineStatus::Available => {}
        }
    }

    summary.bookings_per_machine = query_as::<_, MachineUsage>(
        r#"
        SELECT m.id AS machine_id, COUNT(b.id) AS bookings
        FROM machines m
        LEFT JOIN bookings b ON b.machine_id = m.id
        GROUP BY m.id
        ORDER BY m.id
        "#,
    )
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    responses(
        (status = 200, description = "Every booking as CSV", content_type = "text/csv", body = String),
        (status = 500, description = "An internal server error occurred")
    )
)]
#[get("/api/reports/bookings.csv")]
pub async fn export_bookings(data: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = query_as::<_, BookingExportRow>(
        r#"
        SELECT
            b.id,
            u.name AS user_name,
            u.room_no AS user_room,
            u.phone AS user_phone,
            b.machine_id,
            b.date,
            b.time,
            b.status
        FROM bookings b
        LEFT JOIN users u ON b.user_id = u.id
        ORDER BY b.date, b.time, b.machine_id
        "#,
    )
    .fetch_all(&data.database)
    .await?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                "hostelwash_bookings_report.csv".to_string(),
            )],
        })
        .body(bookings_csv(&rows)))
}
