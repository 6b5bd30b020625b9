#![allow(dead_code)]

use std::str::FromStr;

use hostelwash_api::{
    database,
    models::{new_id, BookingStatus, MachineStatus, Role},
    password::hash_password,
};
use sqlx::{
    query, query_scalar,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@hostel.com";
pub const ADMIN_PASSWORD: &str = "password";

/// Builds the full application around `$pool` and returns the initialized
/// test service.
macro_rules! spawn_app {
    ($pool:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(
                    hostelwash_api::models::AppState { database: $pool },
                ))
                .wrap(hostelwash_api::cors_headers())
                .configure(hostelwash_api::configure)
                .default_service(actix_web::web::to(hostelwash_api::fallback)),
        )
        .await
    };
}

/// A private in-memory database. A single connection keeps every query on
/// the same memory database.
pub async fn test_pool() -> Pool<Sqlite> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    database::initialize(&pool, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    pool
}

/// A database file in a fresh temporary directory, for tests that need
/// several connections writing at once. Keep the directory alive for as long
/// as the pool is used.
pub async fn file_pool() -> (TempDir, Pool<Sqlite>) {
    let directory = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", directory.path().join("hostelwash.db").display());
    let pool = database::connect(&url).await.unwrap();

    database::initialize(&pool, ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap();
    (directory, pool)
}

pub async fn insert_student(pool: &Pool<Sqlite>, name: &str, phone: &str, password: &str) -> String {
    let id = new_id("user");
    query("INSERT INTO users (id, name, phone, room_no, password_hash, role) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(phone)
        .bind("B-204")
        .bind(hash_password(password).unwrap())
        .bind(Role::Student)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn insert_machine(pool: &Pool<Sqlite>, machine_id: &str, status: MachineStatus) {
    query("INSERT INTO machines (id, model, status, last_maintenance) VALUES (?, ?, ?, ?)")
        .bind(machine_id)
        .bind("LG FH4U2")
        .bind(status)
        .bind("2024-01-15")
        .execute(pool)
        .await
        .unwrap();
}

pub async fn insert_booking(
    pool: &Pool<Sqlite>,
    user_id: &str,
    machine_id: &str,
    date: &str,
    time: &str,
    status: BookingStatus,
) -> String {
    let id = new_id("book");
    query("INSERT INTO bookings (id, user_id, machine_id, date, time, status) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(user_id)
        .bind(machine_id)
        .bind(date)
        .bind(time)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn count_bookings_on(pool: &Pool<Sqlite>, date: &str) -> i64 {
    query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE date = ?")
        .bind(date)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn password_hash_of(pool: &Pool<Sqlite>, user_id: &str) -> String {
    query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
