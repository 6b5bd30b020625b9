use std::str::FromStr;

use log::info;
use sqlx::{
    query, query_as,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, Pool, Sqlite,
};

use crate::{error::ApiError, models::new_id, models::Role, password::hash_password};

const SCHEMA: [&str; 9] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        phone TEXT UNIQUE,
        email TEXT UNIQUE,
        room_no TEXT,
        course_name TEXT,
        department_name TEXT,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'student'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS machines (
        id TEXT PRIMARY KEY,
        model TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'available',
        last_maintenance TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        machine_id TEXT NOT NULL,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'upcoming',
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS bookings_machine_slot
    ON bookings (machine_id, date, time)
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS bookings_one_upcoming_per_user
    ON bookings (user_id)
    WHERE status = 'upcoming'
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id TEXT PRIMARY KEY,
        subject TEXT NOT NULL,
        message TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        media TEXT,
        media_type TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blocked_dates (
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL UNIQUE,
        reason TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        filename TEXT NOT NULL,
        filetype TEXT NOT NULL,
        data BLOB NOT NULL,
        uploaded_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Opens (and creates, if missing) the SQLite database behind `database_url`.
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new().connect_with(options).await
}

pub async fn create_schema(database: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        query(statement).execute(database).await?;
    }

    Ok(())
}

/// Creates the administrator account unless a user with `email` already
/// exists. Returns whether a user was inserted.
pub async fn seed_admin(
    database: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<bool, ApiError> {
    let existing = query_as::<_, (String,)>("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(database)
        .await?;

    if existing.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(password)?;

    query(
        r#"
        INSERT INTO users (id, name, role, email, password_hash)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_id("admin"))
    .bind("Admin")
    .bind(Role::Admin)
    .bind(email)
    .bind(password_hash)
    .execute(database)
    .await?;

    info!("Admin user {email} created");
    Ok(true)
}

pub async fn initialize(
    database: &Pool<Sqlite>,
    admin_email: &str,
    admin_password: &str,
) -> Result<(), ApiError> {
    create_schema(database).await?;
    seed_admin(database, admin_email, admin_password).await?;
    Ok(())
}

pub async fn is_user_present<'e, E>(executor: E, user_id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    query("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map(|row| row.is_some())
}

pub async fn is_machine_present<'e, E>(executor: E, machine_id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    query("SELECT id FROM machines WHERE id = ?")
        .bind(machine_id)
        .fetch_optional(executor)
        .await
        .map(|row| row.is_some())
}

pub async fn is_date_blocked<'e, E>(executor: E, date: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    query("SELECT id FROM blocked_dates WHERE date = ?")
        .bind(date)
        .fetch_optional(executor)
        .await
        .map(|row| row.is_some())
}
