use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};
use hostelwash_api::{config::Config, cors_headers, database, fallback, models::AppState};
use log::{error, info, LevelFilter};

fn initalize_syslog(log_level: LevelFilter) {
    let log_result = syslog::init(syslog::Facility::LOG_SYSLOG, log_level, None);
    if log_result.is_err() {
        eprintln!("WARNING! Failed to initialize logging system! Server logs will be unavaliable!");
    }
}

fn fail(message: String) -> ! {
    error!("{message}");
    eprintln!("{message}");
    panic!("{message}");
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ERROR: {err}");
            panic!("{err}");
        }
    };

    initalize_syslog(config.log_level);

    let pool = match database::connect(&config.database_url).await {
        Ok(pool) => {
            info!("Connected to the database");
            pool
        }
        Err(err) => fail(format!("ERROR: Failed to connect to the database: {err}")),
    };

    if let Err(err) =
        database::initialize(&pool, &config.admin_email, &config.admin_password).await
    {
        fail(format!("ERROR: Failed to initialize the database: {err:?}"));
    }

    let state = AppState { database: pool };

    info!(
        "HostelWash API listening on http://{}:{}",
        config.bind_address, config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors_headers())
            .wrap(Logger::default())
            .configure(hostelwash_api::configure)
            .default_service(web::to(fallback))
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
