use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use aha_server::{app_config, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> aha_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    // Load configuration; missing database or upstream credentials are
    // fatal before anything binds.
    let config = match Settings::new().map_err(AppError::from).and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("startup configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded successfully");

    // Initialize application state
    let state = match AppState::new(config.clone()).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(app_config)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
