use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use gatekeeper_server::auth::handlers::{login, logout, me, refresh, register};
use gatekeeper_server::{health_check, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> gatekeeper_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!(
        "Starting server at {}:{}",
        config.server.host, config.server.port
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let workers = config.server.workers as usize;
    let cors_config = config.cors.clone();

    // Initialize application state
    let state = AppState::new(config).await?;
    let state = web::Data::new(state);

    // Start the rate-limit sweeper; stopped after the server exits
    let sweeper = state.rate_limiter.clone().start_sweeper();

    // Create and bind TCP listener
    let listener = TcpListener::bind(&bind_addr)?;

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if cors_config.enabled {
            let cors = if cors_config.allow_any_origin {
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
            } else {
                Cors::default()
                    .allowed_origin("http://localhost:8080")
                    .allowed_origin("http://127.0.0.1:8080")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
                    .supports_credentials()
            };
            cors.max_age(cors_config.max_age as usize)
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/me", web::get().to(me))
            .route("/logout", web::post().to(logout))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    sweeper.shutdown();
    info!("Server stopped");

    Ok(())
}
