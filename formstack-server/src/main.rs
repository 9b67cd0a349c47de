use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::{Arg, Command};
use formstack_server::config::{AppConfig, CorsConfig};
use formstack_server::database::Database;
use formstack_server::error::AppResult;
use formstack_server::handlers::AppState;
use formstack_server::routes::configure_routes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> AppResult<()> {
    // Parse command line arguments
    let matches = Command::new("formstack-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("formstack - form templates, submissions and integrations API")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file")
                .value_name("FILE"),
        )
        .get_matches();
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);

    // Load configuration first so `logging.level` applies to the subscriber
    let mut config = AppConfig::load(config_path.as_deref())?;

    // Initialize logging
    let default_directive = format!("formstack_server={}", config.logging.level);
    let filter = match default_directive.parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Starting formstack server");
    match &config_path {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::info!("Loaded configuration from defaults and environment"),
    }
    config.ensure_jwt_secret();

    // Initialize database
    let database = Arc::new(Database::new(&config.database.path)?);
    tracing::info!("Database initialized at {:?}", config.database.path);

    let config = Arc::new(config);
    let app_state = web::Data::new(AppState::new(database, Arc::clone(&config))?);
    if app_state.jira.is_some() {
        tracing::info!("Jira integration enabled");
    }
    if app_state.salesforce.is_some() {
        tracing::info!("Salesforce integration enabled");
    }

    // Start HTTP server
    let server_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting HTTP server on {}", server_addr);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(cors(&cors_config))
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&server_addr)?
    .run()
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn cors(config: &CorsConfig) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    match &config.allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors,
    }
}
