use std::net::SocketAddr;

use axum::middleware;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use booking_marketplace::{
    config::Config,
    db,
    entities::user::{self, UserRole},
    middleware::rate_limit::{create_global_governor, log_request},
    routes,
    utils::password::hash_password,
    AppError, AppResult, AppState, FileStore,
};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_marketplace=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set, using the development default");
    }
    tracing::info!("Starting server at {}", config.server_addr());

    let db = db::connect(&config).await?;
    tracing::info!("Connected to database");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Migrations complete");

    seed_admin(&db, &config).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let storage = FileStore::new(&config.upload_dir, &config.public_base_url);

    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        storage,
    };

    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor())
        .layer(middleware::from_fn(log_request));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| AppError::Internal(format!("Invalid server address: {}", e)))?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Seed the admin account if it doesn't exist
async fn seed_admin(db: &DatabaseConnection, config: &Config) -> AppResult<()> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(config.admin_email.as_str()))
        .one(db)
        .await?;

    if existing.is_none() {
        let admin = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(config.admin_email.clone()),
            password_hash: Set(hash_password(&config.admin_password)?),
            name: Set("Admin".to_string()),
            role: Set(UserRole::Admin),
            ..Default::default()
        };

        admin.insert(db).await?;
        tracing::info!("Admin account created: {}", config.admin_email);
    }

    Ok(())
}
