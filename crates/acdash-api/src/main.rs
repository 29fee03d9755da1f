//! AC 서비스 대시보드 API 서버 진입점.

use std::sync::Arc;
use std::time::Duration;

use acdash_api::error::panic_response;
use acdash_api::openapi::swagger_ui_router;
use acdash_api::{create_api_router, seed, AppState, MemoryStore, PgStore, Store, TokenCodec};
use acdash_core::{init_logging, AppConfig, LogConfig};
use anyhow::Context;
use axum::{http::StatusCode, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env는 없어도 됨
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting AC dashboard API server..."
    );

    let store = connect_store(&config).await?;

    if config.seed.enabled {
        seed::run(store.as_ref(), &config.seed)
            .await
            .context("failed to seed initial data")?;
    }

    let tokens = Arc::new(TokenCodec::new(&config.jwt));
    let state = Arc::new(AppState::new(store, tokens));
    let app = build_app(state, &config);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

/// `database.url`이 있으면 PostgreSQL, 없으면 인메모리 저장소를 사용합니다.
async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.database.url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            let store = PgStore::connect(url, &config.database)
                .await
                .context("failed to connect to database")?;
            info!(max_connections = config.database.max_connections, "Connected to PostgreSQL");

            if config.database.run_migrations {
                store.migrate().await.context("failed to run migrations")?;
                info!("Database migration completed successfully");
            }
            Ok(Arc::new(store))
        }
        None => {
            warn!("database.url not set, using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// 라우터와 미들웨어 조합.
fn build_app(state: Arc<AppState>, config: &AppConfig) -> Router {
    create_api_router(state)
        .merge(swagger_ui_router())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config.server.cors_origins))
}

/// CORS 레이어 생성.
///
/// `server.cors_origins`: 쉼표로 구분된 허용 origin 목록. 비어 있으면 전체 허용.
fn cors_layer(origins: &str) -> CorsLayer {
    let parsed: Vec<_> = origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let allow_origin = if parsed.is_empty() {
        if !origins.trim().is_empty() {
            warn!("server.cors_origins contains no valid origins, allowing any");
        }
        AllowOrigin::any()
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
