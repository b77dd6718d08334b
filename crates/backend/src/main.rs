#![allow(clippy::unnecessary_map_or)]

pub mod api;
pub mod dashboards;
pub mod domain;
pub mod routes;
pub mod shared;
pub mod usecases;

use std::sync::Arc;

use shared::state::AppState;
use usecases::u508_import_from_agendor::{load_master_table, AgendorApiClient, RetryPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // Создаем директорию для логов
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join("backend.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    // Простой middleware для логирования запросов
    async fn request_logger(req: Request<Body>, next: Next) -> Response {
        use axum::body::to_bytes;

        let start = std::time::Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = next.run(req).await;

        let (parts, body) = response.into_parts();

        // Читаем тело ответа, чтобы узнать реальный размер
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(
                    "{:>5}ms | {:>8} | {} {:>6} {} (body error: {})",
                    start.elapsed().as_millis(),
                    "error",
                    parts.status.as_u16(),
                    method,
                    uri.path(),
                    e
                );
                return Response::from_parts(parts, Body::default());
            }
        };

        tracing::info!(
            "{:>5}ms | {:>8} | {} {:>6} {}",
            start.elapsed().as_millis(),
            bytes.len(),
            parts.status.as_u16(),
            method,
            uri.path()
        );

        // Создаем новый ответ с прочитанным телом
        Response::from_parts(parts, Body::from(bytes))
    }

    let config = shared::config::load_config().map_err(|e| {
        tracing::error!("Configuration error: {:#}", e);
        e
    })?;

    // Единственная загрузка сделок за время жизни процесса
    let client = AgendorApiClient::new(&config.agendor, RetryPolicy::from(&config.retry))?;
    let master = load_master_table(&client).await.map_err(|e| {
        tracing::error!("Startup load from Agendor failed: {:#}", e);
        e
    })?;

    let today = chrono::Local::now().date_naive();
    let state = Arc::new(AppState::build(master, config.dashboard.clone(), today));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(request_logger))
        .layer(cors);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
