pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{Next, from_fn},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Log one line per request with its status and latency
async fn request_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    if status >= 500 {
        tracing::warn!(%method, %path, status, latency_ms, "request");
    } else {
        tracing::info!(%method, %path, status, latency_ms, "request");
    }
    response
}

/// Build the full router: API, docs, metrics
pub fn build_router(state: Arc<AppState>) -> Router {
    let transfer_routes = Router::new()
        .route("/", post(handlers::create_transfer))
        .route("/{id}", get(handlers::get_transfer))
        .route("/{id}/accept", post(handlers::accept_transfer))
        .route("/{id}/complete", post(handlers::complete_transfer));

    let temperature_routes = Router::new().route("/", post(handlers::ingest_temperatures));

    // Dev flush routes: only compiled with the `dev-api` feature.
    // Production builds use `--no-default-features` to exclude them.
    #[cfg(feature = "dev-api")]
    let temperature_routes =
        temperature_routes.route("/dev/flush-outbox", post(handlers::flush_outbox));

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/alerts", get(handlers::list_alerts))
        .nest("/transfers", transfer_routes)
        .nest("/temperatures", temperature_routes);

    #[cfg(feature = "dev-api")]
    let api = api.route("/dev/flush-outbox", post(handlers::flush_outbox));

    Router::new()
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(from_fn(request_log_middleware))
}

/// Bind and serve until the listener fails
pub async fn run_server(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {} (port in use?)", addr, e))?;

    serve(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, storage = state.store.name(), "Gateway listening");
    println!("🚀 Gateway listening on http://{}", addr);
    println!("📖 API Docs: http://{}/docs", addr);
    println!("📈 Metrics:  http://{}/metrics", addr);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
