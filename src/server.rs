use crate::chart::FrequencyTable;
use crate::config::AppConfig;
use crate::controls::{ControlParams, RenderContext};
use crate::dashboard::{self, Dashboard};
use crate::error::FetchError;
use crate::render;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub struct AppState {
    pub config: AppConfig,
    pub client: Client,
}

#[derive(Deserialize)]
pub struct FrequencyParams {
    variable: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/points", get(points_handler))
        .route("/api/frequency", get(frequency_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let port = config.server.port;
    let client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let state = Arc::new(AppState { config, client });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn run_pipeline(
    state: &AppState,
    params: &ControlParams,
) -> Result<Dashboard, Response> {
    let ctx = RenderContext::resolve(params, &state.config.chart)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;
    dashboard::build(&state.config, &state.client, &ctx)
        .await
        .map_err(|e| fetch_failure(&state.config, &e))
}

fn fetch_failure(config: &AppConfig, err: &FetchError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Html(render::failure_page(&config.dashboard, err)),
    )
        .into_response()
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ControlParams>,
) -> Response {
    match run_pipeline(&state, &params).await {
        Ok(dashboard) => Html(render::dashboard_page(&state.config.dashboard, &dashboard)).into_response(),
        Err(response) => response,
    }
}

async fn points_handler(State(state): State<Arc<AppState>>) -> Response {
    match run_pipeline(&state, &ControlParams::default()).await {
        Ok(dashboard) => Json(dashboard.map.layer.features).into_response(),
        Err(response) => response,
    }
}

async fn frequency_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FrequencyParams>,
) -> Response {
    if state.config.chart.variables().is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "this dashboard has no value-count chart" })),
        )
            .into_response();
    }

    let controls = ControlParams {
        variable: params.variable,
        ..Default::default()
    };
    let dashboard = match run_pipeline(&state, &controls).await {
        Ok(dashboard) => dashboard,
        Err(response) => return response,
    };

    let column = dashboard.context.chart_variable.unwrap_or_default();
    match FrequencyTable::compute(&dashboard.points, &column) {
        Ok(table) => Json(table).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}
