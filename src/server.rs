use crate::config::AppConfig;
use crate::dashboard::{render_page, run_pipeline, ChartOutput, DashboardView};
use crate::data::DatasetCache;
use crate::filter::{distinct_types, filter_by_type};
use crate::normalize::{normalize_countries, GeoBoundary};
use crate::types::{FilterSelection, PlotBackend, PopulationDisplay, TypeFilter, VolcanoRecord};
use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct AppState {
    pub config: AppConfig,
    pub boundary: GeoBoundary,
    pub cache: Mutex<DatasetCache>,
}

impl AppState {
    fn run(&self, selection: &FilterSelection) -> Result<DashboardView> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("Dataset cache lock poisoned"))?;
        run_pipeline(&mut cache, &self.boundary, &self.config, selection)
    }

    fn working_dataset(&self) -> Result<Vec<VolcanoRecord>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("Dataset cache lock poisoned"))?;
        let raw = cache
            .get_or_load(&self.config.input.data_csv)
            .context("Failed to load volcano data")?;
        Ok(normalize_countries(&raw))
    }
}

/// Control values as submitted by the dashboard form.
#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    #[serde(rename = "type")]
    volcano_type: Option<String>,
    population: Option<PopulationDisplay>,
    backend: Option<PlotBackend>,
    show_data: Option<String>,
}

impl From<DashboardQuery> for FilterSelection {
    fn from(query: DashboardQuery) -> Self {
        FilterSelection {
            type_filter: query
                .volcano_type
                .as_deref()
                .map(TypeFilter::from)
                .unwrap_or_default(),
            population: query.population.unwrap_or_default(),
            backend: query.backend.unwrap_or_default(),
            show_data: matches!(query.show_data.as_deref(), Some("on" | "true" | "1")),
        }
    }
}

/// Error surfaced to the browser as a 500 with the full cause chain.
pub struct AppError(anyhow::Error);

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/types", get(types_handler))
        .route("/api/volcanoes", get(volcanoes_handler))
        .route("/charts/static.svg", get(static_chart_handler))
        .route("/charts/interactive.json", get(interactive_chart_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState) -> Result<()> {
    let port = state.config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let app = router(Arc::new(state));

    info!("Starting dashboard on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    let view = state.run(&FilterSelection::from(query))?;
    Ok(Html(render_page(&view)?))
}

async fn types_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, AppError> {
    let working = state.working_dataset()?;
    Ok(Json(distinct_types(&working)))
}

async fn volcanoes_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<VolcanoRecord>>, AppError> {
    let selection = FilterSelection::from(query);
    let working = state.working_dataset()?;
    let subset = filter_by_type(&working, &selection.type_filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(subset))
}

async fn static_chart_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let selection = FilterSelection {
        backend: PlotBackend::Matplotlib,
        ..FilterSelection::from(query)
    };
    match state.run(&selection)?.chart {
        ChartOutput::Static(chart) => {
            Ok(([(header::CONTENT_TYPE, "image/svg+xml")], chart.svg).into_response())
        }
        ChartOutput::Interactive(_) => Err(anyhow!("Static backend produced an interactive chart").into()),
    }
}

async fn interactive_chart_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let selection = FilterSelection {
        backend: PlotBackend::Plotly,
        ..FilterSelection::from(query)
    };
    match state.run(&selection)?.chart {
        ChartOutput::Interactive(figure) => Ok(Json(figure).into_response()),
        ChartOutput::Static(_) => Err(anyhow!("Interactive backend produced a static chart").into()),
    }
}
