use crate::adjacency::GeometricOracle;
use crate::config::AppConfig;
use crate::data;
use crate::geometry::BoundingBox;
use crate::index::RegionIndex;
use crate::report;
use crate::types::{ColorAssignment, Palette, Region, ValidationReport};
use crate::validate;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct Dataset {
    pub label: String,
    pub regions: Vec<Region>,
    pub index: RegionIndex,
}

impl Dataset {
    pub fn new(label: impl Into<String>, regions: Vec<Region>) -> Self {
        let index = RegionIndex::build(&regions);
        Self {
            label: label.into(),
            regions,
            index,
        }
    }
}

pub struct AppState {
    pub datasets: BTreeMap<String, Dataset>,
    pub palette: Palette,
    pub oracle: GeometricOracle,
}

impl AppState {
    pub fn load(config: &AppConfig) -> Result<Self> {
        let mut datasets = BTreeMap::new();
        for (name, dataset) in &config.datasets {
            let policy = dataset.identifier_policy()?;
            let regions = data::load_regions(&dataset.path, &policy)?;
            info!(dataset = %name, regions = regions.len(), "building spatial index");
            datasets.insert(name.clone(), Dataset::new(dataset.label.clone(), regions));
        }
        Ok(Self {
            datasets,
            palette: config.palette.clone(),
            oracle: GeometricOracle::new(config.adjacency.tolerance),
        })
    }

    fn dataset(&self, name: &str) -> Result<&Dataset, StatusCode> {
        self.datasets.get(name).ok_or(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    name: String,
    label: String,
    regions: usize,
}

#[derive(Debug, Serialize)]
pub struct RegionInfo {
    id: String,
    bbox: Option<BoundingBox>,
}

#[derive(Deserialize)]
pub struct LocateParams {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    #[serde(flatten)]
    report: ValidationReport,
    summary: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/datasets", get(datasets_handler))
        .route("/api/palette", get(palette_handler))
        .route("/api/:dataset/regions", get(regions_handler))
        .route("/api/:dataset/locate", get(locate_handler))
        .route("/api/:dataset/check", post(check_handler))
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = Arc::new(AppState::load(&config)?);

    let mut app = router(state).layer(CorsLayer::permissive());
    if let Some(dir) = &config.server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn datasets_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetInfo>> {
    Json(
        state
            .datasets
            .iter()
            .map(|(name, d)| DatasetInfo {
                name: name.clone(),
                label: d.label.clone(),
                regions: d.regions.len(),
            })
            .collect(),
    )
}

async fn palette_handler(State(state): State<Arc<AppState>>) -> Json<Palette> {
    Json(state.palette.clone())
}

async fn regions_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<RegionInfo>>, StatusCode> {
    let dataset = state.dataset(&name)?;
    Ok(Json(
        dataset
            .regions
            .iter()
            .enumerate()
            .map(|(i, r)| RegionInfo {
                id: r.id.clone(),
                bbox: dataset.index.bbox(i),
            })
            .collect(),
    ))
}

async fn locate_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<LocateParams>,
) -> Result<Json<Option<String>>, StatusCode> {
    let dataset = state.dataset(&name)?;
    let hit = dataset
        .index
        .locate(&dataset.regions, params.lon, params.lat)
        .map(|i| dataset.regions[i].id.clone());
    Ok(Json(hit))
}

async fn check_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(coloring): Json<ColorAssignment>,
) -> Result<Json<CheckResponse>, (StatusCode, String)> {
    let dataset = state
        .dataset(&name)
        .map_err(|status| (status, format!("unknown dataset '{}'", name)))?;

    if let Some((id, color)) = coloring.iter().find(|(_, c)| !state.palette.contains(*c)) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("color {} for '{}' is outside the palette", color, id),
        ));
    }

    let report = validate::validate_indexed(
        &dataset.regions,
        &coloring,
        &state.oracle,
        &dataset.index,
        state.oracle.tolerance(),
    );
    let summary = report::summary(&report, &dataset.label, report::DEFAULT_SHOWN_VIOLATIONS);

    Ok(Json(CheckResponse { report, summary }))
}
