#![cfg(feature = "web")]
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::Query;
use log::{error, info, warn};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::aggregate;
use crate::cleaning::clean;
use crate::config::Config;
use crate::dashboard::{ReportOptions, build_report};
use crate::error::{DashboardError, Result};
use crate::export::{self, CSV_FILE_NAME, XLSX_FILE_NAME};
use crate::filter::FilterPanel;
use crate::loader;
use crate::render::Renderer;
use crate::table::OrderTable;

/// Id under which the `--data` file is served.
pub const LOCAL_DATASET: &str = "local";

/// A cleaned table together with the file name it came from.
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub table: OrderTable,
}

#[derive(Default)]
struct StoreInner {
    tables: HashMap<String, Arc<Dataset>>,
    order: VecDeque<String>,
}

/// In-memory datasets keyed by id, oldest upload evicted first.
pub struct DatasetStore {
    capacity: usize,
    inner: RwLock<StoreInner>,
    local_path: Option<PathBuf>,
    local: OnceLock<Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new(capacity: usize, local_path: Option<PathBuf>) -> Self {
        DatasetStore {
            capacity: capacity.max(1),
            inner: RwLock::new(StoreInner::default()),
            local_path,
            local: OnceLock::new(),
        }
    }

    /// Store a cleaned upload and return its new id.
    pub fn insert(&self, name: String, table: OrderTable) -> String {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.tables.remove(&oldest);
                info!("evicted dataset {}", oldest);
            }
        }

        inner.order.push_back(id.clone());
        inner
            .tables
            .insert(id.clone(), Arc::new(Dataset { name, table }));
        id
    }

    /// Look up a dataset; `local` loads the configured file on first use.
    pub fn get(&self, id: &str) -> Result<Arc<Dataset>> {
        if id == LOCAL_DATASET {
            if let Some(path) = &self.local_path {
                return self.local(path);
            }
        }

        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .tables
            .get(id)
            .cloned()
            .ok_or_else(|| DashboardError::UnknownDataset(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn local(&self, path: &std::path::Path) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.local.get() {
            return Ok(dataset.clone());
        }

        let table = clean(loader::load_table(path)?);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let loaded = Arc::new(Dataset { name, table });
        Ok(self.local.get_or_init(|| loaded).clone())
    }
}

pub struct AppState {
    config: Config,
    renderer: Renderer,
    datasets: DatasetStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(AppState {
            renderer: Renderer::new()?,
            datasets: DatasetStore::new(config.max_datasets, config.data_path.clone()),
            config,
        })
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.config.top_n,
            ..ReportOptions::default()
        }
    }

    /// Render `err` on the error page with a status matching its cause.
    fn error_response(&self, err: DashboardError) -> Response {
        let status = status_for(&err);
        if status.is_server_error() {
            error!("{}", err);
        } else {
            warn!("{}", err);
        }

        match self.renderer.error_page(&err.to_string()) {
            Ok(page) => (status, Html(page)).into_response(),
            Err(render_err) => {
                error!("{}", render_err);
                (status, err.to_string()).into_response()
            }
        }
    }
}

fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::UnknownDataset(_) => StatusCode::NOT_FOUND,
        e if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Filter widgets as they arrive in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    payment_status: Vec<String>,
    #[serde(default)]
    order_status: Vec<String>,
    #[serde(default)]
    product_type: Vec<String>,
    #[serde(default)]
    order_source: Vec<String>,
}

impl FilterQuery {
    pub fn into_panel(self) -> Result<FilterPanel> {
        let keep = |values: Vec<String>| -> Vec<String> {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        };
        Ok(FilterPanel {
            start_date: FilterPanel::parse_bound("start", self.start.as_deref())?,
            end_date: FilterPanel::parse_bound("end", self.end.as_deref())?,
            payment_status: keep(self.payment_status),
            order_status: keep(self.order_status),
            product_type: keep(self.product_type),
            order_source: keep(self.order_source),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/health", get(health))
        .route("/dashboard/:id", get(dashboard))
        .route("/dashboard/:id/export.csv", get(export_csv))
        .route("/dashboard/:id/export.xlsx", get(export_xlsx))
        .route("/dashboard/:id/summary.json", get(summary_json))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .with_state(state)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr;
    if let Some(path) = &config.data_path {
        info!("serving local dataset from {}", path.display());
    }

    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    if state.config.data_path.is_some() {
        return Redirect::to(&format!("/dashboard/{}", LOCAL_DATASET)).into_response();
    }

    match state.renderer.upload_page(state.config.max_upload_bytes) {
        Ok(page) => Html(page).into_response(),
        Err(e) => state.error_response(e),
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match receive_upload(&state, multipart).await {
        Ok(id) => Redirect::to(&format!("/dashboard/{}", id)).into_response(),
        Err(e) => state.error_response(e),
    }
}

async fn receive_upload(state: &AppState, mut multipart: Multipart) -> Result<String> {
    let upload_error = |e: axum::extract::multipart::MultipartError| {
        DashboardError::Upload(e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        loader::check_upload_name(&name)?;
        let bytes = field.bytes().await.map_err(upload_error)?;

        let table = clean(loader::from_bytes(&bytes)?);
        info!(
            "uploaded {} ({} bytes, {} rows, {} columns)",
            name,
            bytes.len(),
            table.len(),
            table.headers().len()
        );
        return Ok(state.datasets.insert(name, table));
    }

    Err(DashboardError::Upload("no file was sent".to_string()))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let page = (|| {
        let dataset = state.datasets.get(&id)?;
        let panel = query.into_panel()?;
        let report = build_report(&dataset.table, &panel, &state.report_options());
        state
            .renderer
            .dashboard_page(&id, &dataset.name, &report, &state.config.currency)
    })();

    match page {
        Ok(page) => Html(page).into_response(),
        Err(e) => state.error_response(e),
    }
}

/// The dataset narrowed by the query's filters.
fn filtered(state: &AppState, id: &str, query: FilterQuery) -> Result<OrderTable> {
    let dataset = state.datasets.get(id)?;
    let panel = query.into_panel()?;
    Ok(panel.apply(&dataset.table))
}

fn attachment(content_type: &str, file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        bytes,
    )
        .into_response()
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Response {
    match filtered(&state, &id, query).and_then(|table| export::to_csv(&table)) {
        Ok(bytes) => {
            info!("exported {} bytes of CSV from {}", bytes.len(), id);
            attachment("text/csv; charset=utf-8", CSV_FILE_NAME, bytes)
        }
        Err(e) => state.error_response(e),
    }
}

async fn export_xlsx(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Response {
    match filtered(&state, &id, query).and_then(|table| export::to_xlsx(&table)) {
        Ok(bytes) => {
            info!("exported {} bytes of XLSX from {}", bytes.len(), id);
            attachment(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                XLSX_FILE_NAME,
                bytes,
            )
        }
        Err(e) => state.error_response(e),
    }
}

/// Headline metrics for the filtered rows, for scripts polling the dashboard.
async fn summary_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let summary = (|| -> Result<serde_json::Value> {
        let dataset = state.datasets.get(&id)?;
        let panel = query.into_panel()?;
        let filtered = panel.apply(&dataset.table);
        Ok(serde_json::json!({
            "dataset": dataset.name,
            "total_rows": dataset.table.len(),
            "filtered_rows": filtered.len(),
            "filters": panel,
            "summary": aggregate::summarize(&filtered),
        }))
    })();

    match summary {
        Ok(value) => Json(value).into_response(),
        Err(e) => state.error_response(e),
    }
}
