use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use fractalglass::color::{PRESETS, Preset};
use fractalglass::config::{Params, ParamsPatch, SLIDERS, SliderRange};
use fractalglass::export;
use fractalglass::field::FieldVariant;
use fractalglass::render;
use fractalglass::surface::{LIVE_MAX_PIXEL_RATIO, Viewport};

type ApiError = (StatusCode, String);

#[derive(Clone, Default)]
struct AppState {
    params: Arc<RwLock<Params>>,
}

impl AppState {
    fn snapshot(&self) -> Params {
        self.params.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update(&self, f: impl FnOnce(&mut Params)) -> Params {
        let mut guard = self.params.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
        guard.clone()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest {
    width: Option<u32>,
    height: Option<u32>,
    device_pixel_ratio: Option<f64>,
    time: Option<f64>,
    /// Include ridge and field diagnostic layers.
    #[serde(default)]
    layers: bool,
    /// One-off overrides on top of the current parameters. Not persisted.
    #[serde(default)]
    params: ParamsPatch,
}

#[derive(Serialize)]
struct RenderResponse {
    layers: Vec<Layer>,
    timings: Vec<TimingEntry>,
    width: u32,
    height: u32,
    time: f64,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct Schema {
    sliders: &'static [SliderRange],
    variants: Vec<&'static str>,
    defaults: Params,
}

#[derive(Deserialize)]
struct ExportQuery {
    variant: Option<FieldVariant>,
}

fn internal(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

async fn get_params(State(state): State<AppState>) -> Json<Params> {
    Json(state.snapshot())
}

async fn patch_params(State(state): State<AppState>, Json(patch): Json<ParamsPatch>) -> Json<Params> {
    if patch.is_empty() {
        return Json(state.snapshot());
    }
    let params = state.update(|p| p.apply(&patch));
    info!("parameters updated: {}", serde_json::to_string(&patch).unwrap_or_default());
    Json(params)
}

async fn list_presets() -> Json<&'static [Preset]> {
    Json(&PRESETS)
}

async fn apply_preset(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Params>, ApiError> {
    let Some(preset) = Preset::find(&name) else {
        warn!("unknown preset {name:?}");
        return Err((StatusCode::NOT_FOUND, format!("unknown preset {name:?}")));
    };
    Ok(Json(state.update(|p| p.apply_preset(preset))))
}

async fn schema() -> Json<Schema> {
    Json(Schema {
        sliders: &SLIDERS,
        variants: FieldVariant::ALL.iter().map(|v| v.name()).collect(),
        defaults: Params::default(),
    })
}

async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    let params = state.snapshot();
    let variant = query.variant.unwrap_or(params.variant);
    let html = export::export_html_with(&params, variant);
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::EXPORT_FILENAME),
            ),
        ],
        html,
    )
}

async fn render_handler(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let mut params = state.snapshot();
    params.apply(&req.params);

    let viewport = Viewport::new(
        req.width.unwrap_or(800),
        req.height.unwrap_or(600),
        req.device_pixel_ratio.unwrap_or(1.0),
    );
    let surface = viewport.surface(LIVE_MAX_PIXEL_RATIO);
    let time = req.time.unwrap_or(0.0);
    let with_layers = req.layers;

    let response = tokio::task::spawn_blocking(move || -> fractalglass::Result<RenderResponse> {
        let (frame, timings) = fractalglass::generate(surface, time, &params);

        let mut layers = vec![Layer {
            name: "composite".into(),
            data_url: render::png_data_url(&frame.rgba, surface)?,
        }];
        if with_layers {
            layers.push(Layer {
                name: "ridge".into(),
                data_url: render::png_data_url(&render::render_scalar(&frame.ridge, -1.3, 1.3), surface)?,
            });
            layers.push(Layer {
                name: "field".into(),
                data_url: render::png_data_url(&render::render_scalar(&frame.field, 0.0, 1.0), surface)?,
            });
        }

        let timing_entries = timings
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect();

        Ok(RenderResponse {
            layers,
            timings: timing_entries,
            width: surface.width,
            height: surface.height,
            time,
        })
    })
    .await
    .map_err(internal)?
    .map_err(internal)?;

    Ok(Json(response))
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/params", get(get_params).patch(patch_params))
        .route("/api/presets", get(list_presets))
        .route("/api/preset/{name}", post(apply_preset))
        .route("/api/schema", get(schema))
        .route("/api/render", post(render_handler))
        .route("/api/export", get(export_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = app(AppState::default());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("fractalglass server at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
