//! Local HTTP surface.
//!
//! Handlers only read snapshots or write display state; none of them wait
//! on the vision thread. Request bodies are decoded leniently: anything
//! that is not valid JSON for the route falls back to the defaults.

use crate::display::button::ButtonSender;
use crate::display::{DisplayMode, ProgressLevel, SharedDisplay};
use crate::heart_meter::SharedMeter;
use crate::status::{SharedStatus, StatusResponse};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use log::{debug, info};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::net::SocketAddr;

/// Handles shared with every request
#[derive(Clone)]
pub struct AppState {
    pub status: SharedStatus,
    pub display: SharedDisplay,
    pub meter: SharedMeter,
    pub buttons: ButtonSender,
}

/// Body of `POST /display/text`
#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

/// Body of `POST /display/progress`
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    #[serde(default = "default_image_id")]
    pub image_id: String,
}

impl Default for ProgressRequest {
    fn default() -> Self {
        Self {
            image_id: default_image_id(),
        }
    }
}

fn default_image_id() -> String {
    "progress_0".to_string()
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct MoodResponse {
    pub level: u8,
    pub min: u8,
    pub max: u8,
    pub mode: DisplayMode,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/display/text", post(set_text))
        .route("/display/progress", post(set_progress))
        .route("/display/toggle", post(toggle_mode))
        .route("/mood", get(get_mood))
        .route("/health", get(get_health))
        .with_state(state)
}

/// Serve `state` on `addr` until the process exits
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

/// Decode `body` as `T`, falling back to `T::default()` on any error
fn lenient<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Ignoring malformed request body: {e}");
        T::default()
    })
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::from(&state.status.snapshot()))
}

async fn set_text(State(state): State<AppState>, body: Bytes) -> Json<OkResponse> {
    let request: TextRequest = lenient(&body);
    state.display.set_text(&request.text);
    Json(OkResponse { ok: true })
}

async fn set_progress(State(state): State<AppState>, body: Bytes) -> Json<OkResponse> {
    let request: ProgressRequest = lenient(&body);
    let level = ProgressLevel::from_image_id(&request.image_id);
    debug!("Progress request {:?} -> {}%", request.image_id, level.percent());
    state.display.set_progress(level);
    Json(OkResponse { ok: true })
}

async fn toggle_mode(State(state): State<AppState>) -> Json<OkResponse> {
    state.buttons.press();
    Json(OkResponse { ok: true })
}

async fn get_mood(State(state): State<AppState>) -> Json<MoodResponse> {
    let (level, min, max) = {
        let meter = state.meter.lock();
        (meter.level(), meter.settings().min_level, meter.settings().max_level)
    };
    Json(MoodResponse {
        level,
        min,
        max,
        mode: state.display.mode(),
    })
}

async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
