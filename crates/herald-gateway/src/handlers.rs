// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the control plane.
//!
//! Bodies and responses use camelCase keys, matching the browser client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
};
use herald_campaign::Progress;
use herald_core::{HeraldError, ImageSource, SendUnit};
use herald_resolver::Table;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::server::AppState;

/// An image attached to outgoing messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImagePayload {
    /// `data:<mime>;base64,<payload>`, uploaded before sending.
    Inline {
        #[serde(rename = "dataUrl")]
        data_url: String,
    },
    /// Publicly reachable URL the channel fetches itself.
    Link { url: String },
}

impl ImagePayload {
    fn key(&self) -> &str {
        match self {
            Self::Inline { data_url } => data_url,
            Self::Link { url } => url,
        }
    }

    fn to_source(&self) -> Result<ImageSource, HeraldError> {
        match self {
            Self::Inline { data_url } => ImageSource::from_data_url(data_url),
            Self::Link { url } if url.starts_with("https://") || url.starts_with("http://") => {
                Ok(ImageSource::Link(url.clone()))
            }
            Self::Link { url } => Err(HeraldError::InvalidInput(format!(
                "image url must be http(s), got {url:?}"
            ))),
        }
    }
}

/// One pre-rendered message in `POST /send`.
#[derive(Debug, Deserialize)]
pub struct OutgoingMessage {
    pub to: String,
    pub text: String,
    #[serde(default)]
    pub image: Option<ImagePayload>,
}

/// Request body for `POST /send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub messages: Vec<OutgoingMessage>,
    #[serde(default)]
    pub delay_seconds: Option<i64>,
}

/// Request body for `POST /campaigns`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    #[serde(flatten)]
    pub table: Table,
    pub template: String,
    #[serde(default)]
    pub phone_column: Option<usize>,
    #[serde(default)]
    pub image: Option<ImagePayload>,
    #[serde(default)]
    pub delay_seconds: Option<i64>,
}

/// Request body for `POST /preview`.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub table: Table,
    pub template: String,
    #[serde(default)]
    pub row: usize,
}

/// Body of `POST /pause`, `/resume` and `/cancel`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobControl {
    pub job_id: String,
}

/// Query of `GET /progress` and `GET /progress/stream`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub logged_in: bool,
    pub jobs: usize,
    pub running: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

fn delay(requested: Option<i64>, state: &AppState) -> Duration {
    match requested {
        Some(secs) => Duration::from_secs(secs.max(0).unsigned_abs()),
        None => state.default_delay,
    }
}

/// POST /send
///
/// Starts a job from messages the client already rendered. Destinations are
/// normalized and rows without a destination or text are dropped.
pub async fn post_send(
    State(state): State<AppState>,
    Json(body): Json<SendRequest>,
) -> ApiResult<Json<JobCreated>> {
    // Messages sharing an image share one decoded copy.
    let mut images: HashMap<String, Arc<ImageSource>> = HashMap::new();
    let mut units = Vec::with_capacity(body.messages.len());
    for message in body.messages {
        let mut unit = SendUnit::new(message.to, message.text);
        if let Some(payload) = message.image {
            let image = match images.get(payload.key()) {
                Some(image) => Arc::clone(image),
                None => {
                    let image = Arc::new(payload.to_source()?);
                    images.insert(payload.key().to_string(), Arc::clone(&image));
                    image
                }
            };
            unit = unit.with_image(image);
        }
        units.push(unit);
    }

    let units = state.resolver.sanitize(units);
    let total = units.len();
    let id = state.service.start(units, delay(body.delay_seconds, &state))?;
    tracing::info!(job_id = %id, total, "send job accepted");
    Ok(Json(JobCreated {
        job_id: id.to_string(),
        total,
    }))
}

/// POST /campaigns
///
/// Resolves a contact table and template into units, then starts a job.
pub async fn post_campaign(
    State(state): State<AppState>,
    Json(body): Json<CampaignRequest>,
) -> ApiResult<Json<JobCreated>> {
    let image = body
        .image
        .as_ref()
        .map(ImagePayload::to_source)
        .transpose()?
        .map(Arc::new);

    let units = state
        .resolver
        .resolve(&body.table, &body.template, body.phone_column, image);
    let total = units.len();
    let id = state.service.start(units, delay(body.delay_seconds, &state))?;
    tracing::info!(job_id = %id, total, rows = body.table.row_count(), "campaign accepted");
    Ok(Json(JobCreated {
        job_id: id.to_string(),
        total,
    }))
}

/// POST /preview
pub async fn post_preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let text = state
        .resolver
        .preview(&body.table, &body.template, body.row)?;
    Ok(Json(PreviewResponse { text }))
}

/// GET /progress?jobId=
pub async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Json<Progress>> {
    Ok(Json(state.service.progress(&query.job_id)?))
}

/// POST /pause
pub async fn post_pause(
    State(state): State<AppState>,
    Json(body): Json<JobControl>,
) -> ApiResult<Json<Ack>> {
    state.service.pause(&body.job_id)?;
    Ok(Json(Ack { ok: true }))
}

/// POST /resume
pub async fn post_resume(
    State(state): State<AppState>,
    Json(body): Json<JobControl>,
) -> ApiResult<Json<Ack>> {
    state.service.resume(&body.job_id)?;
    Ok(Json(Ack { ok: true }))
}

/// POST /cancel
pub async fn post_cancel(
    State(state): State<AppState>,
    Json(body): Json<JobControl>,
) -> ApiResult<Json<Ack>> {
    state.service.cancel(&body.job_id)?;
    Ok(Json(Ack { ok: true }))
}

/// GET /status
///
/// Channel session state plus job counts. A failed session lookup reads as
/// logged out.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let logged_in = match state.service.engine().channel().session_status().await {
        Ok(status) => status.logged_in,
        Err(e) => {
            tracing::warn!(error = %e, "session status lookup failed");
            false
        }
    };
    let summary = state.service.summary();
    Json(StatusResponse {
        logged_in,
        jobs: summary.jobs,
        running: summary.running,
    })
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}
