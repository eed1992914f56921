//! Asynchronous job submission and status polling.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::info;

use scenecast_models::JobId;

use crate::error::ApiResult;
use crate::handlers::upload::{base_url, read_render_request};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub status_url: String,
}

/// Body returned for an id the registry has never seen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobNotFoundResponse {
    pub job_id: String,
    pub status: &'static str,
}

/// Accept a storyboard for distributed rendering.
pub async fn submit_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let request = read_render_request(multipart).await?;
    let base = base_url(&headers);

    let handle = state.orchestrator.submit(request, &base).await?;
    let job_id = handle.job_id().to_string();
    info!(job_id = %job_id, "Job accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse {
            status_url: format!("{}/jobs/{}/status", base, job_id),
            job_id,
        }),
    ))
}

/// Current state of a job.
pub async fn job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    match state.orchestrator.status(&JobId::from_string(job_id.as_str())).await {
        Some(job) => Json(job).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(JobNotFoundResponse {
                job_id,
                status: "not_found",
            }),
        )
            .into_response(),
    }
}
