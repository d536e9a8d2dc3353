//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use polars::prelude::DataFrame;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{Result, ServerError};
use super::state::AppState;
use crate::edibility::{self, decision_list, rules::DEFAULT_VERDICT};
use crate::pipeline::EvaluationRequest;

// ============================================================================
// System
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs(),
    }))
}

// ============================================================================
// Rule-based checker
// ============================================================================

pub async fn list_rules() -> Json<serde_json::Value> {
    let rules: Vec<serde_json::Value> = decision_list()
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            json!({
                "position": i + 1,
                "id": rule.id,
                "description": rule.description,
                "verdict": rule.verdict,
            })
        })
        .collect();

    Json(json!({
        "rules": rules,
        "default_verdict": DEFAULT_VERDICT,
    }))
}

/// Six attribute tokens, as dataset codes or labels
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub odor: String,
    pub bruises: String,
    pub gill_color: String,
    pub cap_shape: String,
    pub cap_surface: String,
    pub cap_color: String,
}

pub async fn classify(Json(request): Json<ClassifyRequest>) -> Result<Json<serde_json::Value>> {
    let result = edibility::classify_codes(
        &request.odor,
        &request.bruises,
        &request.gill_color,
        &request.cap_shape,
        &request.cap_surface,
        &request.cap_color,
    )?;

    Ok(Json(json!({
        "verdict": result.verdict,
        "decided_by": result.decided_by,
        "fallback": result.is_fallback(),
    })))
}

// ============================================================================
// Dataset pipeline
// ============================================================================

/// Multipart body: the table under `file`, optional JSON under `request`
struct Upload {
    df: DataFrame,
    file_name: String,
    request: Option<EvaluationRequest>,
}

async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<Upload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut request = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                info!(file = %file_name, bytes = data.len(), "Received upload");
                file = Some((file_name, data.to_vec()));
            }
            "request" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                request = Some(serde_json::from_str::<EvaluationRequest>(&text)?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ServerError::BadRequest("missing multipart field 'file'".to_string()))?;
    let df = state.loader.load_bytes(&bytes, &file_name)?;

    Ok(Upload {
        df,
        file_name,
        request,
    })
}

pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let upload = read_upload(&state, multipart).await?;
    let request = upload.request.unwrap_or_default();
    let file_name = upload.file_name;

    let worker = Arc::clone(&state);
    let (report, annotated_csv) = tokio::task::spawn_blocking(move || {
        let report = worker.pipeline.run(&upload.df, &request)?;
        let csv = report.annotated_csv()?;
        Ok::<_, crate::error::LabError>((report, csv))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    info!(file = %file_name, run_id = %report.run_id, family = %report.family, "Evaluation served");

    Ok(Json(json!({
        "success": true,
        "file": file_name,
        "report": report,
        "annotated_csv": annotated_csv,
    })))
}

pub async fn compare(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let upload = read_upload(&state, multipart).await?;
    let file_name = upload.file_name;

    let worker = Arc::clone(&state);
    let comparison = tokio::task::spawn_blocking(move || worker.pipeline.compare(&upload.df))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(json!({
        "success": true,
        "file": file_name,
        "comparison": comparison,
    })))
}
