//! Axum route handlers for the Screening API.

use std::convert::Infallible;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::batch::{AnalysisRequest, BatchRunner, FileError, Progress, ResumeFile};
use crate::screening::report::{build_report, ReportRow, ReportTable, REPORT_FILENAME, REPORT_MIME};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

const FIELD_API_KEY: &str = "api_key";
const FIELD_JOB_DESCRIPTION: &str = "job_description";
const FIELD_RESUMES: &str = "resumes";

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub files_total: usize,
    /// Ranked candidates, best match first.
    pub rows: Vec<ReportRow>,
    /// Files that produced no row, and why.
    pub errors: Vec<FileError>,
    pub report_filename: &'static str,
}

struct ScreeningOutcome {
    run_id: Uuid,
    files_total: usize,
    table: ReportTable,
    errors: Vec<FileError>,
}

impl From<ScreeningOutcome> for ScreeningResponse {
    fn from(outcome: ScreeningOutcome) -> Self {
        ScreeningResponse {
            run_id: outcome.run_id,
            generated_at: Utc::now(),
            files_total: outcome.files_total,
            rows: outcome.table.into_rows(),
            errors: outcome.errors,
            report_filename: REPORT_FILENAME,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screenings
///
/// Runs the whole batch and returns the ranked table as JSON.
pub async fn handle_screen(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let request = read_analysis_request(multipart, state.config.openai_api_key.as_deref()).await?;
    let outcome = run_screening(&state.runner, &request, &mut |_: Progress| {}).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/screenings/report.csv
///
/// Same run as `handle_screen`, answered with the CSV download.
pub async fn handle_screen_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let request = read_analysis_request(multipart, state.config.openai_api_key.as_deref()).await?;
    let outcome = run_screening(&state.runner, &request, &mut |_: Progress| {}).await?;
    let csv = outcome.table.to_csv()?;

    Ok((
        [
            (header::CONTENT_TYPE, format!("{REPORT_MIME}; charset=utf-8")),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILENAME}\""),
            ),
        ],
        csv,
    ))
}

/// POST /api/v1/screenings/stream
///
/// Server-Sent Events: one `progress` event per processed file, then a single
/// `result` or `error` event. Preconditions are checked before the stream opens
/// so they come back as ordinary HTTP errors.
pub async fn handle_screen_stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let request = read_analysis_request(multipart, state.config.openai_api_key.as_deref()).await?;
    request.validate()?;

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let runner = state.runner.clone();

    tokio::spawn(async move {
        let progress_tx = tx.clone();
        // A closed receiver means the client went away; the run still completes.
        let mut on_progress = move |progress: Progress| {
            let _ = progress_tx.send(json_event("progress", &progress));
        };

        let final_event = match run_screening(&runner, &request, &mut on_progress).await {
            Ok(outcome) => json_event("result", &ScreeningResponse::from(outcome)),
            Err(err) => json_event("error", &err.body()["error"]),
        };
        let _ = tx.send(final_event);
    });

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok::<_, Infallible>(event), rx))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn run_screening(
    runner: &BatchRunner,
    request: &AnalysisRequest,
    on_progress: &mut (dyn FnMut(Progress) + Send),
) -> Result<ScreeningOutcome, AppError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, files = request.files.len(), "Starting screening run");

    let result = runner.run(request, on_progress).await?;
    if result.records.is_empty() {
        return Err(AppError::NoResults(result.errors));
    }

    let table = build_report(&result.records)?;
    info!(%run_id, rows = table.len(), skipped = result.errors.len(), "Screening run complete");

    Ok(ScreeningOutcome {
        run_id,
        files_total: request.files.len(),
        table,
        errors: result.errors,
    })
}

/// Collects the multipart form into an `AnalysisRequest`. Validation of the
/// preconditions is left to the batch runner.
async fn read_analysis_request(
    mut multipart: Multipart,
    fallback_key: Option<&str>,
) -> Result<AnalysisRequest, AppError> {
    let mut credential = String::new();
    let mut job_description = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_API_KEY => credential = field.text().await?.trim().to_string(),
            FIELD_JOB_DESCRIPTION => job_description = field.text().await?,
            FIELD_RESUMES => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let content: Bytes = field.bytes().await?;

                // Browsers send an empty, unnamed part when no file was picked.
                if filename.is_empty() && content.is_empty() {
                    continue;
                }
                if !is_pdf(&filename, content_type.as_deref()) {
                    return Err(AppError::Validation(format!(
                        "Only PDF resumes are accepted: {filename}"
                    )));
                }
                let filename = if filename.is_empty() {
                    format!("resume-{}.pdf", files.len() + 1)
                } else {
                    filename
                };
                files.push(ResumeFile { filename, content });
            }
            other => debug!("Ignoring unknown form field '{other}'"),
        }
    }

    if credential.is_empty() {
        if let Some(key) = fallback_key {
            credential = key.to_string();
        }
    }

    Ok(AnalysisRequest {
        credential,
        job_description,
        files,
    })
}

fn is_pdf(filename: &str, content_type: Option<&str>) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf") || content_type == Some("application/pdf")
}

fn json_event(name: &str, payload: &impl Serialize) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
