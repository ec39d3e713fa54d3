//! Batch Orchestrator — runs extract → evaluate for every uploaded file in
//! upload order, one file at a time.
//!
//! Per-file failures never abort the batch; they are collected as
//! `FileError`s next to the successful records. Only the preconditions and a
//! rejected credential stop a run.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{ChatModel, LlmError};
use crate::screening::evaluator::{evaluate_resume, EvaluationError, EvaluationRecord};
use crate::screening::extract::{ExtractError, TextExtractor};

/// A named PDF upload.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub filename: String,
    pub content: Bytes,
}

/// Everything a run needs, fixed before the first file is processed.
#[derive(Clone)]
pub struct AnalysisRequest {
    pub credential: String,
    pub job_description: String,
    pub files: Vec<ResumeFile>,
}

// Keep the credential out of logs.
impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("credential", &"<redacted>")
            .field("job_description_len", &self.job_description.len())
            .field("files", &self.files.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    Extraction,
    ModelCall,
    Parse,
}

/// Why a file produced no record.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub filename: String,
    pub kind: FileErrorKind,
    pub message: String,
    /// The model's reply, for parse failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    /// processed / total, in [0, 1].
    pub fraction: f64,
    pub filename: String,
    pub status: String,
}

#[derive(Debug, Default)]
pub struct AnalysisResult {
    /// Successful evaluations, in upload order.
    pub records: Vec<EvaluationRecord>,
    pub errors: Vec<FileError>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Please paste a Job Description.")]
    MissingJobDescription,

    #[error("Please upload at least one resume.")]
    NoFiles,

    #[error("Please enter your OpenAI API Key.")]
    MissingCredential,

    #[error("The OpenAI API key was rejected while analyzing {filename}.")]
    InvalidCredential { filename: String },
}

impl AnalysisRequest {
    /// Preconditions, checked in this order before any file is touched.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.job_description.trim().is_empty() {
            return Err(BatchError::MissingJobDescription);
        }
        if self.files.is_empty() {
            return Err(BatchError::NoFiles);
        }
        if self.credential.trim().is_empty() {
            return Err(BatchError::MissingCredential);
        }
        Ok(())
    }
}

/// Holds the two external collaborators of a run. Cheap to clone.
#[derive(Clone)]
pub struct BatchRunner {
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn ChatModel>,
}

impl BatchRunner {
    pub fn new(extractor: Arc<dyn TextExtractor>, model: Arc<dyn ChatModel>) -> Self {
        Self { extractor, model }
    }

    /// Processes every file sequentially. `on_progress` is called once after
    /// each file, whether it succeeded or not.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        on_progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<AnalysisResult, BatchError> {
        request.validate()?;

        let total = request.files.len();
        let mut result = AnalysisResult::default();
        info!("Screening {total} resume(s)");

        for (index, file) in request.files.iter().enumerate() {
            match self.process_file(request, file).await {
                Ok(record) => {
                    info!(filename = %file.filename, score = %record.match_score, "Resume evaluated");
                    result.records.push(record);
                }
                Err(FileFailure::Fatal(err)) => {
                    warn!(filename = %file.filename, "Credential rejected, stopping batch");
                    return Err(err);
                }
                Err(FileFailure::Skipped(file_error)) => {
                    warn!(
                        filename = %file_error.filename,
                        kind = ?file_error.kind,
                        "Skipping resume: {}",
                        file_error.message
                    );
                    result.errors.push(file_error);
                }
            }

            let processed = index + 1;
            let status = match request.files.get(processed) {
                Some(next) => format!("Analyzing {}...", next.filename),
                None => "Analysis Complete!".to_string(),
            };
            on_progress(Progress {
                processed,
                total,
                fraction: processed as f64 / total as f64,
                filename: file.filename.clone(),
                status,
            });
        }

        info!(
            "Screening finished: {} evaluated, {} skipped",
            result.records.len(),
            result.errors.len()
        );
        Ok(result)
    }

    async fn process_file(
        &self,
        request: &AnalysisRequest,
        file: &ResumeFile,
    ) -> Result<EvaluationRecord, FileFailure> {
        let text = self
            .extract(file)
            .await
            .map_err(|e| FileFailure::skipped(file, FileErrorKind::Extraction, e.to_string(), None))?;

        evaluate_resume(
            self.model.as_ref(),
            &request.credential,
            &text,
            &request.job_description,
            &file.filename,
        )
        .await
        .map_err(|e| match e {
            EvaluationError::Model(LlmError::Unauthorized) => {
                FileFailure::Fatal(BatchError::InvalidCredential {
                    filename: file.filename.clone(),
                })
            }
            EvaluationError::Model(err) => FileFailure::skipped(
                file,
                FileErrorKind::ModelCall,
                format!("Error analyzing {}: {err}", file.filename),
                None,
            ),
            EvaluationError::Parse(failure) => FileFailure::skipped(
                file,
                FileErrorKind::Parse,
                format!("Error analyzing {}: {}", file.filename, failure.reason),
                Some(failure.raw_text),
            ),
        })
    }

    /// PDF parsing is CPU-bound, so it runs on the blocking pool.
    async fn extract(&self, file: &ResumeFile) -> Result<String, ExtractError> {
        let extractor = Arc::clone(&self.extractor);
        let content = file.content.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&content))
            .await
            .unwrap_or_else(|join_err| Err(ExtractError::Malformed(join_err.to_string())))
    }
}

enum FileFailure {
    Skipped(FileError),
    Fatal(BatchError),
}

impl FileFailure {
    fn skipped(
        file: &ResumeFile,
        kind: FileErrorKind,
        message: String,
        raw_text: Option<String>,
    ) -> Self {
        FileFailure::Skipped(FileError {
            filename: file.filename.clone(),
            kind,
            message,
            raw_text,
        })
    }
}
