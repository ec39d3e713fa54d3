//! Test doubles shared by the screening tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::llm_client::{ChatModel, LlmError};
use crate::screening::batch::{AnalysisRequest, BatchRunner, ResumeFile};
use crate::screening::extract::{ExtractError, TextExtractor};

type Responder = Box<dyn Fn() -> Result<String, LlmError> + Send + Sync>;

/// Answers each prompt with the first rule whose needle appears in it.
pub struct ScriptedModel {
    rules: Vec<(String, Responder)>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(mut self, needle: &str, reply: &str) -> Self {
        let reply = reply.to_string();
        let respond: Responder = Box::new(move || -> Result<String, LlmError> { Ok(reply.clone()) });
        self.rules.push((needle.to_string(), respond));
        self
    }

    pub fn fail(
        mut self,
        needle: &str,
        error: impl Fn() -> LlmError + Send + Sync + 'static,
    ) -> Self {
        let respond: Responder = Box::new(move || -> Result<String, LlmError> { Err(error()) });
        self.rules.push((needle.to_string(), respond));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, _credential: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, respond)| respond())
            .unwrap_or_else(|| Err(LlmError::EmptyContent))
    }
}

/// Treats file bytes as UTF-8 résumé text. Content starting with `%CORRUPT`
/// fails the way a broken PDF would.
#[derive(Default)]
pub struct PlainTextExtractor {
    calls: AtomicUsize,
}

impl PlainTextExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, content: &[u8]) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content.starts_with(b"%CORRUPT") {
            return Err(ExtractError::Malformed("xref table not found".to_string()));
        }
        String::from_utf8(content.to_vec()).map_err(|e| ExtractError::Malformed(e.to_string()))
    }
}

/// A reqwest error produced without touching the network.
pub fn network_error() -> LlmError {
    let err = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .expect_err("malformed URL must not build");
    LlmError::Http(err)
}

pub fn evaluation_json(name: &str, score: &str) -> String {
    serde_json::json!({
        "Name": name,
        "Match_Score": score,
        "Key_Strengths": ["Rust", "Distributed systems"],
        "Missing_Skills": ["Kubernetes"],
        "Summary": format!("{name} is a solid fit.")
    })
    .to_string()
}

pub fn resume(filename: &str, text: &str) -> ResumeFile {
    ResumeFile {
        filename: filename.to_string(),
        content: Bytes::from(text.to_string()),
    }
}

pub fn request(files: Vec<ResumeFile>) -> AnalysisRequest {
    AnalysisRequest {
        credential: "sk-test".to_string(),
        job_description: "Senior Rust Engineer. Required: Rust, Tokio.".to_string(),
        files,
    }
}

pub fn runner(
    extractor: Arc<PlainTextExtractor>,
    model: Arc<ScriptedModel>,
) -> BatchRunner {
    BatchRunner::new(extractor, model)
}

/// Builds a small but well-formed PDF with one Helvetica text line per page.
pub fn minimal_pdf(pages: &[&str]) -> Vec<u8> {
    let font_id = 3;
    let mut objects: Vec<String> = Vec::new();

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    for (i, text) in pages.iter().enumerate() {
        let content_id = 5 + 2 * i;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}
