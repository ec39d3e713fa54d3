//! LLM Evaluator — one résumé in, one validated `EvaluationRecord` out.
//!
//! The model is asked for a five-key JSON object but nothing guarantees it
//! answers with one. `parse_reply` checks every key explicitly and turns any
//! deviation into a `ParseFailure` carrying the raw reply, so nothing
//! downstream has to cope with a half-formed record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::{strip_json_fences, ChatModel, LlmError};
use crate::screening::prompts::build_screening_prompt;

/// Structured verdict for a single résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(rename = "Name")]
    pub name: String,
    /// Numeric text as supplied by the model; coerced by the report stage.
    #[serde(rename = "Match_Score")]
    pub match_score: String,
    #[serde(rename = "Key_Strengths")]
    pub key_strengths: Vec<String>,
    #[serde(rename = "Missing_Skills")]
    pub missing_skills: Vec<String>,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Filename")]
    pub filename: String,
}

/// The model answered, but not with a usable record.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("could not parse model reply for {filename}: {reason}")]
pub struct ParseFailure {
    pub filename: String,
    pub raw_text: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

/// Builds the prompt, calls the model once and parses its reply.
pub async fn evaluate_resume(
    model: &dyn ChatModel,
    credential: &str,
    resume_text: &str,
    jd_text: &str,
    filename: &str,
) -> Result<EvaluationRecord, EvaluationError> {
    let prompt = build_screening_prompt(jd_text, resume_text);
    let reply = model.complete(credential, &prompt).await?;
    Ok(parse_reply(filename, &reply)?)
}

/// Strips markdown fences, parses JSON and validates the five expected keys.
/// `filename` is attached to the record; a `Filename` key from the model is ignored.
pub fn parse_reply(filename: &str, raw: &str) -> Result<EvaluationRecord, ParseFailure> {
    let fail = |reason: String| ParseFailure {
        filename: filename.to_string(),
        raw_text: raw.to_string(),
        reason,
    };

    let cleaned = strip_json_fences(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| fail(format!("invalid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| fail("reply is not a JSON object".to_string()))?;

    Ok(EvaluationRecord {
        name: string_field(object, "Name").map_err(fail)?,
        match_score: score_field(object).map_err(fail)?,
        key_strengths: list_field(object, "Key_Strengths").map_err(fail)?,
        missing_skills: list_field(object, "Missing_Skills").map_err(fail)?,
        summary: string_field(object, "Summary").map_err(fail)?,
        filename: filename.to_string(),
    })
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    object
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| format!("missing key '{key}'"))
}

fn string_field(object: &Map<String, Value>, key: &str) -> Result<String, String> {
    field(object, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("'{key}' must be a string"))
}

fn list_field(object: &Map<String, Value>, key: &str) -> Result<Vec<String>, String> {
    let items = field(object, key)?
        .as_array()
        .ok_or_else(|| format!("'{key}' must be a list of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("'{key}' must be a list of strings"))
        })
        .collect()
}

/// Accepts `85`, `85.5` or `"85"`; anything that is not a finite number is rejected.
fn score_field(object: &Map<String, Value>) -> Result<String, String> {
    let text = match field(object, "Match_Score")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err("'Match_Score' must be a number".to_string()),
    };
    match text.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(text),
        _ => Err(format!("'Match_Score' is not numeric: {text:?}")),
    }
}
