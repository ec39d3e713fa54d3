// Prompt template for résumé screening.
// Both texts are embedded verbatim; quotes inside them are not escaped.

/// Screening prompt. `{jd_text}` and `{resume_text}` are substituted by
/// `build_screening_prompt`.
pub const SCREENING_PROMPT_TEMPLATE: &str = r#"
Act as an expert HR Recruiter.

Job Description: "{jd_text}"

Resume Text: "{resume_text}"

Evaluate this candidate and return JSON with keys:
{
    "Name": "Candidate Name",
    "Match_Score": "0-100",
    "Key_Strengths": ["strength1", "strength2"],
    "Missing_Skills": ["skill1", "skill2"],
    "Summary": "Brief 2-line summary of fit"
}
Return only JSON.
"#;

const JD_PLACEHOLDER: &str = "{jd_text}";
const RESUME_PLACEHOLDER: &str = "{resume_text}";

/// Renders the screening prompt in a single pass over the template, so a
/// placeholder token inside user text is never expanded a second time.
pub fn build_screening_prompt(jd_text: &str, resume_text: &str) -> String {
    let mut out = String::with_capacity(
        SCREENING_PROMPT_TEMPLATE.len() + jd_text.len() + resume_text.len(),
    );
    let mut rest = SCREENING_PROMPT_TEMPLATE;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(JD_PLACEHOLDER) {
            out.push_str(jd_text);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(RESUME_PLACEHOLDER) {
            out.push_str(resume_text);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
