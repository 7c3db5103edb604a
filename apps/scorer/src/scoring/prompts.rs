// Prompt constants for the Score Requester.

/// System prompt for résumé scoring. Enforces JSON-only output.
pub const SCORE_SYSTEM: &str = "You are a resume screening assistant. \
    You compare a candidate's resume against a job description and judge compatibility honestly. \
    Never invent experience the resume does not show.";

/// Scoring prompt template. Replace `{job_description}` and `{resume_text}` before sending.
pub const SCORE_PROMPT_TEMPLATE: &str = r#"Job Description:
{job_description}

Resume:
{resume_text}

Now analyze:
- Give a score out of 100 for compatibility.
- List two missing skills.
- Suggest short improvements to the resume for this job (at least one).

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 72,
  "missing_skills": ["Django", "REST API design"],
  "suggestions": ["Mention the Django projects you built"]
}

Rules:
1. "score" is an integer from 0 to 100.
2. "missing_skills" lists skills the job asks for that the resume does not show.
3. Return ONLY the JSON object, nothing else, no code fences."#;

/// Renders the scoring prompt for one résumé/job pair.
///
/// Placeholders are filled in a single pass, so user text that happens to
/// contain `{resume_text}` or `{job_description}` is inserted verbatim.
pub fn render_score_prompt(job_description: &str, resume_text: &str) -> String {
    let mut out = String::with_capacity(
        SCORE_PROMPT_TEMPLATE.len() + job_description.len() + resume_text.len(),
    );
    let mut rest = SCORE_PROMPT_TEMPLATE;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{job_description}") {
            out.push_str(job_description);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{resume_text}") {
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
