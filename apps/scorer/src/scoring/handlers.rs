//! Axum route handlers for the Scoring API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::condense::take_chars;
use crate::extraction::{condense, extract_resume_blocking, ExtractOptions};
use crate::scoring::{JobDescription, ScoreResult};
use crate::state::AppState;

/// Characters of processed résumé text echoed back for the preview panel.
const PREVIEW_CHARS: usize = 700;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "job_description";

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub result: ScoreResult,
    /// Start of the text that was actually sent to the model.
    pub resume_preview: String,
    pub pages_read: usize,
    pub total_pages: usize,
}

/// Fields collected from the upload form.
#[derive(Default)]
struct ScoreForm {
    resume: Option<Bytes>,
    job_description: Option<String>,
}

/// POST /api/v1/score
///
/// Multipart form with a `resume` PDF and a `job_description` text field.
/// Extracts the résumé, condenses it, and asks the scorer for a judgement.
pub async fn handle_score(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScoreResponse>, AppError> {
    let form = read_form(multipart).await?;

    let (resume, job_description) = match (form.resume, form.job_description) {
        (Some(resume), Some(jd)) => (resume, jd),
        _ => {
            return Err(AppError::Validation(
                "Please provide both a job description and a resume".to_string(),
            ))
        }
    };
    let job_description = JobDescription::parse(&job_description, state.config.jd_max_chars)?;

    let analysis_id = Uuid::new_v4();
    info!(
        "[{analysis_id}] Scoring resume against job description ({} chars)",
        job_description.as_str().chars().count()
    );

    let document = extract_resume_blocking(
        resume,
        ExtractOptions {
            max_pages: state.config.max_pdf_pages,
        },
    )
    .await?;

    let resume_text = condense(document.text(), state.config.resume_max_chars);
    info!(
        "[{analysis_id}] Extracted {} chars from {}/{} pages ({} bytes), sending {} chars",
        document.text().chars().count(),
        document.pages_read(),
        document.total_pages(),
        document.raw().len(),
        resume_text.chars().count()
    );

    let result = state.scorer.score(&resume_text, &job_description).await?;
    info!("[{analysis_id}] Score {}", result.score);

    Ok(Json(ScoreResponse {
        analysis_id,
        analyzed_at: Utc::now(),
        result,
        resume_preview: take_chars(&resume_text, PREVIEW_CHARS),
        pages_read: document.pages_read(),
        total_pages: document.total_pages(),
    }))
}

async fn read_form(mut multipart: Multipart) -> Result<ScoreForm, AppError> {
    let mut form = ScoreForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RESUME_FIELD) => {
                form.resume = Some(field.bytes().await.map_err(multipart_error)?);
            }
            Some(JOB_DESCRIPTION_FIELD) => {
                form.job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}
