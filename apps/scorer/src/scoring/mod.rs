//! Score Requester: asks the AI model how well a résumé fits a job description.
//!
//! `AppState` holds an `Arc<dyn ResumeScorer>`; the default backend is
//! `LlmResumeScorer`. Tests swap in a fixed scorer without touching handlers.

pub mod handlers;
pub mod parser;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::scoring::parser::{parse_score_reply, ParsedReply};
use crate::scoring::prompts::{render_score_prompt, SCORE_SYSTEM};

/// User-supplied target-role text. Non-empty and bounded in length.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescription(String);

impl JobDescription {
    /// Trims the text and checks it is non-empty and at most `max_chars` characters.
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, AppError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "job_description cannot be empty".to_string(),
            ));
        }
        let len = text.chars().count();
        if len > max_chars {
            return Err(AppError::Validation(format!(
                "job_description is {len} characters; the limit is {max_chars}"
            )));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Relevance score and improvement advice for one résumé/job pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    /// 0 – 100
    pub score: u8,
    pub missing_skills: Vec<String>,
    pub suggestions: Vec<String>,
    /// Model that produced the judgement, for transparency.
    pub model: String,
}

impl ScoreResult {
    pub fn from_reply(reply: ParsedReply, model: &str) -> Self {
        Self {
            score: reply.score,
            missing_skills: reply.missing_skills,
            suggestions: reply.suggestions,
            model: model.to_string(),
        }
    }
}

/// The scorer trait. Implement this to swap backends without touching
/// the endpoint, handler, or caller code.
#[async_trait]
pub trait ResumeScorer: Send + Sync {
    async fn score(
        &self,
        resume_text: &str,
        job_description: &JobDescription,
    ) -> Result<ScoreResult, AppError>;
}

/// Scores by prompting the chat-completions model through `LlmClient`.
pub struct LlmResumeScorer {
    llm: LlmClient,
}

impl LlmResumeScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeScorer for LlmResumeScorer {
    async fn score(
        &self,
        resume_text: &str,
        job_description: &JobDescription,
    ) -> Result<ScoreResult, AppError> {
        let prompt = render_score_prompt(job_description.as_str(), resume_text);
        let system = format!("{SCORE_SYSTEM} {JSON_ONLY_SYSTEM}");

        let reply = self.llm.call_text(&prompt, &system).await?;
        debug!("Raw scoring reply: {reply}");

        let parsed = parse_score_reply(&reply)?;
        info!(
            "Scored resume: score={}, missing_skills={}, suggestions={}",
            parsed.score,
            parsed.missing_skills.len(),
            parsed.suggestions.len()
        );

        Ok(ScoreResult::from_reply(parsed, self.llm.model()))
    }
}
