//! Reply parsing: turns the model's answer into score, missing skills and suggestions.
//!
//! The prompt asks for JSON, so JSON is tried first. Models do not always
//! comply, so plain prose is read as a fallback:
//! - score: on the first line mentioning "score" that yields one, the first
//!   integer 0–100 after the word (after its `:` when there is one); else the
//!   first integer 0–100 anywhere. `75/100`, `75%` and `(75)` count as 75.
//!   Signed numbers and list markers such as `1.` or `2)` never count.
//! - missing skills: the first line mentioning skill/missing/require/lack,
//!   text after its last `:`, comma-separated, first two (JSON replies are
//!   capped the same way)
//! - suggestion: the first line mentioning suggest/recommend/advice/improve,
//!   text after its last `:`, first sentence

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::strip_json_fences;

pub const MAX_SCORE: u8 = 100;
const MAX_MISSING_SKILLS: usize = 2;

const SKILL_MARKERS: &[&str] = &["skill", "missing", "require", "lack"];
const SUGGESTION_MARKERS: &[&str] = &["suggest", "recommend", "advice", "improve"];

#[derive(Debug, Error, PartialEq)]
pub enum ReplyParseError {
    #[error("The AI reply did not contain a compatibility score")]
    MissingScore,

    #[error("The AI reply gave a score of {0}, outside the 0-100 range")]
    ScoreOutOfRange(f64),
}

/// Fields read out of one model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub score: u8,
    pub missing_skills: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JsonReply {
    #[serde(default)]
    score: Option<Value>,
    #[serde(default, alias = "missingSkills")]
    missing_skills: Option<StringList>,
    #[serde(default, alias = "suggestion")]
    suggestions: Option<StringList>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    Many(Vec<String>),
    One(String),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            StringList::Many(items) => items,
            StringList::One(item) => vec![item],
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// A single string is read as a comma-separated list, like the prose form.
    fn into_skills(self) -> Vec<String> {
        let items = match self {
            StringList::Many(items) => items,
            StringList::One(item) => item.split(',').map(str::to_string).collect(),
        };
        items
            .iter()
            .map(|s| clean_item(s))
            .filter(|s| !s.is_empty())
            .take(MAX_MISSING_SKILLS)
            .collect()
    }
}

/// Parses a model reply. JSON first, then prose.
pub fn parse_score_reply(text: &str) -> Result<ParsedReply, ReplyParseError> {
    if let Some(reply) = parse_json_reply(text) {
        return reply;
    }
    parse_prose_reply(text)
}

/// Returns `None` when the text is not a JSON object with a score field,
/// so prose parsing can take over.
fn parse_json_reply(text: &str) -> Option<Result<ParsedReply, ReplyParseError>> {
    let body = strip_json_fences(text);
    let body = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => return None,
    };

    let reply: JsonReply = serde_json::from_str(body).ok()?;
    let raw_score = reply.score.as_ref().and_then(json_number)?;

    Some(validate_score(raw_score).map(|score| ParsedReply {
        score,
        missing_skills: reply
            .missing_skills
            .map(StringList::into_skills)
            .unwrap_or_default(),
        suggestions: reply
            .suggestions
            .map(StringList::into_vec)
            .unwrap_or_default(),
    }))
}

/// Reads a number or a numeric string such as `"72"` or `"72/100"`.
fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_suffix("/100").unwrap_or(s);
            s.trim().parse::<f64>().ok()
        }
        _ => None,
    }
}

fn validate_score(raw: f64) -> Result<u8, ReplyParseError> {
    if !raw.is_finite() || !(0.0..=f64::from(MAX_SCORE)).contains(&raw) {
        return Err(ReplyParseError::ScoreOutOfRange(raw));
    }
    Ok(raw.round() as u8)
}

fn parse_prose_reply(text: &str) -> Result<ParsedReply, ReplyParseError> {
    let lines: Vec<&str> = text.lines().collect();

    let score = lines
        .iter()
        .find_map(|line| after_score_label(line).and_then(score_in_segment))
        .or_else(|| first_score_token(text))
        .ok_or(ReplyParseError::MissingScore)?;

    let missing_skills = labelled_value(&lines, SKILL_MARKERS)
        .map(|value| {
            value
                .split(',')
                .map(clean_item)
                .filter(|s| !s.is_empty())
                .take(MAX_MISSING_SKILLS)
                .collect()
        })
        .unwrap_or_default();

    let suggestions = labelled_value(&lines, SUGGESTION_MARKERS)
        .map(|value| first_sentence(&value))
        .filter(|s| !s.is_empty())
        .into_iter()
        .collect();

    Ok(ParsedReply {
        score,
        missing_skills,
        suggestions,
    })
}

/// Text following the word "score" on a line, starting after the next `:`
/// when one follows. `None` if the line does not mention a score.
fn after_score_label(line: &str) -> Option<&str> {
    let start = line.to_ascii_lowercase().find("score")? + "score".len();
    let rest = &line[start..];
    Some(rest.split_once(':').map_or(rest, |(_, value)| value))
}

/// First integer 0–100 anywhere in the text, skipping list markers that
/// open a line.
fn first_score_token(text: &str) -> Option<u8> {
    text.lines().find_map(|line| {
        let mut words = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty());
        let first = words.next()?;
        if is_list_marker(first) {
            score_in_segment(&words.collect::<Vec<_>>().join(" "))
        } else {
            score_in_segment(line)
        }
    })
}

/// First whitespace/comma separated token in `segment` that is an
/// unsigned integer in 0–100.
fn score_in_segment(segment: &str) -> Option<u8> {
    segment
        .split(|c: char| c.is_whitespace() || c == ',')
        .find_map(score_token)
}

fn score_token(word: &str) -> Option<u8> {
    let word = word.trim_start_matches('(');
    let word = word.trim_end_matches(|c: char| matches!(c, '.' | ')' | ';' | '!' | '%'));
    let word = word.strip_suffix("/100").unwrap_or(word);
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    word.parse::<u32>()
        .ok()
        .filter(|n| *n <= u32::from(MAX_SCORE))
        .map(|n| n as u8)
}

/// `1.` or `2)` at the start of a line.
fn is_list_marker(word: &str) -> bool {
    word.strip_suffix('.')
        .or_else(|| word.strip_suffix(')'))
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Finds the first line mentioning any marker and returns the text after its
/// last `:`. When that is empty (a heading followed by a list), the list items
/// on the following lines are joined with commas instead.
fn labelled_value(lines: &[&str], markers: &[&str]) -> Option<String> {
    let idx = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        markers.iter().any(|m| lower.contains(m))
    })?;

    let inline = lines[idx].rsplit(':').next().unwrap_or("").trim();
    if !inline.is_empty() {
        return Some(inline.to_string());
    }

    let items: Vec<String> = lines[idx + 1..]
        .iter()
        .take_while(|line| is_list_item(line))
        .map(|line| clean_item(line))
        .filter(|s| !s.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

fn is_list_item(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('-')
        || line.starts_with('*')
        || line.starts_with('•')
        || line
            .split_once('.')
            .map(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
}

/// Strips list markers, numbering and trailing punctuation from an item.
fn clean_item(item: &str) -> String {
    let item = item.trim();
    let item = item.trim_start_matches(|c: char| c == '-' || c == '*' || c == '•');
    let item = match item.split_once('.') {
        Some((n, rest)) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => item,
    };
    item.trim().trim_end_matches('.').trim().to_string()
}

fn first_sentence(text: &str) -> String {
    text.split('.').next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_reply_is_parsed() {
        let reply = r#"{"score": 72, "missing_skills": ["Django", "REST"], "suggestions": ["Mention Django projects"]}"#;
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.score, 72);
        assert_eq!(parsed.missing_skills, vec!["Django", "REST"]);
        assert_eq!(parsed.suggestions, vec!["Mention Django projects"]);
    }

    #[test]
    fn test_fenced_json_with_float_score_is_rounded() {
        let reply = "```json\n{\"score\": 64.6, \"missing_skills\": [], \"suggestions\": \"Add metrics\"}\n```";
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.score, 65);
        assert_eq!(parsed.suggestions, vec!["Add metrics"]);
    }

    #[test]
    fn test_json_with_prose_around_it() {
        let reply = "Here is the analysis:\n{\"score\": \"80/100\", \"suggestion\": \"Quantify impact\"}\nGood luck!";
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.score, 80);
        assert_eq!(parsed.suggestions, vec!["Quantify impact"]);
        assert!(parsed.missing_skills.is_empty());
    }

    #[test]
    fn test_json_score_above_range_is_rejected() {
        let err = parse_score_reply(r#"{"score": 140}"#).unwrap_err();
        assert_eq!(err, ReplyParseError::ScoreOutOfRange(140.0));
    }

    #[test]
    fn test_json_negative_score_is_rejected() {
        let err = parse_score_reply(r#"{"score": -3}"#).unwrap_err();
        assert_eq!(err, ReplyParseError::ScoreOutOfRange(-3.0));
    }

    #[test]
    fn test_json_blank_entries_are_dropped() {
        let reply = r#"{"score": 50, "missing_skills": ["", " Kafka "], "suggestions": ["  "]}"#;
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.missing_skills, vec!["Kafka"]);
        assert!(parsed.suggestions.is_empty());
    }

    #[test]
    fn test_prose_reply_is_parsed() {
        let reply = "Compatibility score: 70\n\
                     Missing skills: Django, REST APIs, Docker\n\
                     Suggestion: Highlight any Django work. Also add links.";
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.score, 70);
        assert_eq!(parsed.missing_skills, vec!["Django", "REST APIs"]);
        assert_eq!(parsed.suggestions, vec!["Highlight any Django work"]);
    }

    #[test]
    fn test_prose_prefers_number_on_score_line() {
        let reply = "The candidate has 5 years of Python.\nOverall score: 62/100";
        assert_eq!(parse_score_reply(reply).unwrap().score, 62);
    }

    #[test]
    fn test_prose_without_score_line_uses_first_in_range_number() {
        let reply = "I'd rate this 250 words resume at 45, decent.";
        assert_eq!(parse_score_reply(reply).unwrap().score, 45);
    }

    #[test]
    fn test_prose_list_under_heading() {
        let reply = "Score: 55\n\
                     Missing skills:\n\
                     - Kubernetes\n\
                     - Terraform.\n\
                     - Go\n\
                     Recommendations:\n\
                     1. Add a projects section. It helps.";
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.missing_skills, vec!["Kubernetes", "Terraform"]);
        assert_eq!(parsed.suggestions, vec!["Add a projects section"]);
    }

    #[test]
    fn test_reply_without_score_is_error() {
        let err = parse_score_reply("I cannot evaluate this resume.").unwrap_err();
        assert_eq!(err, ReplyParseError::MissingScore);
    }

    #[test]
    fn test_json_without_score_falls_back_to_prose() {
        let reply = r#"{"verdict": "good"} Score: 90"#;
        assert_eq!(parse_score_reply(reply).unwrap().score, 90);
    }

    #[test]
    fn test_first_score_token_skips_out_of_range() {
        assert_eq!(first_score_token("2024 was great, 101 or 99"), Some(99));
        assert_eq!(first_score_token("no digits here"), None);
        assert_eq!(first_score_token("(88)."), Some(88));
        assert_eq!(first_score_token("Fit is 64%"), Some(64));
    }

    #[test]
    fn test_numbered_list_reply_reads_labelled_score() {
        let reply = "1. Compatibility score: 75/100\n\
                     2. Missing skills: Django, REST\n\
                     3. Suggestion: Add Django projects.";
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.score, 75);
        assert_eq!(parsed.missing_skills, vec!["Django", "REST"]);
        assert_eq!(parsed.suggestions, vec!["Add Django projects"]);
    }

    #[test]
    fn test_list_markers_are_not_scores() {
        let reply = "1) Strong Python background\n2) Rating: 58 overall";
        assert_eq!(parse_score_reply(reply).unwrap().score, 58);
        assert_eq!(first_score_token("3. good fit"), None);
    }

    #[test]
    fn test_score_label_with_range_prefix() {
        let reply = "Score out of 100: 81";
        assert_eq!(parse_score_reply(reply).unwrap().score, 81);
    }

    #[test]
    fn test_negative_prose_score_is_not_accepted() {
        let err = parse_score_reply("Score: -5").unwrap_err();
        assert_eq!(err, ReplyParseError::MissingScore);
        assert_eq!(score_token("-5"), None);
    }

    #[test]
    fn test_json_skills_string_is_split_and_capped() {
        let reply = r#"{"score": 40, "missing_skills": "Django, REST, Docker"}"#;
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.missing_skills, vec!["Django", "REST"]);

        let reply = r#"{"score": 40, "missing_skills": ["Go", "Kafka", "gRPC"]}"#;
        let parsed = parse_score_reply(reply).unwrap();
        assert_eq!(parsed.missing_skills, vec!["Go", "Kafka"]);
    }

    #[test]
    fn test_clean_item_strips_markers() {
        assert_eq!(clean_item(" - Docker. "), "Docker");
        assert_eq!(clean_item("2. Add metrics"), "Add metrics");
        assert_eq!(clean_item("• SQL"), "SQL");
    }
}
