//! Shortens long résumé text to the passages that matter for scoring,
//! so the prompt stays small.

/// Section keywords, in the order their windows are emitted.
const SECTION_KEYWORDS: &[&str] = &["experience", "skills", "education", "project", "achievement"];
const CONTEXT_BEFORE: usize = 50;
const CONTEXT_AFTER: usize = 150;
const SEPARATOR: &str = "...";

/// Returns `text` unchanged when it has at most `max_chars` characters.
///
/// Otherwise returns a window around the first occurrence of each section
/// keyword (50 chars before, 150 after), joined with `...` and cut to
/// `max_chars`. Falls back to the first `max_chars` characters when no
/// keyword occurs. All lengths are in characters.
pub fn condense(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let lowered: Vec<char> = chars.iter().map(|c| c.to_ascii_lowercase()).collect();

    let sections: Vec<String> = SECTION_KEYWORDS
        .iter()
        .filter_map(|keyword| {
            let needle: Vec<char> = keyword.chars().collect();
            let idx = find_chars(&lowered, &needle)?;
            let start = idx.saturating_sub(CONTEXT_BEFORE);
            let end = (idx + needle.len() + CONTEXT_AFTER).min(chars.len());
            Some(chars[start..end].iter().collect())
        })
        .collect();

    if sections.is_empty() {
        return take_chars(text, max_chars);
    }

    take_chars(&sections.join(SEPARATOR), max_chars)
}

/// Returns at most `n` leading characters of `text`.
pub fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
