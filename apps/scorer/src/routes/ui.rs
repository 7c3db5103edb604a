use axum::{extract::State, response::Html};

use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("../../static/index.html");

/// GET /
/// Serves the single-page front end, with the configured input limits filled in.
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_index(
        state.config.jd_max_chars,
        state.config.max_pdf_pages,
    ))
}

fn render_index(jd_max_chars: usize, max_pdf_pages: usize) -> String {
    INDEX_TEMPLATE
        .replace("{{JD_MAX_CHARS}}", &jd_max_chars.to_string())
        .replace("{{MAX_PDF_PAGES}}", &max_pdf_pages.to_string())
}
