use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use super::{escape, layout, ViewState};
use crate::models::{Movie, Summary};

pub const DEFAULT_SUMMARY_LENGTH: u32 = 500;

const SAFE_URL_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

#[derive(Debug, Clone)]
pub struct SummaryPage {
    pub movie: Movie,
    /// Accepted from the URL; not sent to the summarization backend.
    pub length: u32,
    pub summary: ViewState<Summary>,
}

/// `length` query value, falling back to the default when absent or not a
/// positive integer.
pub fn parse_length(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_SUMMARY_LENGTH)
}

/// Renders summary markdown. Raw HTML in the source is shown as text, and
/// link or image targets with a scheme other than http, https or mailto are
/// dropped.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(Tag::Link(kind, dest, title)) => {
            Event::Start(Tag::Link(kind, safe_destination(dest, "#"), title))
        }
        Event::Start(Tag::Image(kind, dest, title)) => {
            Event::Start(Tag::Image(kind, safe_destination(dest, ""), title))
        }
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn safe_destination<'a>(dest: CowStr<'a>, replacement: &'static str) -> CowStr<'a> {
    if is_safe_destination(&dest) {
        dest
    } else {
        CowStr::Borrowed(replacement)
    }
}

/// Relative targets pass; absolute ones need an allowed scheme. Browsers
/// ignore whitespace and control characters inside a scheme, so they are
/// stripped before the check.
fn is_safe_destination(dest: &str) -> bool {
    let cleaned: String = dest
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();
    match cleaned.find(|c| matches!(c, ':' | '/' | '?' | '#')) {
        Some(i) if cleaned[i..].starts_with(':') => SAFE_URL_SCHEMES
            .iter()
            .any(|scheme| cleaned[..i].eq_ignore_ascii_case(scheme)),
        _ => true,
    }
}

pub fn render(page: &SummaryPage) -> String {
    let heading = format!("{} - Summary", page.movie.display_title());
    let content = match &page.summary {
        ViewState::Idle | ViewState::Loading => {
            "<div class=\"muted\">Generating summary...</div>".to_string()
        }
        ViewState::Loaded(summary) => {
            format!(
                "<div class=\"prose\" data-movie-id=\"{}\">{}</div>",
                summary.movie_id,
                render_markdown(&summary.markdown)
            )
        }
        ViewState::Failed(message) => {
            format!("<div class=\"status muted\">{}</div>", escape(message))
        }
    };
    let body = format!(
        "<main><p><a href=\"/\">&larr; Back to Search</a></p>\
         <section class=\"card\" data-summary-length=\"{length}\"><h2>{heading}</h2>{content}</section></main>",
        length = page.length,
        heading = escape(&heading),
        content = content,
    );
    layout(&heading, &body, None)
}
