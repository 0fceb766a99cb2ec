//! Server-rendered pages.
//!
//! Each page keeps its data in a [`ViewState`] and renders whatever state it
//! ended up in; handlers in `app.rs` drive the transitions. Handlers render
//! once the fetch has settled, so the `Idle` and `Loading` arms only show up
//! for pages rendered mid-transition by other callers.

pub mod browse;
pub mod home;
pub mod summary;

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn begin(self) -> Self {
        ViewState::Loading
    }

    /// Only a loading view accepts a result; anything else is left as is.
    pub fn finish<E: std::fmt::Display>(self, result: Result<T, E>) -> Self {
        match self {
            ViewState::Loading => match result {
                Ok(value) => ViewState::Loaded(value),
                Err(e) => ViewState::Failed(e.to_string()),
            },
            other => other,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body{margin:0;min-height:100vh;font-family:Roboto,system-ui,sans-serif;color:#fff;background:linear-gradient(135deg,#000,#0f172a 50%,#1e293b)}
main{max-width:64rem;margin:0 auto;padding:4rem 1rem}
h1{text-align:center;font-size:3.5rem;letter-spacing:-.02em}
a{color:inherit}
.card{background:rgba(0,0,0,.3);border-radius:.75rem;padding:1.5rem;box-shadow:0 10px 25px rgba(0,0,0,.4)}
.search{position:relative;max-width:42rem;margin:0 auto}
.search input{width:100%;box-sizing:border-box;padding:.75rem 3rem .75rem 1rem;border:0;border-radius:.5rem;background:rgba(255,255,255,.1);color:#fff}
.search button{position:absolute;right:0;top:0;bottom:0;border:0;background:#1e293b;color:#fff;padding:0 1rem;border-radius:0 .5rem .5rem 0}
.suggestions{position:absolute;width:100%;margin-top:.25rem;background:rgba(0,0,0,.8);border-radius:.5rem;z-index:50}
.suggestion{display:flex;gap:1rem;align-items:center;padding:.75rem;cursor:pointer}
.suggestion:hover{background:rgba(255,255,255,.1)}
.suggestion img{width:2.5rem;border-radius:.25rem}
.muted{color:#9ca3af}
.status{text-align:center;margin:2rem 0}
.movie{display:grid;grid-template-columns:200px 1fr;gap:1.5rem;margin-top:2rem}
.movie img{width:100%;border-radius:.5rem}
.summarize{display:inline-block;padding:.5rem 1rem;border-radius:9999px;background:linear-gradient(90deg,#facc15,#f97316);text-decoration:none;font-weight:600}
.genres{display:flex;flex-wrap:wrap;gap:1rem;justify-content:center;margin-bottom:3rem}
.genre{padding:.75rem 1.5rem;border-radius:9999px;background:#1e293b;border:2px solid transparent;text-decoration:none;font-size:1.25rem}
.genre.selected{border-color:#60a5fa}
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(10rem,1fr));gap:1.5rem}
.tile{position:relative;display:block;aspect-ratio:2/3;background:#1f2937;border-radius:.75rem;overflow:hidden}
.tile img{width:100%;height:100%;object-fit:cover}
.tile span{position:absolute;bottom:0;padding:1rem;font-weight:700;background:linear-gradient(transparent,rgba(0,0,0,.8));width:100%;box-sizing:border-box}
.prose{color:#d1d5db;line-height:1.6}
.prose blockquote{border-left:4px solid #4b5563;padding-left:1rem;font-style:italic;color:#9ca3af}
.prose code{background:#1f2937;border-radius:.25rem;padding:.1rem .25rem}
.prose pre{background:#1f2937;border-radius:.25rem;padding:1rem;overflow-x:auto}
"#;

/// Wraps page content in the shared document shell.
pub fn layout(title: &str, body: &str, script: Option<&str>) -> String {
    let mut html = String::with_capacity(body.len() + STYLE.len() + 512);
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{}</style></head><body>{}",
        escape(title),
        STYLE,
        body
    );
    if let Some(script) = script {
        let _ = write!(html, "<script>{}</script>", script);
    }
    html.push_str("</body></html>");
    html
}

/// Minimal page used for terminal errors (404, backend offline).
pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "<main><h1>{}</h1><p class=\"status muted\">{}</p>\
         <p class=\"status\"><a href=\"/\">Back to Search</a></p></main>",
        escape(title),
        escape(message)
    );
    layout(title, &body, None)
}
