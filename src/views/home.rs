use super::{escape, layout, ViewState};
use crate::models::Movie;

/// Target summary length the "Summarize" button asks for.
pub const REQUESTED_SUMMARY_LENGTH: u32 = 1000;

#[derive(Debug, Clone)]
pub struct HomePage {
    pub movie: ViewState<Movie>,
    /// Title handed over from the browse page, shown while the details are
    /// missing.
    pub requested_title: Option<String>,
}

impl HomePage {
    pub fn new(requested_title: Option<String>) -> Self {
        Self {
            movie: ViewState::Idle,
            requested_title,
        }
    }
}

pub fn summary_link(movie_id: u64) -> String {
    format!("/summary/{}?length={}", movie_id, REQUESTED_SUMMARY_LENGTH)
}

pub fn render(page: &HomePage) -> String {
    let mut body = String::from(
        "<main><h1>MovieRAG</h1>\
         <div class=\"search\">\
         <input id=\"search\" type=\"text\" placeholder=\"Select your movie\" autocomplete=\"off\">\
         <button id=\"search-button\" type=\"button\" aria-label=\"Search\">&#128269;</button>\
         <div id=\"suggestions\" class=\"suggestions\" hidden></div>\
         </div>\
         <p class=\"status\"><a href=\"/browse\">Browse by genre</a></p>",
    );

    match &page.movie {
        ViewState::Idle => {}
        ViewState::Loading => {
            body.push_str("<div class=\"status muted\">Searching...</div>");
        }
        ViewState::Loaded(movie) => body.push_str(&movie_card(movie)),
        ViewState::Failed(_) => {
            let label = page
                .requested_title
                .as_deref()
                .map(|t| format!("Movie not found: {}", escape(t)))
                .unwrap_or_else(|| "Movie not found".to_string());
            body.push_str(&format!("<div class=\"status muted\">{}</div>", label));
        }
    }
    body.push_str("</main>");

    layout("MovieRAG", &body, Some(SEARCH_SCRIPT))
}

fn movie_card(movie: &Movie) -> String {
    let poster = movie
        .poster_url()
        .map(|url| {
            format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape(&url),
                escape(&movie.title)
            )
        })
        .unwrap_or_else(|| "<div></div>".to_string());
    format!(
        "<section class=\"card movie\" data-movie-id=\"{id}\">{poster}<div>\
         <h2>{title}</h2>\
         <a class=\"summarize\" href=\"{link}\">&#10024; Summarize</a>\
         <p class=\"muted\">{overview}</p></div></section>",
        id = movie.id,
        poster = poster,
        title = escape(&movie.display_title()),
        link = escape(&summary_link(movie.id)),
        overview = escape(&movie.overview),
    )
}

/// Forwards every keystroke to the suggestion socket and renders whatever
/// list the server pushes back. All debouncing happens server side.
const SEARCH_SCRIPT: &str = r#"
(function () {
  var input = document.getElementById('search');
  var button = document.getElementById('search-button');
  var box = document.getElementById('suggestions');
  var current = [];
  var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var socket = new WebSocket(proto + location.host + '/ws/suggestions');

  function send(msg) {
    if (socket.readyState === WebSocket.OPEN) socket.send(JSON.stringify(msg));
  }

  function select(id) {
    send({ type: 'clear' });
    input.value = '';
    render([]);
    location.href = '/?movie=' + encodeURIComponent(id);
  }

  function render(list) {
    current = list;
    box.innerHTML = '';
    box.hidden = list.length === 0;
    list.forEach(function (s) {
      var row = document.createElement('div');
      row.className = 'suggestion';
      if (s.poster_path) {
        var img = document.createElement('img');
        img.src = 'https://image.tmdb.org/t/p/w92' + s.poster_path;
        img.alt = s.title;
        row.appendChild(img);
      }
      var text = document.createElement('div');
      var title = document.createElement('div');
      title.textContent = s.title;
      var year = document.createElement('div');
      year.className = 'muted';
      year.textContent = (s.release_date || '').slice(0, 4);
      text.appendChild(title);
      text.appendChild(year);
      row.appendChild(text);
      row.addEventListener('click', function () { select(s.id); });
      box.appendChild(row);
    });
  }

  socket.addEventListener('message', function (ev) {
    var update = JSON.parse(ev.data);
    render(update.suggestions || []);
  });
  input.addEventListener('input', function () {
    send({ type: 'input', query: input.value });
  });
  button.addEventListener('click', function () {
    if (current.length > 0) select(current[0].id);
  });
  window.addEventListener('pagehide', function () { send({ type: 'clear' }); });
})();
"#;
