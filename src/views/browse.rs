use super::{escape, layout, ViewState};
use crate::models::{Genre, GenreFilter, Movie};

#[derive(Debug, Clone)]
pub struct BrowsePage {
    pub selected: GenreFilter,
    pub genres: Vec<Genre>,
    pub movies: ViewState<Vec<Movie>>,
}

/// Link to the home page that preselects `movie`.
pub fn home_link(movie: &Movie) -> String {
    format!(
        "/?movie={}&title={}",
        movie.id,
        urlencoding::encode(&movie.title)
    )
}

pub fn render(page: &BrowsePage) -> String {
    let mut body = String::from("<main><h1>Browse Movies</h1><nav class=\"genres\">");
    body.push_str(&genre_button("All", GenreFilter::All, page.selected));
    for genre in &page.genres {
        body.push_str(&genre_button(
            &genre.name,
            GenreFilter::Genre(genre.id),
            page.selected,
        ));
    }
    body.push_str("</nav>");

    match &page.movies {
        ViewState::Idle | ViewState::Loading => {
            body.push_str("<div class=\"status muted\">Loading...</div>");
        }
        ViewState::Loaded(movies) if movies.is_empty() => {
            body.push_str("<div class=\"status muted\">No movies found</div>");
        }
        ViewState::Loaded(movies) => {
            body.push_str("<div class=\"grid\">");
            for movie in movies {
                body.push_str(&movie_tile(movie));
            }
            body.push_str("</div>");
        }
        ViewState::Failed(message) => {
            body.push_str(&format!(
                "<div class=\"status muted\">{}</div>",
                escape(message)
            ));
        }
    }
    body.push_str("<p class=\"status\"><a href=\"/\">Back to Search</a></p></main>");

    layout("Browse Movies", &body, None)
}

fn genre_button(label: &str, filter: GenreFilter, selected: GenreFilter) -> String {
    let class = if filter == selected {
        "genre selected"
    } else {
        "genre"
    };
    format!(
        "<a class=\"{}\" href=\"/browse?genre={}\">{}</a>",
        class,
        filter,
        escape(label)
    )
}

fn movie_tile(movie: &Movie) -> String {
    let poster = movie
        .poster_url()
        .map(|url| {
            format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape(&url),
                escape(&movie.title)
            )
        })
        .unwrap_or_default();
    format!(
        "<a class=\"tile\" href=\"{}\">{}<span>{}</span></a>",
        escape(&home_link(movie)),
        poster,
        escape(&movie.title)
    )
}
