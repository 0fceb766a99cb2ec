use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const POSTER_THUMB_BASE: &str = "https://image.tmdb.org/t/p/w92";
pub const POSTER_CARD_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

/// Projection of a search hit shown in the suggestion dropdown.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSuggestion {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Genre(u64),
}

/// One full replacement of the suggestion list, tagged with the query and
/// the sequence number of the search that produced it.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct SuggestionUpdate {
    pub seq: u64,
    pub query: String,
    pub suggestions: Vec<MovieSuggestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub movie_id: u64,
    pub markdown: String,
}

impl Movie {
    pub fn release_year(&self) -> Option<i32> {
        release_year(&self.release_date)
    }

    pub fn poster_url(&self) -> Option<String> {
        poster_url(POSTER_CARD_BASE, self.poster_path.as_deref())
    }

    /// `Title (2010)`, or just the title when the release date is unknown.
    pub fn display_title(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

impl MovieSuggestion {
    pub fn release_year(&self) -> Option<i32> {
        release_year(&self.release_date)
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        poster_url(POSTER_THUMB_BASE, self.poster_path.as_deref())
    }
}

impl From<Movie> for MovieSuggestion {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            release_date: movie.release_date,
            poster_path: movie.poster_path,
        }
    }
}

impl GenreFilter {
    pub fn genre_id(&self) -> Option<u64> {
        match self {
            GenreFilter::All => None,
            GenreFilter::Genre(id) => Some(*id),
        }
    }
}

impl FromStr for GenreFilter {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(GenreFilter::All);
        }
        s.parse::<u64>()
            .map(GenreFilter::Genre)
            .map_err(|_| anyhow::anyhow!("genre must be 'all' or a numeric id, got '{}'", s))
    }
}

impl fmt::Display for GenreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreFilter::All => write!(f, "all"),
            GenreFilter::Genre(id) => write!(f, "{}", id),
        }
    }
}

pub fn release_year(date: &str) -> Option<i32> {
    let date = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(parsed.year());
    }
    let head = date.get(..4)?;
    if head.chars().all(|c| c.is_ascii_digit()) {
        return head.parse().ok();
    }
    None
}

fn poster_url(base: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty()).map(|p| format!("{base}{p}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn release_year_handles_full_partial_and_missing_dates() {
        assert_eq!(release_year("2010-07-15"), Some(2010));
        assert_eq!(release_year("1999"), Some(1999));
        assert_eq!(release_year(""), None);
        assert_eq!(release_year("soon"), None);
    }

    #[test]
    fn genre_filter_parses_all_and_ids() {
        assert_eq!("all".parse::<GenreFilter>().unwrap(), GenreFilter::All);
        assert_eq!("".parse::<GenreFilter>().unwrap(), GenreFilter::All);
        assert_eq!("28".parse::<GenreFilter>().unwrap(), GenreFilter::Genre(28));
        assert!("action".parse::<GenreFilter>().is_err());
        assert_eq!(GenreFilter::Genre(28).to_string(), "28");
    }

    #[test]
    fn movie_deserializes_with_null_poster_and_missing_fields() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 27205,
            "title": "Inception",
            "poster_path": null
        }))
        .expect("movie deserialize");
        assert_eq!(movie.id, 27205);
        assert_eq!(movie.poster_url(), None);
        assert_eq!(movie.display_title(), "Inception");
        assert!(movie.genre_ids.is_empty());
    }

    #[test]
    fn poster_urls_use_size_specific_bases() {
        let movie = Movie {
            id: 1,
            title: "Inception".to_string(),
            release_date: "2010-07-15".to_string(),
            poster_path: Some("/abc.jpg".to_string()),
            overview: String::new(),
            genre_ids: vec![],
        };
        assert_eq!(
            movie.poster_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        let suggestion = MovieSuggestion::from(movie);
        assert_eq!(
            suggestion.thumbnail_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w92/abc.jpg")
        );
    }
}
