//! Query TMDB through the metadata client and print what the pages would see.
//! Usage:
//!   cargo run --bin tmdb_props -- search <query>
//!   cargo run --bin tmdb_props -- genres
//!   cargo run --bin tmdb_props -- discover <all|genre_id>
//!   cargo run --bin tmdb_props -- movie <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use movierag::config::DEFAULT_TMDB_BASE;
use movierag::models::GenreFilter;
use movierag::tmdb::{MetadataApi, TmdbClient};
use serde_json::json;
use std::env;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Search(String),
    Genres,
    Discover(GenreFilter),
    Movie(u64),
}

fn parse_args(args: &[String]) -> Result<Command> {
    let kind = args
        .get(1)
        .map(|s| s.to_lowercase())
        .ok_or_else(|| anyhow::anyhow!("missing command"))?;
    match kind.as_str() {
        "search" => {
            let query = args[2..].join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("missing search query");
            }
            Ok(Command::Search(query))
        }
        "genres" => Ok(Command::Genres),
        "discover" => Ok(Command::Discover(
            args.get(2).map(String::as_str).unwrap_or("all").parse()?,
        )),
        "movie" => Ok(Command::Movie(
            args.get(2)
                .ok_or_else(|| anyhow::anyhow!("missing tmdb id"))?
                .parse()
                .context("tmdb_id must be an integer")?,
        )),
        other => anyhow::bail!("unknown command '{}'", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: cargo run --bin tmdb_props -- search <query>");
            eprintln!("       cargo run --bin tmdb_props -- genres");
            eprintln!("       cargo run --bin tmdb_props -- discover <all|genre_id>");
            eprintln!("       cargo run --bin tmdb_props -- movie <tmdb_id>");
            std::process::exit(1);
        }
    };

    let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
    let base = env::var("TMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_TMDB_BASE.to_string());
    let client = TmdbClient::new(api_key, base)?;

    let output = match command {
        Command::Search(query) => {
            let results = client.search_movies(&query).await;
            json!({ "query": query, "suggestions": results })
        }
        Command::Genres => json!({ "genres": client.list_genres().await }),
        Command::Discover(filter) => {
            let movies = client.discover_by_genre(filter).await;
            json!({ "genre": filter.to_string(), "movies": movies })
        }
        Command::Movie(id) => {
            let movie = client.get_movie_details(id).await?;
            json!({
                "movie": movie,
                "display_title": movie.display_title(),
                "poster": movie.poster_url(),
            })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
