use crate::config::Config;
use crate::debounce::{DebounceConfig, DebounceHandle, SuggestionDebouncer, MIN_QUERY_CHARS};
use crate::error::{AppError, AppResult, JsonError};
use crate::models::{GenreFilter, Movie, MovieSuggestion, Summary};
use crate::summary::{SummaryClient, Summarizer};
use crate::tmdb::{MetadataApi, TmdbClient};
use crate::views::browse::{self, BrowsePage};
use crate::views::home::{self, HomePage};
use crate::views::summary::{self as summary_view, SummaryPage};
use crate::views::ViewState;
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024; // pages and sockets only, no uploads

#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataApi>,
    pub summarizer: Arc<dyn Summarizer>,
    pub debounce: DebounceConfig,
}

pub async fn run_server(config: Config) -> Result<()> {
    let metadata: Arc<dyn MetadataApi> = Arc::new(TmdbClient::from_config(&config)?);
    let summarizer: Arc<dyn Summarizer> = Arc::new(SummaryClient::from_config(&config)?);

    let state = AppState {
        metadata,
        summarizer,
        debounce: DebounceConfig::default(),
    };

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/browse", get(browse_page))
        .route("/summary/:movie_id", get(summary_page))
        .route("/api/suggestions", get(api_suggestions))
        .route("/api/movies/:movie_id", get(api_movie))
        .route("/ws/suggestions", get(suggestion_socket_upgrade))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct HomeQuery {
    movie: Option<String>,
    title: Option<String>,
}

async fn home_page(
    State(state): State<AppState>,
    Query(params): Query<HomeQuery>,
) -> AppResult<Html<String>> {
    let mut page = HomePage::new(params.title.filter(|t| !t.trim().is_empty()));

    if let Some(raw) = params.movie.as_deref().filter(|m| !m.trim().is_empty()) {
        let movie_id = parse_movie_id(raw)?;
        page.movie = page.movie.begin();
        let result = state.metadata.get_movie_details(movie_id).await;
        if let Err(e) = &result {
            warn!("Error fetching movie {}: {:#}", movie_id, e);
        }
        page.movie = page.movie.finish(result);
    }

    Ok(Html(home::render(&page)))
}

#[derive(Debug, Deserialize)]
struct BrowseQuery {
    genre: Option<String>,
}

async fn browse_page(
    State(state): State<AppState>,
    Query(params): Query<BrowseQuery>,
) -> AppResult<Html<String>> {
    let selected: GenreFilter = params
        .genre
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string()))?;

    let movies = ViewState::Idle.begin();
    let (genres, discovered) = tokio::join!(
        state.metadata.list_genres(),
        state.metadata.discover_by_genre(selected)
    );
    debug!(
        genre = %selected,
        genres = genres.len(),
        movies = discovered.len(),
        "Browse page data loaded"
    );

    let page = BrowsePage {
        selected,
        genres,
        movies: movies.finish(Ok::<_, Infallible>(discovered)),
    };
    Ok(Html(browse::render(&page)))
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    length: Option<String>,
}

async fn summary_page(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<SummaryQuery>,
) -> AppResult<Response> {
    // An id that can never resolve is reported like any other missing movie.
    let movie_id =
        parse_movie_id(&raw_id).map_err(|_| AppError::NotFound(raw_id.trim().to_string()))?;
    let length = summary_view::parse_length(params.length.as_deref());

    let movie = state
        .metadata
        .get_movie_details(movie_id)
        .await
        .map_err(|e| {
            warn!("Summary view: {:#}", e);
            AppError::NotFound(movie_id.to_string())
        })?;

    // `length` is accepted for the URL contract only; the backend takes a title.
    info!(movie_id, length, "Generating summary for '{}'", movie.title);
    let summary = ViewState::Idle.begin();
    let result = state
        .summarizer
        .summarize(&movie.title)
        .await
        .map(|markdown| Summary { movie_id, markdown });
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let page = SummaryPage {
        movie,
        length,
        summary: summary.finish(result),
    };
    Ok((status, Html(summary_view::render(&page))).into_response())
}

#[derive(Debug, Deserialize)]
struct SuggestionQuery {
    q: Option<String>,
}

async fn api_suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionQuery>,
) -> Json<Vec<MovieSuggestion>> {
    let query = params.q.unwrap_or_default();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Json(Vec::new());
    }
    Json(state.metadata.search_movies(&query).await)
}

async fn api_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Movie>, JsonError> {
    let movie_id = parse_movie_id(&raw_id)?;
    let movie = state
        .metadata
        .get_movie_details(movie_id)
        .await
        .map_err(|e| {
            warn!("{:#}", e);
            AppError::NotFound(movie_id.to_string())
        })?;
    Ok(Json(movie))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientFrame {
    Input { query: String },
    Clear,
}

async fn suggestion_socket_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| suggestion_socket(socket, state))
}

/// One debouncer per connected search box; it stops when the socket closes.
async fn suggestion_socket(mut socket: WebSocket, state: AppState) {
    let (handle, mut updates) = SuggestionDebouncer::spawn(state.metadata.clone(), state.debounce);
    debug!("Suggestion socket opened");

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if !dispatch_frame(&handle, &text) {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Suggestion socket error: {}", e);
                    break;
                }
            },
            update = updates.recv() => {
                let Some(update) = update else {
                    break;
                };
                let payload = match serde_json::to_string(&update) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Failed to encode suggestions: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Suggestion socket closed");
}

/// Routes one text frame from the search box to its debouncer. Malformed
/// frames are dropped; returns `false` once the debouncer has stopped.
fn dispatch_frame(handle: &DebounceHandle, text: &str) -> bool {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Input { query }) => handle.input(query),
        Ok(ClientFrame::Clear) => handle.clear(),
        Err(e) => {
            debug!("Ignoring malformed suggestion frame: {}", e);
            true
        }
    }
}

fn parse_movie_id(raw: &str) -> AppResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not a movie id", raw)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
