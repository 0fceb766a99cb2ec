use movierag::models::GenreFilter;
use movierag::summary::{SummaryClient, SummaryError, SummaryState, Summarizer};
use movierag::tmdb::{MetadataApi, TmdbClient};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn search_hit(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Movie {id}"),
        "release_date": "2010-07-15",
        "poster_path": null,
        "overview": "",
        "genre_ids": [28],
        "popularity": 10.0
    })
}

fn tmdb(server: &MockServer) -> TmdbClient {
    TmdbClient::new(API_KEY, server.uri()).expect("client")
}

#[tokio::test]
async fn search_sends_key_and_query_and_keeps_five() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", API_KEY))
        .and(query_param("query", "The Matrix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": (1..=8).map(search_hit).collect::<Vec<_>>()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = tmdb(&server).search_movies("The Matrix").await;
    let ids: Vec<u64> = results.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn search_without_results_field_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    assert!(tmdb(&server).search_movies("Inc").await.is_empty());
}

#[tokio::test]
async fn search_failure_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(tmdb(&server).search_movies("Inc").await.is_empty());
}

#[tokio::test]
async fn genres_are_returned_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [{ "id": 28, "name": "Action" }, { "id": 35, "name": "Comedy" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let genres = tmdb(&server).list_genres().await;
    let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Action", "Comedy"]);
}

#[tokio::test]
async fn genre_failure_is_empty_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    assert!(tmdb(&server).list_genres().await.is_empty());
}

#[tokio::test]
async fn discover_all_omits_genre_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("sort_by", "popularity.desc"))
        .and(query_param("include_adult", "false"))
        .and(query_param("page", "1"))
        .and(query_param_is_missing("with_genres"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": (1..=12).map(search_hit).collect::<Vec<_>>()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let movies = tmdb(&server).discover_by_genre(GenreFilter::All).await;
    assert_eq!(movies.len(), 10);
}

#[tokio::test]
async fn discover_by_genre_filters_and_orders_by_popularity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("with_genres", "35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": 1, "title": "Low", "genre_ids": [35], "popularity": 1.5 },
                { "id": 2, "title": "Wrong genre", "genre_ids": [28], "popularity": 99.0 },
                { "id": 3, "title": "High", "genre_ids": [35, 18], "popularity": 42.0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let movies = tmdb(&server).discover_by_genre(GenreFilter::Genre(35)).await;
    let ids: Vec<u64> = movies.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn details_parse_and_fail_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/27205"))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 27205,
            "title": "Inception",
            "release_date": "2010-07-15",
            "poster_path": "/inception.jpg",
            "overview": "Dreams within dreams."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_code": 34,
            "status_message": "The resource you requested could not be found."
        })))
        .mount(&server)
        .await;

    let client = tmdb(&server);
    let movie = client.get_movie_details(27205).await.expect("details");
    assert_eq!(movie.title, "Inception");
    assert_eq!(movie.release_year(), Some(2010));
    assert!(client.get_movie_details(1).await.is_err());
}

async fn summarize_mock(server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({ "moviename": "Inception" })))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn primary_success_skips_fallback() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    summarize_mock(&primary, ResponseTemplate::new(200).set_body_json(json!("# Plot")), 1).await;
    summarize_mock(&fallback, ResponseTemplate::new(200).set_body_json(json!("unused")), 0).await;

    let client = SummaryClient::new(Some(primary.uri()), vec![fallback.uri()]).unwrap();
    let mut requester = client.requester();
    assert_eq!(requester.run("Inception").await.unwrap(), "# Plot");
    assert_eq!(requester.state(), SummaryState::Done);
}

#[tokio::test]
async fn failing_primary_falls_back() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    summarize_mock(&primary, ResponseTemplate::new(500), 1).await;
    summarize_mock(
        &fallback,
        ResponseTemplate::new(200).set_body_json(json!({ "summary": "X" })),
        1,
    )
    .await;

    let client = SummaryClient::new(Some(primary.uri()), vec![fallback.uri()]).unwrap();
    let mut requester = client.requester();
    assert_eq!(requester.run("Inception").await.unwrap(), "X");
    assert_eq!(requester.state(), SummaryState::Done);
}

#[tokio::test]
async fn non_json_primary_body_counts_as_failure() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    summarize_mock(
        &primary,
        ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
        1,
    )
    .await;
    summarize_mock(&fallback, ResponseTemplate::new(200).set_body_json(json!("ok")), 1).await;

    let client = SummaryClient::new(Some(primary.uri()), vec![fallback.uri()]).unwrap();
    assert_eq!(client.summarize("Inception").await.unwrap(), "ok");
}

#[tokio::test]
async fn unreachable_primary_falls_back() {
    let fallback = MockServer::start().await;
    summarize_mock(&fallback, ResponseTemplate::new(200).set_body_json(json!("ok")), 1).await;

    let client = SummaryClient::new(
        Some("http://127.0.0.1:9".to_string()),
        vec![fallback.uri()],
    )
    .unwrap();
    assert_eq!(client.summarize("Inception").await.unwrap(), "ok");
}

#[tokio::test]
async fn missing_primary_goes_straight_to_fallback() {
    let fallback = MockServer::start().await;
    summarize_mock(&fallback, ResponseTemplate::new(200).set_body_json(json!("ok")), 1).await;

    let client = SummaryClient::new(None, vec![fallback.uri()]).unwrap();
    assert_eq!(client.summarize("Inception").await.unwrap(), "ok");
}

#[tokio::test]
async fn both_failing_is_terminal_with_one_call_each() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    summarize_mock(&primary, ResponseTemplate::new(502), 1).await;
    summarize_mock(&fallback, ResponseTemplate::new(404), 1).await;

    let client = SummaryClient::new(Some(primary.uri()), vec![fallback.uri()]).unwrap();
    let mut requester = client.requester();
    let err = requester.run("Inception").await.unwrap_err();
    assert!(matches!(err, SummaryError::BackendUnavailable { attempts: 2 }));
    assert_eq!(err.to_string(), "Backend not working: API is offline.");
    assert_eq!(requester.state(), SummaryState::Failed);
}
