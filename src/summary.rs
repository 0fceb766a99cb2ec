use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Backend not working: API is offline.")]
    BackendUnavailable { attempts: usize },
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed with status: {0}")]
    Status(StatusCode),
    #[error("response was not a JSON summary: {0}")]
    Body(String),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, movie_title: &str) -> Result<String, SummaryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEndpoint {
    pub role: EndpointRole,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryState {
    Idle,
    RequestingPrimary,
    RequestingFallback,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SummaryClient {
    client: Client,
    endpoints: Vec<SummaryEndpoint>,
}

impl SummaryEndpoint {
    fn summarize_url(&self) -> String {
        format!("{}/summarize", self.base_url.trim_end_matches('/'))
    }

    fn requesting_state(&self) -> SummaryState {
        match self.role {
            EndpointRole::Primary => SummaryState::RequestingPrimary,
            EndpointRole::Fallback => SummaryState::RequestingFallback,
        }
    }
}

impl SummaryClient {
    /// `primary` is optional; every entry in `fallbacks` is tried in order
    /// after it.
    pub fn new(primary: Option<String>, fallbacks: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build summarization HTTP client")?;
        let endpoints = primary
            .into_iter()
            .map(|base_url| SummaryEndpoint {
                role: EndpointRole::Primary,
                base_url,
            })
            .chain(fallbacks.into_iter().map(|base_url| SummaryEndpoint {
                role: EndpointRole::Fallback,
                base_url,
            }))
            .collect();
        Ok(Self { client, endpoints })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut bases = config.summary_endpoints().into_iter();
        let primary = if config.summary_primary_url.is_some() {
            bases.next()
        } else {
            None
        };
        Self::new(primary, bases.collect())
    }

    pub fn endpoints(&self) -> &[SummaryEndpoint] {
        &self.endpoints
    }

    pub fn requester(&self) -> SummaryRequester<'_> {
        SummaryRequester {
            client: &self.client,
            endpoints: &self.endpoints,
            state: SummaryState::Idle,
        }
    }
}

#[async_trait]
impl Summarizer for SummaryClient {
    async fn summarize(&self, movie_title: &str) -> Result<String, SummaryError> {
        self.requester().run(movie_title).await
    }
}

/// A single summarization attempt sequence. Walks the endpoint list once and
/// ends in `Done` or `Failed`; it never restarts.
pub struct SummaryRequester<'a> {
    client: &'a Client,
    endpoints: &'a [SummaryEndpoint],
    state: SummaryState,
}

impl<'a> SummaryRequester<'a> {
    pub fn state(&self) -> SummaryState {
        self.state
    }

    pub async fn run(&mut self, movie_title: &str) -> Result<String, SummaryError> {
        let mut attempts = 0;
        for endpoint in self.endpoints {
            self.state = endpoint.requesting_state();
            attempts += 1;
            debug!(
                "Requesting summary for '{}' from {} ({:?})",
                movie_title, endpoint.base_url, endpoint.role
            );
            match self.attempt(endpoint, movie_title).await {
                Ok(markdown) => {
                    info!(
                        "Summary for '{}' served by {} after {} attempt(s)",
                        movie_title, endpoint.base_url, attempts
                    );
                    self.state = SummaryState::Done;
                    return Ok(markdown);
                }
                Err(e) => warn!(
                    "Summary endpoint {} ({:?}) {}. Attempting next endpoint.",
                    endpoint.base_url, endpoint.role, e
                ),
            }
        }
        self.state = SummaryState::Failed;
        error!(
            "Error fetching summary for '{}': all {} endpoint(s) failed",
            movie_title, attempts
        );
        Err(SummaryError::BackendUnavailable { attempts })
    }

    async fn attempt(
        &self,
        endpoint: &SummaryEndpoint,
        movie_title: &str,
    ) -> Result<String, AttemptError> {
        let res = self
            .client
            .post(endpoint.summarize_url())
            .header(header::ACCEPT, "application/json")
            .json(&json!({ "moviename": movie_title }))
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }
        let text = res.text().await?;
        parse_summary_body(&text)
    }
}

/// Accepts a JSON string, or an object carrying a string `summary` field.
fn parse_summary_body(text: &str) -> Result<String, AttemptError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AttemptError::Body(e.to_string()))?;
    match value {
        Value::String(markdown) => Ok(markdown),
        Value::Object(map) => match map.get("summary") {
            Some(Value::String(markdown)) => Ok(markdown.clone()),
            _ => Err(AttemptError::Body("object without a summary field".to_string())),
        },
        other => Err(AttemptError::Body(format!("unexpected JSON value {}", other))),
    }
}
