use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::summary::SummaryError;
use crate::views;

/// Terminal failures of a page or API request.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Summary(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "Not found",
            AppError::InvalidInput(_) => "Bad request",
            AppError::Summary(_) => "Backend offline",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let page = views::error_page(self.title(), &self.to_string());
        (self.status(), Html(page)).into_response()
    }
}

/// `AppError` rendered as `{"error": "..."}` for the JSON routes.
#[derive(Debug)]
pub struct JsonError(pub AppError);

impl From<AppError> for JsonError {
    fn from(err: AppError) -> Self {
        JsonError(err)
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.0.to_string() }));
        (self.0.status(), body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
