use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Theater is full: {0}")]
    Full(String),

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Config: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> Response {
        match self {
            AppErr::NotFound(instance) => Problem::new(
                "/errors/not-found",
                "Resource Does Not Exist",
                StatusCode::NOT_FOUND,
                "The resource specified is missing and does not exist.",
                instance,
            ),
            AppErr::Full(instance) => Problem::new(
                "/errors/theater-full",
                "Theater Is Full",
                StatusCode::CONFLICT,
                "Every seat in this theater is taken.",
                instance,
            ),
            AppErr::Unimplemented(instance) => Problem::new(
                "/errors/unimplemented",
                "API Call is unimplemented",
                StatusCode::NOT_IMPLEMENTED,
                "This API Call is not implemented currently and is unavailable",
                instance,
            ),
            other => Problem::new(
                "/errors/internal",
                "Internal Server Error",
                StatusCode::INTERNAL_SERVER_ERROR,
                other.to_string(),
                "/".to_string(),
            ),
        }
        .into_response()
    }
}

/* ── RFC 7807 problem body ── */
#[derive(Debug, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind:     &'static str,
    pub title:    &'static str,
    pub status:   u16,
    pub detail:   String,
    pub instance: String,
}

impl Problem {
    pub fn new(
        kind: &'static str,
        title: &'static str,
        status: StatusCode,
        detail: impl Into<String>,
        instance: String,
    ) -> Self {
        Self { kind, title, status: status.as_u16(), detail: detail.into(), instance }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, [(header::CONTENT_TYPE, "application/problem+json")], Json(self)).into_response()
    }
}
