use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;

use crate::{api, service};

/// Failure of a ticket request.
#[derive(Debug, From)]
pub enum Error {
    #[from]
    Json(JsonRejection),
    #[from]
    Path(PathRejection),
    Validation(Vec<String>),
    InvalidId(String),
    Service {
        /// What was being done, as in "Database error while <action>".
        action: &'static str,
        source: service::Error,
    },
}

impl Error {
    pub fn during(action: &'static str) -> impl FnOnce(service::Error) -> Self {
        move |source| Self::Service { action, source }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        use service::Error as S;

        let (status, body) = match self {
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                api::Error {
                    message: "Validation failed".into(),
                    errors: Some(vec![rejection.body_text()]),
                },
            ),
            Self::Path(rejection) => {
                tracing::debug!(%rejection, "invalid path parameter");
                (
                    StatusCode::BAD_REQUEST,
                    api::Error::new("Invalid value for parameter 'id'"),
                )
            }
            Self::InvalidId(raw) => (
                StatusCode::BAD_REQUEST,
                api::Error::new(format!(
                    "Invalid value for parameter 'id': {raw}"
                )),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                api::Error {
                    message: "Validation failed".into(),
                    errors: Some(errors),
                },
            ),
            Self::Service { action, source } => match source {
                S::TicketNotFound(_) => {
                    (StatusCode::NOT_FOUND, api::Error::new(source.to_string()))
                }
                S::TicketClosed
                | S::TicketNotClosed
                | S::FeedbackAlreadySubmitted
                | S::AgentRequired => (
                    StatusCode::BAD_REQUEST,
                    api::Error::new(source.to_string()),
                ),
                S::Store(ref e) => {
                    tracing::error!(error = %e, "database error while {action}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        api::Error::new(format!(
                            "Database error while {action}"
                        )),
                    )
                }
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Collects every problem of a request body before rejecting it.
#[derive(Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn required<T>(
        &mut self,
        field: &str,
        message: &str,
        value: Option<T>,
    ) -> Option<T> {
        if value.is_none() {
            self.0.push(format!("{field}: {message}"));
        }
        value
    }

    /// Like [`Violations::required`], but also rejects blank strings.
    pub fn not_blank(
        &mut self,
        field: &str,
        message: &str,
        value: Option<String>,
    ) -> Option<String> {
        let value = value.filter(|v| !v.trim().is_empty());
        self.required(field, message, value)
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push(format!("{field}: {message}"));
    }

    /// Returns `value` if nothing was violated.
    pub fn check<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Error> {
        match value() {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(Error::Validation(self.0)),
        }
    }
}
