use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;

use crate::exception::Exception;
use crate::exception::Severity;
use crate::exception::error_code;
use crate::json;
use crate::log;

pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
pub struct HttpError {
    exception: Exception,
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self.exception.code.as_deref() {
            Some(error_code::BAD_REQUEST) => StatusCode::BAD_REQUEST,
            Some(error_code::NOT_FOUND) => StatusCode::NOT_FOUND,
            _ if self.exception.severity == Severity::Warn => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Exception> for HttpError {
    fn from(exception: Exception) -> Self {
        HttpError { exception }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    id: Option<String>,
    severity: Severity,
    error_code: Option<&'a str>,
    message: &'a str,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        log::log_exception(&self.exception);
        let status = self.status();
        let response = ErrorResponse {
            id: log::current_action_id(),
            severity: self.exception.severity,
            error_code: self.exception.code.as_deref(),
            message: &self.exception.message,
        };
        match json::to_json(&response) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            Err(_) => status.into_response(),
        }
    }
}
