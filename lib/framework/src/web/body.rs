use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use tracing::debug;
use tracing::warn;

pub struct Html(pub String);

impl IntoResponse for Html {
    fn into_response(self) -> Response {
        let body = self.0;
        let length = body.len();
        debug!(response_content_length = length, "stats");
        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/html;charset=UTF-8")),
                (header::CONTENT_LENGTH, HeaderValue::from(length)),
            ],
            body,
        )
            .into_response()
    }
}

/// 302 redirect, `location` may be absolute or relative to the request path.
pub struct Redirect(pub String);

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let location = self.0;
        debug!(location, "[response] redirect");
        match HeaderValue::from_str(&location) {
            Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
            Err(err) => {
                warn!("invalid redirect location, location={location}, error={err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::http::header;
    use axum::response::IntoResponse;

    use super::Html;
    use super::Redirect;

    #[test]
    fn html() {
        let response = Html("<p>ok</p>".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/html;charset=UTF-8")
        );
        assert_eq!(
            response.headers().get(header::CONTENT_LENGTH).and_then(|v| v.to_str().ok()),
            Some("9")
        );
    }

    #[test]
    fn redirect() {
        let response = Redirect("https://account.box.com/api/oauth2/authorize".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("https://account.box.com/api/oauth2/authorize")
        );

        let response = Redirect("bad\nlocation".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
