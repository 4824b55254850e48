use std::str;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::debug_handler;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::Uri;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use framework::exception;
use framework::exception::Severity;
use framework::exception::error_code;
use framework::log;
use framework::web::body::Html;
use framework::web::body::Redirect;
use framework::web::error::HttpResult;
use tracing::debug;

use crate::AppState;
use crate::archive;
use crate::page;
use crate::request::ArchivalRequest;
use crate::request::Params;
use crate::session;
use crate::session::AuthorizationEvidence;

const ERROR_PAGE: &str = "/error.html";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(archive_files).post(archive_files))
        .route("/archive", get(archive_files).post(archive_files))
}

#[debug_handler]
async fn archive_files(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResult<Response> {
    let form = if method == Method::POST && is_form(&headers) {
        let form = str::from_utf8(&body).map_err(|err| {
            exception!(
                severity = Severity::Warn,
                code = error_code::BAD_REQUEST,
                message = "form body must be utf-8",
                source = err
            )
        })?;
        Some(form)
    } else {
        None
    };
    let params = Params::parse(uri.query(), form);
    let evidence = AuthorizationEvidence::new(&params);

    if let Some(session) =
        session::try_establish_session(&state.box_api, &evidence, &state.client_id, &state.client_secret).await
    {
        let request = ArchivalRequest::new(&state.directory, &params);
        debug!(
            directory = %request.directory.to_string_lossy(),
            min_age = %request.min_age,
            preserve = request.preserve,
            "context"
        );
        let folder = session.folder(&state.target_folder_id);
        let archived = archive::archive(&request.directory, &folder, request.min_age, request.preserve).await;
        return Ok(Html(page::archived_files(&archived)).into_response());
    }

    let request_url = request_url(&headers, &uri);
    match session::build_login_redirect(
        &request_url,
        uri.query(),
        &state.client_id,
        state.box_api.authorize_uri(),
    ) {
        Ok(url) => Ok(Redirect(url.into()).into_response()),
        Err(e) => {
            log::log_exception(&e);
            Ok(Redirect(ERROR_PAGE.to_owned()).into_response())
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

// scheme, host and path the client used, without query
fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()));
    match host {
        Some(host) => format!("{scheme}://{host}{}", uri.path()),
        None => uri.path().to_owned(),
    }
}
