use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
pub use tower_http::services::ServeFile;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::exception::CoreRsResult;
use crate::log;
use crate::web::client_info::client_info;

pub struct HttpServerConfig {
    pub bind_address: String,
    pub max_forwarded_ips: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        HttpServerConfig {
            bind_address: "0.0.0.0:8080".to_owned(),
            max_forwarded_ips: 2,
        }
    }
}

pub async fn start_http_server(
    router: Router,
    mut shutdown_signal: broadcast::Receiver<()>,
    config: HttpServerConfig,
) -> CoreRsResult<()> {
    let max_forwarded_ips = config.max_forwarded_ips;
    let app = Router::new();
    let app = app.merge(router);
    let app = app.layer(middleware::from_fn(move |request: Request, next: Next| {
        http_server_layer(request, next, max_forwarded_ips)
    }));
    let app = app.into_make_service_with_connect_info::<SocketAddr>();
    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("http server started, bind={}", config.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = shutdown_signal.recv().await {
                warn!("shutdown signal lost, stop http server, error={err}");
            }
        })
        .await?;
    info!("http server stopped");

    Ok(())
}

async fn http_server_layer(mut request: Request, next: Next, max_forwarded_ips: usize) -> Response {
    // skip log for health check
    if request.uri().path() == "/health-check" {
        return StatusCode::OK.into_response();
    }

    let mut response = None;
    log::start_action("http", None, async {
        let method = request.method().clone();
        let uri = request.uri();
        debug!(method = ?method, "[request]");
        debug!(uri = ?uri, "[request]");
        for (name, value) in request.headers() {
            if name != header::COOKIE && name != header::AUTHORIZATION {
                debug!("[header] {name}={value:?}");
            }
        }

        debug!(uri = ?uri, method = ?method, "context");

        let client_info = client_info(&request, max_forwarded_ips);
        debug!(client_ip = client_info.client_ip, "context");
        if let Some(ref user_agent) = client_info.user_agent {
            debug!(user_agent, "context");
        }
        request.extensions_mut().insert(Arc::new(client_info));

        if let Some(matched_path) = request.extensions().get::<MatchedPath>() {
            debug!(matched_path = matched_path.as_str(), "context");
        }

        let http_response = next.run(request).await;

        let status = http_response.status().as_u16();
        debug!(status, "[response]");
        debug!(response_status = status, "context");
        for (name, value) in http_response.headers() {
            debug!("[header] {name}={value:?}");
        }
        response = Some(http_response);
        Ok(())
    })
    .await;
    response.unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use tokio::sync::broadcast;

    use super::HttpServerConfig;

    #[tokio::test]
    async fn stop_when_shutdown_sender_dropped() {
        let (sender, receiver) = broadcast::channel::<()>(1);
        drop(sender);
        let config = HttpServerConfig {
            bind_address: "127.0.0.1:0".to_owned(),
            ..HttpServerConfig::default()
        };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            super::start_http_server(Router::new(), receiver, config),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }
}
