use std::collections::HashMap;
use std::time::Duration;

pub use http::HeaderName;
pub use http::header;
pub use reqwest::Body;
use reqwest::Method;
use reqwest::Url;
pub use reqwest::multipart;
use tracing::Instrument;
use tracing::debug;
use tracing::debug_span;

use crate::exception::CoreRsResult;

pub struct HttpClient {
    client: reqwest::Client,
}

pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<HeaderName, String>,
    body: Option<HttpBody>,
}

enum HttpBody {
    Text(String),
    Form(String),
    Multipart(multipart::Form),
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: String) -> Self {
        HttpRequest {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn body(&mut self, body: String, content_type: impl Into<String>) {
        self.body = Some(HttpBody::Text(body));
        self.headers.insert(header::CONTENT_TYPE, content_type.into());
    }

    /// Sets an `application/x-www-form-urlencoded` body, values are not logged.
    pub fn form(&mut self, fields: &[(&str, &str)]) {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.body = Some(HttpBody::Form(body));
        self.headers.insert(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".to_owned(),
        );
    }

    /// Sets a multipart body, content type with boundary is assigned when the request is sent.
    pub fn multipart(&mut self, form: multipart::Form) {
        self.body = Some(HttpBody::Multipart(form));
        self.headers.remove(&header::CONTENT_TYPE);
    }

    pub fn bearer_auth(&mut self, token: &str) {
        self.headers.insert(header::AUTHORIZATION, format!("Bearer {token}"));
    }
}

#[derive(Debug, Clone, Copy)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    OPTIONS,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => Method::GET,
            HttpMethod::POST => Method::POST,
            HttpMethod::PUT => Method::PUT,
            HttpMethod::DELETE => Method::DELETE,
            HttpMethod::OPTIONS => Method::OPTIONS,
        }
    }
}

pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<HeaderName, String>,
    pub body: String,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> CoreRsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(300))
            .connection_verbose(false)
            .build()
            .map_err(|err| exception!(message = "failed to build http client", source = err))?;
        Ok(HttpClient { client })
    }

    pub async fn execute(&self, request: HttpRequest) -> CoreRsResult<HttpResponse> {
        let span = debug_span!("http_client", url = request.url, method = ?request.method);
        async {
            debug!(method = ?request.method, "[request]");
            debug!(url = request.url, "[request]");
            let url = Url::parse(&request.url)?;
            let mut builder = self.client.request(request.method.into(), url);
            for (key, value) in request.headers {
                if key == header::AUTHORIZATION {
                    debug!("[header] {key}=******");
                } else {
                    debug!("[header] {key}={value}");
                }
                builder = builder.header(key, value);
            }
            builder = match request.body {
                Some(HttpBody::Text(body)) => {
                    debug!("[request] body={body}");
                    builder.body(body)
                }
                Some(HttpBody::Form(body)) => {
                    debug!(request_content_length = body.len(), "[request] form body");
                    builder.body(body)
                }
                Some(HttpBody::Multipart(form)) => {
                    debug!(boundary = form.boundary(), "[request] multipart body");
                    builder.multipart(form)
                }
                None => builder,
            };

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let mut headers = HashMap::new();
            debug!(status, "[response]");
            for (key, value) in response.headers() {
                let value = value.to_str()?;
                debug!("[header] {key}={value}");
                headers.insert(key.to_owned(), value.to_owned());
            }

            let body = response.text().await?;
            if let Some(content_type) = headers.get(&header::CONTENT_TYPE)
                && (content_type.contains("json") || content_type.contains("text"))
            {
                debug!("[response] body={body}");
            }

            Ok(HttpResponse { status, headers, body })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::HttpMethod;
    use super::HttpRequest;
    use super::header;

    #[test]
    fn form() {
        let mut request = HttpRequest::new(HttpMethod::POST, "http://localhost/token".to_owned());
        request.form(&[("grant_type", "authorization_code"), ("code", "a b&c")]);

        assert_eq!(
            request.headers.get(&header::CONTENT_TYPE).map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
        match request.body {
            Some(super::HttpBody::Form(ref body)) => {
                assert_eq!(body, "grant_type=authorization_code&code=a+b%26c");
            }
            _ => panic!("expected form body"),
        }
    }

    #[test]
    fn bearer_auth() {
        let mut request = HttpRequest::new(HttpMethod::GET, "http://localhost/".to_owned());
        request.bearer_auth("token");
        assert_eq!(
            request.headers.get(&header::AUTHORIZATION).map(String::as_str),
            Some("Bearer token")
        );
    }
}
