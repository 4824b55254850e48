use framework::exception;
use framework::exception::CoreRsResult;
use framework::exception::error_code;
use framework::http::Body;
use framework::http::HttpClient;
use framework::http::HttpMethod::OPTIONS;
use framework::http::HttpMethod::POST;
use framework::http::HttpRequest;
use framework::http::multipart::Form;
use framework::http::multipart::Part;
use framework::json;
use serde::Deserialize;
use serde::Serialize;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::Instrument;
use tracing::debug;
use tracing::debug_span;

use crate::storage::CAPABILITY_CHECK_FAILED;
use crate::storage::Folder;
use crate::storage::UPLOAD_FAILED;
use crate::storage::UploadReceipt;

pub const AUTH_EXCHANGE_FAILED: &str = "AUTH_EXCHANGE_FAILED";

pub struct BoxEndpoints {
    pub api_uri: String,
    pub upload_uri: String,
    pub authorize_uri: String,
}

impl Default for BoxEndpoints {
    fn default() -> Self {
        BoxEndpoints {
            api_uri: "https://api.box.com".to_owned(),
            upload_uri: "https://upload.box.com/api".to_owned(),
            authorize_uri: "https://account.box.com/api/oauth2/authorize".to_owned(),
        }
    }
}

pub struct BoxApi {
    endpoints: BoxEndpoints,
    client: HttpClient,
}

impl BoxApi {
    pub fn new(endpoints: BoxEndpoints, client: HttpClient) -> Self {
        BoxApi { endpoints, client }
    }

    pub fn authorize_uri(&self) -> &str {
        &self.endpoints.authorize_uri
    }

    /// Exchanges a one-time authorization code for an access token, the code can not be reused afterwards.
    pub async fn exchange_code(&self, client_id: &str, client_secret: &str, code: &str) -> CoreRsResult<BoxSession<'_>> {
        let span = debug_span!("box", operation = "exchange_code");
        async {
            let api_uri = &self.endpoints.api_uri;
            let mut request = HttpRequest::new(POST, format!("{api_uri}/oauth2/token"));
            request.form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ]);
            let response = self.client.execute(request).await?;
            if response.status != 200 {
                let error = json::from_json(&response.body)
                    .map(|error: OAuthError| error.error_description.unwrap_or(error.error))
                    .unwrap_or_default();
                return Err(exception!(
                    code = AUTH_EXCHANGE_FAILED,
                    message = format!(
                        "failed to exchange authorization code, status={}, error={error}",
                        response.status
                    )
                ));
            }
            let token: TokenResponse = json::from_json(&response.body).map_err(|err| {
                exception!(
                    code = AUTH_EXCHANGE_FAILED,
                    message = "failed to read access token",
                    source = err
                )
            })?;
            debug!(expires_in = token.expires_in, "access token issued");
            Ok(BoxSession {
                api: self,
                access_token: token.access_token,
            })
        }
        .instrument(span)
        .await
    }
}

/// Authenticated connection for one request, never stored beyond it.
pub struct BoxSession<'a> {
    api: &'a BoxApi,
    access_token: String,
}

impl BoxSession<'_> {
    pub fn folder(&self, id: &str) -> BoxFolder<'_> {
        BoxFolder {
            api: self.api,
            access_token: &self.access_token,
            id: id.to_owned(),
        }
    }
}

pub struct BoxFolder<'a> {
    api: &'a BoxApi,
    access_token: &'a str,
    id: String,
}

impl Folder for BoxFolder<'_> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn can_upload(&self, name: &str, size: u64) -> CoreRsResult<()> {
        let span = debug_span!("box", operation = "can_upload", folder_id = self.id);
        async {
            let api_uri = &self.api.endpoints.api_uri;
            let mut request = HttpRequest::new(OPTIONS, format!("{api_uri}/2.0/files/content"));
            request.bearer_auth(self.access_token);
            let preflight = Preflight {
                name,
                parent: Parent { id: &self.id },
                size,
            };
            request.body(json::to_json(&preflight)?, "application/json");
            let response = self.api.client.execute(request).await?;
            if response.status != 200 {
                return Err(exception!(
                    code = CAPABILITY_CHECK_FAILED,
                    message = format!(
                        "cannot upload to folder, folder_id={}, status={}",
                        self.id, response.status
                    )
                ));
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn upload(&self, file: File, name: &str) -> CoreRsResult<UploadReceipt> {
        let span = debug_span!("box", operation = "upload", folder_id = self.id, name);
        async {
            let length = file.metadata().await?.len();
            debug!(upload_bytes = length, "stats");
            let attributes = json::to_json(&Attributes {
                name,
                parent: Parent { id: &self.id },
            })?;
            let content = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
                .file_name(name.to_owned());
            let form = Form::new().text("attributes", attributes).part("file", content);

            let upload_uri = &self.api.endpoints.upload_uri;
            let mut request = HttpRequest::new(POST, format!("{upload_uri}/2.0/files/content"));
            request.bearer_auth(self.access_token);
            request.multipart(form);
            let response = self.api.client.execute(request).await?;
            if response.status != 201 {
                return Err(exception!(
                    code = UPLOAD_FAILED,
                    message = format!("failed to upload file, name={name}, status={}", response.status)
                ));
            }
            let files: FileCollection = json::from_json(&response.body)?;
            let entry = files.entries.into_iter().next().ok_or_else(|| {
                exception!(
                    code = error_code::REMOTE_SERVICE_ERROR,
                    message = format!("upload response has no file entry, name={name}")
                )
            })?;
            Ok(UploadReceipt {
                file_id: entry.id,
                name: entry.name,
            })
        }
        .instrument(span)
        .await
    }
}

#[derive(Debug, Serialize)]
struct Parent<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct Preflight<'a> {
    name: &'a str,
    parent: Parent<'a>,
    size: u64,
}

#[derive(Debug, Serialize)]
struct Attributes<'a> {
    name: &'a str,
    parent: Parent<'a>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileCollection {
    entries: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
    name: String,
}
