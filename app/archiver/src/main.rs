use std::path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use framework::asset::asset_path;
use framework::exception::CoreRsResult;
use framework::http::HttpClient;
use framework::json;
use framework::log;
use framework::shutdown::Shutdown;
use framework::web::server::HttpServerConfig;
use framework::web::server::ServeFile;
use framework::web::server::start_http_server;
use serde::Deserialize;
use tracing::info;

use crate::box_api::BoxApi;
use crate::box_api::BoxEndpoints;

mod archive;
mod box_api;
mod page;
mod request;
mod session;
mod storage;
mod web;

#[derive(Deserialize)]
struct AppConfig {
    box_client_id: String,
    box_client_secret: String,
    box_target_folder_id: String,
    directory_to_archive: String,
    bind_address: Option<String>,
}

pub struct AppState {
    box_api: BoxApi,
    client_id: String,
    client_secret: String,
    target_folder_id: String,
    directory: PathBuf,
}

impl AppState {
    fn new(config: &AppConfig) -> CoreRsResult<Self> {
        Ok(AppState {
            box_api: BoxApi::new(BoxEndpoints::default(), HttpClient::new(Duration::from_secs(30))?),
            client_id: config.box_client_id.clone(),
            client_secret: config.box_client_secret.clone(),
            target_folder_id: config.box_target_folder_id.clone(),
            directory: path::absolute(&config.directory_to_archive)?,
        })
    }
}

#[tokio::main]
async fn main() -> CoreRsResult<()> {
    log::init();

    let config: AppConfig = json::load_file(&asset_path("assets/conf.json")?)?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    shutdown.listen();

    let state = Arc::new(AppState::new(&config)?);
    info!(
        "archive files, directory={}, folder_id={}",
        state.directory.to_string_lossy(),
        state.target_folder_id
    );

    let app = Router::new();
    let app = app.merge(web::routes());
    let app = app.route_service("/error.html", ServeFile::new(asset_path("assets/web/error.html")?));
    let app = app.with_state(state);

    let mut server_config = HttpServerConfig::default();
    if let Some(bind_address) = config.bind_address {
        server_config.bind_address = bind_address;
    }
    start_http_server(app, signal, server_config).await
}
