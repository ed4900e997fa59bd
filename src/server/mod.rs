use axum::{
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_routes;
use crate::config::Config;
use crate::controller::SubmissionController;
use crate::handoff::DeferredLauncher;

#[derive(RustEmbed)]
#[folder = "ui/dist"]
struct Asset;

pub async fn start_server(config: &Config, port: u16, open_browser: bool) -> anyhow::Result<()> {
    // The page opens the chat link itself, in the visitor's browser.
    let controller = Arc::new(SubmissionController::from_config(config, DeferredLauncher));

    let app = Router::new()
        .merge(api_routes::api_routes(controller))
        .route("/", get(index_handler))
        .route("/*file", get(static_handler))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "contact page listening");
    println!("Starting contact page at http://{}", addr);

    if open_browser {
        let _ = open::that(format!("http://{}", addr));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler() -> impl IntoResponse {
    static_handler(Uri::from_static("/index.html")).await
}

async fn static_handler(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/').to_string();

    if path.is_empty() {
        path = "index.html".to_string();
    }

    match Asset::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => {
            if let Some(content) = Asset::get("index.html") {
                let mime = mime_guess::from_path("index.html").first_or_octet_stream();
                ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
            } else {
                (StatusCode::NOT_FOUND, "404 Not Found").into_response()
            }
        }
    }
}
