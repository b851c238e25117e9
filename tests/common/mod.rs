//! Common test utilities.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use whatfilm_rs::{ServiceConfiguration, TmdbClient};

/// API key the stub catalog accepts.
pub const API_KEY: &str = "test-key";

/// Films served per page.
pub const PAGE_SIZE: usize = 3;

/// Shared state of the stub catalog.
pub struct ApiState {
    pub base_url: String,
    pub total_pages: usize,
    /// Always answer with the first page, whatever was asked.
    pub repeat_first_page: bool,
    /// `path?query` of every catalog request, in arrival order.
    pub requests: Mutex<Vec<String>>,
    pub image_hits: AtomicUsize,
}

impl ApiState {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn image_hits(&self) -> usize {
        self.image_hits.load(Ordering::SeqCst)
    }
}

/// Stub catalog API served over HTTP.
pub struct TestApi {
    pub base_url: String,
    pub state: Arc<ApiState>,
}

impl TestApi {
    /// Starts a catalog with `total_pages` pages on a random port.
    pub async fn start(total_pages: usize) -> Self {
        Self::start_with(total_pages, false).await
    }

    pub async fn start_with(total_pages: usize, repeat_first_page: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = Arc::new(ApiState {
            base_url: base_url.clone(),
            total_pages,
            repeat_first_page,
            requests: Mutex::new(Vec::new()),
            image_hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/3/configuration", get(configuration_handler))
            .route("/3/movie/popular", get(listing_handler))
            .route("/3/movie/upcoming", get(listing_handler))
            .route("/3/search/movie", get(listing_handler))
            .route("/3/discover/movie", get(listing_handler))
            .route("/t/p/:size/:file", get(image_handler))
            .with_state(state.clone());

        // Start server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    /// A client authenticated against this catalog.
    pub fn client(&self) -> Arc<TmdbClient> {
        self.client_with_key(Some(API_KEY))
    }

    pub fn client_with_key(&self, key: Option<&str>) -> Arc<TmdbClient> {
        let mut configuration = match key {
            Some(key) => ServiceConfiguration::with_api_key(key),
            None => ServiceConfiguration::default(),
        };
        configuration.base_url = self.base_url.clone();
        Arc::new(TmdbClient::new(configuration).unwrap())
    }
}

fn authorized(query: &HashMap<String, String>) -> bool {
    query.get("api_key").map(String::as_str) == Some(API_KEY)
}

async fn configuration_handler(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&query) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "images": {
            "base_url": format!("{}/t/p/", state.base_url),
            "secure_base_url": format!("{}/t/p/", state.base_url),
            "backdrop_sizes": ["w300", "w780", "w1280", "original"],
            "logo_sizes": ["w45", "w92", "original"],
            "poster_sizes": ["w92", "w154", "w185", "w342", "w500", "original"],
            "profile_sizes": ["w45", "w185", "original"],
            "still_sizes": ["w92", "w185", "original"]
        },
        "change_keys": []
    }))
    .into_response()
}

async fn listing_handler(
    State(state): State<Arc<ApiState>>,
    uri: axum::http::Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(uri.to_string());
    if !authorized(&query) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let requested: usize = match query.get("page").map(|p| p.parse()) {
        Some(Ok(page)) if page >= 1 => page,
        _ => return StatusCode::UNPROCESSABLE_ENTITY.into_response(),
    };
    let page = if state.repeat_first_page { 1 } else { requested };

    let results: Vec<_> = (0..PAGE_SIZE)
        .map(|i| {
            let id = film_id(page - 1, i);
            json!({
                "id": id,
                "title": format!("Film {}", id),
                "release_date": "1999-03-31",
                "poster_path": format!("/poster-{}.png", id)
            })
        })
        .collect();

    Json(json!({
        "page": page,
        "total_results": state.total_pages * PAGE_SIZE,
        "total_pages": state.total_pages,
        "results": results
    }))
    .into_response()
}

async fn image_handler(
    State(state): State<Arc<ApiState>>,
    Path((_size, file)): Path<(String, String)>,
) -> Response {
    state.image_hits.fetch_add(1, Ordering::SeqCst);
    if file.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    if file.starts_with("corrupt") {
        return ([(header::CONTENT_TYPE, "image/png")], "not an image").into_response();
    }
    ([(header::CONTENT_TYPE, "image/png")], png(4, 6)).into_response()
}

/// Id of the `index`th film on 0-based page `page`.
pub fn film_id(page: usize, index: usize) -> u64 {
    (page * 100 + index + 1) as u64
}

/// Encodes a blank PNG of the given dimensions.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image::RgbaImage::new(width, height)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
