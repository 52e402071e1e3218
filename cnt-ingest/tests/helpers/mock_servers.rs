//! Local stand-ins for the feed and translation APIs
//!
//! Each server binds 127.0.0.1:0 and runs on the test's runtime.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const POSTS_PATH: &str = "/api/v1/posts/";
const TRANSLATE_PATH: &str = "/translate";

async fn bind() -> (tokio::net::TcpListener, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("http://{}", addr))
}

// ============================================================================
// Feed
// ============================================================================

#[derive(Clone)]
struct FeedState {
    pages: Arc<Vec<Value>>,
    status: StatusCode,
    hits: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// Running mock feed
pub struct MockFeed {
    /// Posts endpoint URL
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockFeed {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn posts(
    State(state): State<FeedState>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.queries.lock().unwrap().push(query.clone());

    if state.status != StatusCode::OK {
        return (state.status, Json(json!({"status": "Incomplete", "info": "error"})));
    }

    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let body = state
        .pages
        .get(page.saturating_sub(1))
        .cloned()
        .unwrap_or_else(|| json!({"next": null, "results": []}));
    (StatusCode::OK, Json(body))
}

/// Start a feed server
///
/// `build_pages` receives the posts endpoint URL so pages can link to each
/// other through `next` (use `?page=N`). A non-OK `status` is returned for
/// every request.
pub async fn spawn_feed_server<F>(build_pages: F, status: StatusCode) -> MockFeed
where
    F: FnOnce(&str) -> Vec<Value>,
{
    let (listener, base) = bind().await;
    let url = format!("{}{}", base, POSTS_PATH);

    let state = FeedState {
        pages: Arc::new(build_pages(&url)),
        status,
        hits: Arc::new(AtomicUsize::new(0)),
        queries: Arc::new(Mutex::new(Vec::new())),
    };
    let mock = MockFeed {
        url,
        hits: state.hits.clone(),
        queries: state.queries.clone(),
    };

    let app = Router::new().route(POSTS_PATH, get(posts)).with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}

/// API post JSON
pub fn post_json(id: u64, title: &str, positive: i64) -> Value {
    json!({
        "kind": "news",
        "id": id,
        "title": title,
        "published_at": "2019-01-01T00:00:00Z",
        "metadata": {"description": format!("{} summary", title), "image": format!("https://img.test/{}.png", id)},
        "votes": {"positive": positive, "negative": 0, "important": 0}
    })
}

// ============================================================================
// Translation
// ============================================================================

/// Behavior of the mock translation API
#[derive(Debug, Clone, Copy)]
pub enum TranslateMode {
    /// 200 with `"<text> [<lang>]"`
    Tag,
    /// Always this status
    Status(u16),
    /// 200 without `translated_text`
    MissingField,
    /// 200 with an empty `translated_text`
    Empty,
}

#[derive(Clone)]
struct TranslateState {
    mode: TranslateMode,
    hits: Arc<AtomicUsize>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

/// Running mock translation API
pub struct MockTranslate {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    pub auth_headers: Arc<Mutex<Vec<String>>>,
}

impl MockTranslate {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn translate(
    State(state): State<TranslateState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth_headers.lock().unwrap().push(auth.to_string());
    }

    match state.mode {
        TranslateMode::Tag => {
            let text = body["text"].as_str().unwrap_or_default();
            let lang = body["target_lang"].as_str().unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({"translated_text": format!("{} [{}]", text, lang)})),
            )
        }
        TranslateMode::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({"error": "unavailable"})),
        ),
        TranslateMode::MissingField => (StatusCode::OK, Json(json!({"status": "ok"}))),
        TranslateMode::Empty => (StatusCode::OK, Json(json!({"translated_text": ""}))),
    }
}

/// Start a translation server
pub async fn spawn_translate_server(mode: TranslateMode) -> MockTranslate {
    let (listener, base) = bind().await;

    let state = TranslateState {
        mode,
        hits: Arc::new(AtomicUsize::new(0)),
        auth_headers: Arc::new(Mutex::new(Vec::new())),
    };
    let mock = MockTranslate {
        url: format!("{}{}", base, TRANSLATE_PATH),
        hits: state.hits.clone(),
        auth_headers: state.auth_headers.clone(),
    };

    let app = Router::new()
        .route(TRANSLATE_PATH, post(translate))
        .with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}
