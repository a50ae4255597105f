use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::canon::upload::{
    catalog_error_kind, delete_book, update_books, upload_books, BatchError, BookSource,
    BookUpdate, ErrorKind, UploadSummary,
};
use crate::catalog::query::{
    decode_reference, DecodedReference, PassageQuery, VerseFinder, VerseHit, VerseQuery,
    DEFAULT_LIMIT,
};
use crate::catalog::store::{BookContent, ResourceRegistry};
use crate::catalog::{BookCatalog, CatalogError, VerseStore};
use crate::cli::ServeArgs;
use crate::core::reference::ReferenceId;
use crate::core::types::BookRef;
use crate::versification::{compute_versification, VersificationReport};

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_BODY_SIZE: usize = 20 * 1024 * 1024; // 20MB
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_CONCURRENT_REQUESTS: usize = 100;
pub const RATE_LIMIT_PER_SECOND: u64 = 10;
pub const RATE_LIMIT_BURST: u32 = 50;

/// Shared application state
pub struct AppState {
    pub books: BookCatalog,
    pub registry: RwLock<ResourceRegistry>,
    /// Snapshot file written after every change; `None` keeps the store in memory
    pub store_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(books: BookCatalog, registry: ResourceRegistry, store_path: Option<PathBuf>) -> Self {
        Self {
            books,
            registry: RwLock::new(registry),
            store_path,
        }
    }

    fn persist(&self, registry: &ResourceRegistry) -> Result<(), ApiError> {
        match &self.store_path {
            Some(path) => registry.save(path).map_err(|e| {
                ApiError::internal("Failed to save the store", &e.to_string())
            }),
            None => Ok(()),
        }
    }
}

/// Enhanced error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(kind: ErrorKind, message: String, details: Option<String>) -> Self {
        if kind == ErrorKind::Internal {
            return Self::internal("Internal server error", &message);
        }
        let (status, error_type) = match kind {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "already_exists"),
            ErrorKind::Range => (StatusCode::BAD_REQUEST, "range_error"),
            ErrorKind::Format | ErrorKind::Internal => (StatusCode::BAD_REQUEST, "format_error"),
        };
        Self {
            status,
            body: ErrorResponse {
                error: message,
                error_type: error_type.to_string(),
                details,
            },
        }
    }

    fn internal(user_message: &str, internal: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: create_safe_error_response("internal_error", user_message, Some(internal)),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::new(catalog_error_kind(&err), err.to_string(), None)
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        let details = (!err.applied.is_empty())
            .then(|| format!("already applied: {}", err.applied.join(", ")));
        Self::new(err.kind(), err.to_string(), details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created, the store cannot
/// be loaded, or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Create the application router with all routes and security layers.
///
/// Per-IP rate limiting needs the peer address, so it is added by the server
/// rather than here.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/books", get(books_handler))
        .route("/api/references/{id}", get(reference_handler))
        .route(
            "/api/resources",
            get(list_resources_handler).post(create_resource_handler),
        )
        .route(
            "/api/resources/{name}/books",
            get(list_books_handler)
                .post(upload_books_handler)
                .put(update_books_handler),
        )
        .route(
            "/api/resources/{name}/books/{code}",
            delete(delete_book_handler),
        )
        .route("/api/resources/{name}/verses", get(verses_handler))
        .route("/api/resources/{name}/passage", get(passage_handler))
        .route(
            "/api/resources/{name}/versification",
            get(versification_handler),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Security headers for browser protection
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                // Request timeout to prevent slow client attacks
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(REQUEST_TIMEOUT_SECS),
                ))
                // Limit concurrent requests to prevent DOS
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let books = args.store.load_books()?;
    let registry = args.store.load_registry()?;
    tracing::info!(
        "Loaded {} book(s) and {} resource(s) from {}",
        books.len(),
        registry.len(),
        args.store.store.display()
    );
    let state = Arc::new(AppState::new(books, registry, Some(args.store.store.clone())));

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(RATE_LIMIT_PER_SECOND)
        .burst_size(RATE_LIMIT_BURST)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?;
    let app = create_router(state).layer(GovernorLayer {
        config: Arc::new(governor_conf),
    });

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting versifier web server at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}/api/books"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// List of API endpoints
async fn index_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "versifier",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /api/books",
            "GET /api/references/{id}",
            "GET|POST /api/resources",
            "GET|POST|PUT /api/resources/{name}/books",
            "DELETE /api/resources/{name}/books/{code}",
            "GET /api/resources/{name}/verses",
            "GET /api/resources/{name}/passage",
            "GET /api/resources/{name}/versification",
        ],
    }))
}

/// Return the book catalog
async fn books_handler(State(state): State<Arc<AppState>>) -> Json<Vec<BookRef>> {
    Json(state.books.books.clone())
}

async fn reference_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DecodedReference>, ApiError> {
    let id: ReferenceId = id.parse().map_err(CatalogError::from)?;
    Ok(Json(decode_reference(&state.books, u64::from(id.value()))?))
}

async fn list_resources_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let registry = state.registry.read().await;
    Json(registry.names().map(ToString::to_string).collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResource {
    resource_name: String,
}

async fn create_resource_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateResource>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut registry = state.registry.write().await;
    let name = registry.create(&request.resource_name)?.resource().to_string();
    state.persist(&registry)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "resourceName": name })),
    ))
}

fn default_active() -> bool {
    true
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
struct BookListParams {
    book_code: Option<String>,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<BookListParams>,
) -> Result<Json<Vec<BookContent>>, ApiError> {
    let registry = state.registry.read().await;
    let table = registry.get(&name)?;
    let books = table
        .list_books(params.book_code.as_deref(), params.active, params.skip, params.limit)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(books))
}

async fn upload_books_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(sources): Json<Vec<BookSource>>,
) -> Result<(StatusCode, Json<UploadSummary>), ApiError> {
    let mut registry = state.registry.write().await;
    let table = registry.get_mut(&name)?;
    let result = upload_books(table, &state.books, &sources);
    state.persist(&registry)?;
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn update_books_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(updates): Json<Vec<BookUpdate>>,
) -> Result<Json<UploadSummary>, ApiError> {
    let mut registry = state.registry.write().await;
    let table = registry.get_mut(&name)?;
    let result = update_books(table, &state.books, &updates);
    state.persist(&registry)?;
    Ok(Json(result?))
}

async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Path((name, code)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut registry = state.registry.write().await;
    let table = registry.get_mut(&name)?;
    delete_book(table, &state.books, &code)?;
    state.persist(&registry)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verses_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<VerseQuery>,
) -> Result<Json<Vec<VerseHit>>, ApiError> {
    let registry = state.registry.read().await;
    let table = registry.get(&name)?;
    Ok(Json(VerseFinder::new(table, &state.books).find_verses(&query)?))
}

async fn passage_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(passage): Query<PassageQuery>,
) -> Result<Json<Vec<VerseHit>>, ApiError> {
    let registry = state.registry.read().await;
    let table = registry.get(&name)?;
    Ok(Json(VerseFinder::new(table, &state.books).find_passage(&passage)?))
}

async fn versification_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<VersificationReport>, ApiError> {
    let registry = state.registry.read().await;
    let table = registry.get(&name)?;
    let rows = table.query_ordered_by_reference(None);
    Ok(Json(compute_versification(&rows, &state.books)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let books = BookCatalog::load_embedded().unwrap();
        let mut registry = ResourceRegistry::new();
        registry.create("en_KJV_1_bible").unwrap();
        create_router(Arc::new(AppState::new(books, registry, None)))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn genesis() -> Value {
        json!([{
            "JSON": {
                "book": {"bookCode": "gen"},
                "chapters": [{"chapterNumber": 1, "contents": [
                    {"verseNumber": "1", "verseText": "In the beginning"},
                    {"verseNumber": "2-3", "verseText": "Merged"},
                    {"verseNumber": "5", "verseText": "Five"}
                ]}]
            }
        }])
    }

    #[tokio::test]
    async fn test_books_endpoint_lists_catalog() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 66);
    }

    #[tokio::test]
    async fn test_upload_query_and_versification() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/resources/en_KJV_1_bible/books",
            Some(genesis()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rowsWritten"], 4);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/resources/en_KJV_1_bible/verses?book_code=gen&chapter=1&verse=2&last_verse=3",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["verseText"], "Merged");
        assert_eq!(body[1]["verseText"], "");
        assert_eq!(body[1]["reference"]["verseNumber"], 3);

        let (_, body) = send(
            &app,
            Method::GET,
            "/api/resources/en_KJV_1_bible/versification",
            None,
        )
        .await;
        assert_eq!(body["maxVerses"]["gen"], json!([5]));
        assert_eq!(body["excludedVerses"], json!(["gen 1:4"]));
    }

    #[tokio::test]
    async fn test_duplicate_upload_is_conflict() {
        let app = app();
        let uri = "/api/resources/en_KJV_1_bible/books";
        send(&app, Method::POST, uri, Some(genesis())).await;
        let (status, body) = send(&app, Method::POST, uri, Some(genesis())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_type"], "already_exists");
    }

    #[tokio::test]
    async fn test_malformed_verse_number_is_bad_request() {
        let app = app();
        let bad = json!([{"USFM": "\\id GEN\n\\c 1\n\\v abc text\n"}]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/resources/en_KJV_1_bible/books",
            Some(bad),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "format_error");
        assert!(body["error"].as_str().unwrap().contains("gen chapter 1 verse abc"));
    }

    #[tokio::test]
    async fn test_oversized_merged_range_is_range_error() {
        let app = app();
        let body = json!([{"USFM": "\\id GEN\n\\c 1\n\\v 1-4000000000 text\n"}]);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/resources/en_KJV_1_bible/books",
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "range_error");
    }

    #[tokio::test]
    async fn test_unknown_resource_and_non_bible() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/resources/hi_IRV_1_bible/verses", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/resources/en_TW_1_vocabulary/verses",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete_book() {
        let app = app();
        let uri = "/api/resources/en_KJV_1_bible/books";
        send(&app, Method::POST, uri, Some(genesis())).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            uri,
            Some(json!([{"bookCode": "gen", "active": false}])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rowsFlagged"], 4);

        let (_, body) = send(&app, Method::GET, &format!("{uri}?active=false"), None).await;
        assert_eq!(body[0]["bookCode"], "gen");

        let (status, _) = send(&app, Method::DELETE, &format!("{uri}/gen"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &format!("{uri}/gen"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reference_decode() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/references/043003016", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"book": "jhn", "chapter": 3, "verse": 16}));

        let (status, _) = send(&app, Method::GET, "/api/references/12", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_resource() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/resources",
            Some(json!({"resourceName": "hi_IRV_1_bible"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["resourceName"], "hi_IRV_1_bible");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/resources",
            Some(json!({"resourceName": "hi_IRV_1_bible"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
