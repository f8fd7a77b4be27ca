//! Small article API used as the live backend in end-to-end tests.
//!
//! Routes:
//! - `GET /articles`, `POST /articles` (multipart: `name` text field plus an
//!   optional file field)
//! - `GET|PUT|DELETE /articles/{id}`; unknown ids answer 404 with a JSON
//!   error body `{"code":"not_found","message":...}`
//! - `POST /articles/search?slug=..` with a URL-form `limit`/`page` body
//! - `GET /secure`, which requires `Authorization: Bearer ACCESS_TOKEN`
//! - `GET /flaky`, which answers 503 on odd-numbered calls and 200 otherwise
//! - `/echo` (any method), which reflects the request back as JSON

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ACCESS_TOKEN: &str = "secret-token";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub name: String,
    pub attachment: Option<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Deserialize)]
pub struct UpdateArticle {
    pub name: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub slug: Option<String>,
}

#[derive(Deserialize)]
pub struct Page {
    pub limit: usize,
    pub page: usize,
}

/// JSON error body returned by every failing route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    body: ErrorBody,
}

impl Failure {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    fn not_found(id: Uuid) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("article {id} does not exist"))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Article>>>;

#[derive(Clone, Default)]
pub struct AppState {
    db: Db,
    flaky_calls: Arc<AtomicU32>,
}

pub fn app() -> Router {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/articles/search", post(search_articles))
        .route("/secure", get(secure))
        .route("/flaky", get(flaky))
        .route("/echo", any(echo))
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_articles(State(state): State<AppState>) -> Json<Vec<Article>> {
    let articles = state.db.read().await;
    let mut list: Vec<Article> = articles.values().cloned().collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    Json(list)
}

async fn create_article(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Article>), Failure> {
    let mut name = None;
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Failure::new(StatusCode::BAD_REQUEST, "bad_multipart", e.body_text()))?
    {
        let field_name = field.name().map(str::to_owned);
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| Failure::new(StatusCode::BAD_REQUEST, "bad_multipart", e.body_text()))?;

        if field_name.as_deref() == Some("name") && filename.is_none() {
            name = Some(String::from_utf8_lossy(&data).into_owned());
        } else {
            if name.is_none() {
                name = filename.clone();
            }
            attachment = Some(Attachment {
                filename,
                content_type,
                size: data.len(),
            });
        }
    }

    let name = name.ok_or_else(|| {
        Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "missing_name", "no name field")
    })?;
    let article = Article {
        id: Uuid::new_v4(),
        name,
        attachment,
    };
    state.db.write().await.insert(article.id, article.clone());
    tracing::debug!(id = %article.id, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Article>, Failure> {
    let articles = state.db.read().await;
    articles.get(&id).cloned().map(Json).ok_or_else(|| Failure::not_found(id))
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateArticle>,
) -> Result<Json<Article>, Failure> {
    let mut articles = state.db.write().await;
    let article = articles.get_mut(&id).ok_or_else(|| Failure::not_found(id))?;
    article.name = input.name;
    Ok(Json(article.clone()))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Failure> {
    let mut articles = state.db.write().await;
    articles
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| Failure::not_found(id))
}

async fn search_articles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Form(page): Form<Page>,
) -> Result<Json<Vec<Article>>, Failure> {
    if page.page == 0 {
        return Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "bad_page",
            "pages start at 1",
        ));
    }

    let articles = state.db.read().await;
    let mut found: Vec<Article> = articles
        .values()
        .filter(|a| match &query.slug {
            Some(slug) => a.name.to_lowercase().contains(&slug.to_lowercase()),
            None => true,
        })
        .cloned()
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));

    let start = (page.page - 1).saturating_mul(page.limit);
    Ok(Json(found.into_iter().skip(start).take(page.limit).collect()))
}

async fn secure(headers: HeaderMap) -> Result<Json<serde_json::Value>, Failure> {
    let expected = format!("Bearer {ACCESS_TOKEN}");
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return Err(Failure::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ));
    }
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn flaky(State(state): State<AppState>) -> Result<Json<serde_json::Value>, Failure> {
    let call = state.flaky_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if call % 2 == 1 {
        return Err(Failure::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            format!("call {call} failed"),
        ));
    }
    Ok(Json(serde_json::json!({ "call": call })))
}

/// What `/echo` saw.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        query,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
