use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use logleaf_core::db::{ListOptions, SortKey, DEFAULT_LIST_LIMIT};
use logleaf_core::services::{LeafChanges, LeafService, NewLeaf};
use logleaf_core::Leaf;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

const MAX_PAGE_SIZE: usize = 1_000;

#[derive(Clone)]
pub struct AppState {
    leaves: LeafService,
}

impl AppState {
    pub const fn new(leaves: LeafService) -> Self {
        Self { leaves }
    }
}

pub fn app_router(state: AppState) -> Router {
    let leaf_routes = Router::new()
        .route("/leaves", get(list_leaves).post(create_leaf))
        .route(
            "/leaves/{id}",
            get(get_leaf).patch(update_leaf).delete(delete_leaf),
        )
        .route("/leaves/{id}/read", patch(mark_read));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", leaf_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeafResponse {
    pub id: String,
    pub note: String,
    pub url: String,
    pub platform: String,
    pub tags: Vec<String>,
    pub read: bool,
    pub synced_at: DateTime<Utc>,
}

impl From<&Leaf> for LeafResponse {
    fn from(leaf: &Leaf) -> Self {
        Self {
            id: leaf.id().to_string(),
            note: leaf.note().to_string(),
            url: leaf.url().to_string(),
            platform: leaf.platform().to_string(),
            tags: leaf.tag_names(),
            read: leaf.is_read(),
            synced_at: leaf.synced_at(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    limit: Option<usize>,
    offset: Option<usize>,
    platform: Option<String>,
    tag: Option<String>,
    read: Option<bool>,
    sort: Option<String>,
    order: Option<String>,
}

impl ListQuery {
    fn into_options(self) -> Result<ListOptions, AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::bad_request(format!(
                "limit must be in [1, {MAX_PAGE_SIZE}]"
            )));
        }
        let sort_by = self
            .sort
            .as_deref()
            .map(SortKey::from_str)
            .transpose()
            .map_err(AppError::BadRequest)?
            .unwrap_or_default();
        let sort_desc = match self.order.as_deref() {
            None | Some("desc") => true,
            Some("asc") => false,
            Some(other) => {
                return Err(AppError::bad_request(format!(
                    "order must be asc or desc, got {other}"
                )))
            }
        };

        Ok(ListOptions {
            limit,
            offset: self.offset.unwrap_or(0),
            platform: self.platform,
            tag: self.tag,
            read: self.read,
            sort_by,
            sort_desc,
        })
    }
}

async fn list_leaves(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LeafResponse>>, AppError> {
    let options = query.into_options()?;
    let leaves = state.leaves.list(&options).await?;
    Ok(Json(leaves.iter().map(LeafResponse::from).collect()))
}

async fn create_leaf(
    State(state): State<AppState>,
    payload: Result<Json<NewLeaf>, JsonRejection>,
) -> Result<(StatusCode, Json<LeafResponse>), AppError> {
    let Json(request) = payload?;
    let leaf = state.leaves.add(request).await?;
    tracing::info!(endpoint = "create_leaf", leaf_id = %leaf.id(), "Created leaf");
    Ok((StatusCode::CREATED, Json(LeafResponse::from(&leaf))))
}

async fn get_leaf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LeafResponse>, AppError> {
    let leaf = state.leaves.get(&id).await?;
    Ok(Json(LeafResponse::from(&leaf)))
}

async fn update_leaf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LeafChanges>, JsonRejection>,
) -> Result<Json<LeafResponse>, AppError> {
    let Json(changes) = payload?;
    if changes.is_empty() {
        return Err(AppError::bad_request("no fields to update"));
    }
    let leaf = state.leaves.update(&id, changes).await?;
    tracing::info!(endpoint = "update_leaf", leaf_id = %leaf.id(), "Updated leaf");
    Ok(Json(LeafResponse::from(&leaf)))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LeafResponse>, AppError> {
    let leaf = state.leaves.mark_read(&id).await?;
    tracing::info!(endpoint = "mark_read", leaf_id = %leaf.id(), "Marked leaf as read");
    Ok(Json(LeafResponse::from(&leaf)))
}

async fn delete_leaf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.leaves.delete(&id).await?;
    tracing::info!(endpoint = "delete_leaf", leaf_id = %id, "Deleted leaf");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use logleaf_core::db::InMemoryLeafStore;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn router() -> Router {
        let store = Arc::new(InMemoryLeafStore::new());
        app_router(AppState::new(LeafService::new(store)))
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send_raw(router, method, uri, body.map(|value| value.to_string())).await
    }

    async fn send_raw(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(text)
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, url: &str, platform: &str) -> LeafResponse {
        let (status, body) = send(
            router,
            Method::POST,
            "/api/leaves",
            Some(json!({
                "note": "Read later",
                "url": url,
                "platform": platform,
                "tags": ["rust"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (status, body) = send(&router(), Method::GET, "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let router = router();
        let created = create(&router, "https://zenn.dev/a", "zenn").await;
        assert!(!created.read);
        assert_eq!(created.tags, vec!["rust"]);

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/api/leaves/{}", created.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_value::<LeafResponse>(body).unwrap(), created);
    }

    #[tokio::test]
    async fn create_rejects_invalid_leaf() {
        let (status, body) = send(
            &router(),
            Method::POST,
            "/api/leaves",
            Some(json!({"note": "", "url": "https://zenn.dev/a", "platform": "zenn"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Note cannot be empty"));
    }

    #[tokio::test]
    async fn malformed_body_is_json_400() {
        let router = router();
        let created = create(&router, "https://zenn.dev/a", "zenn").await;
        let patch_uri = format!("/api/leaves/{}", created.id);

        for (method, uri) in [
            (Method::POST, "/api/leaves"),
            (Method::PATCH, patch_uri.as_str()),
        ] {
            let (status, body) =
                send_raw(&router, method, uri, Some("{not json".to_string())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(!body["error"].as_str().unwrap().is_empty(), "{uri}");
        }

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/leaves",
            Some(json!({"note": "Read later"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn missing_leaf_is_404() {
        let router = router();
        for method in [Method::GET, Method::DELETE] {
            let (status, _) = send(&router, method, "/api/leaves/missing", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        let (status, _) = send(&router, Method::PATCH, "/api/leaves/missing/read", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mark_read_twice_conflicts() {
        let router = router();
        let created = create(&router, "https://zenn.dev/a", "zenn").await;
        let uri = format!("/api/leaves/{}/read", created.id);

        let (status, body) = send(&router, Method::PATCH, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["read"], true);

        let (status, _) = send(&router, Method::PATCH, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn patch_updates_fields() {
        let router = router();
        let created = create(&router, "https://zenn.dev/a", "zenn").await;
        let uri = format!("/api/leaves/{}", created.id);

        let (status, body) = send(
            &router,
            Method::PATCH,
            &uri,
            Some(json!({"note": "Changed", "tags": ["go", "cli"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["note"], "Changed");
        assert_eq!(body["tags"], json!(["go", "cli"]));
        assert_eq!(body["platform"], "zenn");

        let (status, _) = send(&router, Method::PATCH, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &router,
            Method::PATCH,
            &uri,
            Some(json!({"tags": ["go", "go"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_removes_leaf() {
        let router = router();
        let created = create(&router, "https://zenn.dev/a", "zenn").await;
        let uri = format!("/api/leaves/{}", created.id);

        let (status, _) = send(&router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_and_validates_query() {
        let router = router();
        create(&router, "https://zenn.dev/a", "zenn").await;
        create(&router, "https://qiita.com/b", "qiita").await;

        let (status, body) = send(&router, Method::GET, "/api/leaves?platform=qiita", None).await;
        assert_eq!(status, StatusCode::OK);
        let leaves: Vec<LeafResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].url, "https://qiita.com/b");

        let (status, body) = send(
            &router,
            Method::GET,
            "/api/leaves?sort=platform&order=asc&read=false",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let platforms: Vec<String> = serde_json::from_value::<Vec<LeafResponse>>(body)
            .unwrap()
            .into_iter()
            .map(|leaf| leaf.platform)
            .collect();
        assert_eq!(platforms, vec!["qiita", "zenn"]);

        for uri in [
            "/api/leaves?sort=title",
            "/api/leaves?order=sideways",
            "/api/leaves?limit=0",
        ] {
            let (status, _) = send(&router, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }
}
