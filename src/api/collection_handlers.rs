use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::handlers::{
    error, forbidden, internal, not_found, ApiError, AppState, MALFORMED_REQUEST,
};
use crate::config::AppConfig;
use crate::logic::collections::{self, CollectionError, Payload};
use crate::logic::permissions::{principal_allowed, PUBLISHER};
use crate::model::{Collection, Id, PageMeta, Principal};
use crate::store::traits::Store;

/// Serialized form of a collection; apps are rendered as resource URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionResponse {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub apps: Vec<String>,
}

impl CollectionResponse {
    pub fn new(collection: &Collection, config: &AppConfig) -> Self {
        Self {
            id: collection.id,
            name: collection.name.clone(),
            description: collection.description.clone(),
            apps: collection.app_urls(&config.api.app_url_prefix),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionListResponse {
    pub meta: PageMeta,
    pub objects: Vec<CollectionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Map a domain error onto its HTTP status and detail message
fn collection_error(err: CollectionError) -> ApiError {
    match err {
        CollectionError::Store(e) => internal(e),
        CollectionError::NotFound => not_found(),
        other => {
            warn!("Rejected collection write ({}): {}", other.key(), other);
            error(StatusCode::BAD_REQUEST, &other.to_string())
        }
    }
}

/// Write endpoints check permission before anything about the request body.
async fn require_publisher<S: Store>(
    store: &S,
    principal: &Principal,
    action: &str,
) -> Result<(), ApiError> {
    match principal_allowed(store, principal, PUBLISHER).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!("Denied {} to {}", action, principal.label());
            Err(forbidden())
        }
        Err(e) => Err(internal(e)),
    }
}

/// Parse a write request body. An empty body is an empty object.
fn parse_payload(body: &Bytes) -> Result<Payload, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(payload)) => Ok(payload),
        _ => Err(error(StatusCode::BAD_REQUEST, MALFORMED_REQUEST)),
    }
}

/// GET /collections
pub async fn list_collections<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<CollectionListResponse>, ApiError> {
    let limit = config.page_limit(page.limit);
    let offset = page.offset.unwrap_or(0);

    let total_count = store.count_collections().await.map_err(internal)?;
    let collections = store
        .list_collections(limit, offset)
        .await
        .map_err(internal)?;

    Ok(Json(CollectionListResponse {
        meta: PageMeta::new("/collections", limit, offset, total_count),
        objects: collections
            .iter()
            .map(|c| CollectionResponse::new(c, &config))
            .collect(),
    }))
}

/// POST /collections
pub async fn create_collection<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    principal: Principal,
    body: Bytes,
) -> Result<(StatusCode, Json<CollectionResponse>), ApiError> {
    require_publisher(&*store, &principal, "create").await?;
    let payload = parse_payload(&body)?;

    let collection = collections::create_collection(&*store, &payload)
        .await
        .map_err(collection_error)?;

    info!(
        "Collection {} created by {}",
        collection.id,
        principal.label()
    );
    Ok((
        StatusCode::CREATED,
        Json(CollectionResponse::new(&collection, &config)),
    ))
}

/// GET /collections/{id}
pub async fn get_collection<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Path(id): Path<Id>,
) -> Result<Json<CollectionResponse>, ApiError> {
    match store.get_collection(id).await {
        Ok(Some(collection)) => Ok(Json(CollectionResponse::new(&collection, &config))),
        Ok(None) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

/// PATCH /collections/{id}
pub async fn edit_collection<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    principal: Principal,
    Path(id): Path<Id>,
    body: Bytes,
) -> Result<Json<CollectionResponse>, ApiError> {
    require_publisher(&*store, &principal, "edit").await?;
    let payload = parse_payload(&body)?;

    let collection = collections::edit_collection(&*store, id, &payload)
        .await
        .map_err(collection_error)?;

    info!("Collection {} edited by {}", id, principal.label());
    Ok(Json(CollectionResponse::new(&collection, &config)))
}

/// DELETE /collections/{id}
pub async fn delete_collection<S: Store>(
    State(store): State<AppState<S>>,
    principal: Principal,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    require_publisher(&*store, &principal, "delete").await?;

    match store.delete_collection(id).await {
        Ok(true) => {
            info!("Collection {} deleted by {}", id, principal.label());
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

/// POST /collections/{id}/add-app
pub async fn add_app<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    principal: Principal,
    Path(id): Path<Id>,
    body: Bytes,
) -> Result<Json<CollectionResponse>, ApiError> {
    require_publisher(&*store, &principal, "add-app").await?;
    let payload = parse_payload(&body)?;

    let collection = collections::add_app(&*store, id, &payload)
        .await
        .map_err(collection_error)?;

    info!("App added to collection {} by {}", id, principal.label());
    Ok(Json(CollectionResponse::new(&collection, &config)))
}

/// POST /collections/{id}/remove-app
pub async fn remove_app<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    principal: Principal,
    Path(id): Path<Id>,
    body: Bytes,
) -> Result<Json<CollectionResponse>, ApiError> {
    require_publisher(&*store, &principal, "remove-app").await?;
    let payload = parse_payload(&body)?;

    let collection = collections::remove_app(&*store, id, &payload)
        .await
        .map_err(collection_error)?;

    info!("App removed from collection {} by {}", id, principal.label());
    Ok(Json(CollectionResponse::new(&collection, &config)))
}
