//! HTTP API for projtree.
//!
//! Identity comes from the [`SUBJECT_HEADER`] set by the authenticating
//! proxy in front of this service. Repository calls are synchronous SQLite
//! work, so each one runs on the blocking pool.

mod error;

pub use error::{ApiError, ErrorBody};

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::Router;
use projtree_store::{EntryRepository, NewFile, NewFolder, RequestContext, StoreResult};
use projtree_types::{Entry, EntryId, Project, ProjectId, StorageId, SubjectId};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

/// Header carrying the authenticated subject.
pub const SUBJECT_HEADER: &str = "x-projtree-subject";

/// Optional header carrying a correlation id for logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    repo: Arc<EntryRepository>,
}

impl AppState {
    pub fn new(repo: EntryRepository) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&EntryRepository) -> StoreResult<T> + Send + 'static,
    {
        let repo = self.repo.clone();
        Ok(tokio::task::spawn_blocking(move || f(&repo)).await??)
    }
}

/// The caller's request context, built from request headers.
pub struct Caller(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Ok(Self(RequestContext {
            subject: header(SUBJECT_HEADER).and_then(SubjectId::new),
            request_id: header(REQUEST_ID_HEADER),
        }))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub parent_id: Option<EntryId>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntryId>,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<StorageId>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntryId>,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContentRequest {
    pub content: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn create_project_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.run(move |repo| repo.register_project(&ctx)).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_entries_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(project_id): Path<ProjectId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = state
        .run(move |repo| repo.list_children(&ctx, project_id, query.parent_id))
        .await?;
    Ok(Json(entries))
}

async fn list_all_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = state
        .run(move |repo| repo.list_project(&ctx, project_id))
        .await?;
    Ok(Json(entries))
}

async fn create_file_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<CreateFileRequest>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let new = NewFile {
        project_id,
        parent_id: body.parent_id,
        name: body.name,
        content: body.content,
        storage_id: body.storage_id,
    };
    let entry = state.run(move |repo| repo.create_file(&ctx, new)).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn create_folder_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let new = NewFolder {
        project_id,
        parent_id: body.parent_id,
        name: body.name,
    };
    let entry = state.run(move |repo| repo.create_folder(&ctx, new)).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_entry_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<EntryId>,
) -> Result<Json<Entry>, ApiError> {
    let entry = state.run(move |repo| repo.get_entry(&ctx, id)).await?;
    Ok(Json(entry))
}

async fn rename_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<EntryId>,
    Json(body): Json<RenameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |repo| repo.rename_entry(&ctx, id, &body.name))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_content_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<EntryId>,
    Json(body): Json<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |repo| repo.update_content(&ctx, id, &body.content))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_handler(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<EntryId>,
) -> Result<impl IntoResponse, ApiError> {
    state.run(move |repo| repo.delete_entry(&ctx, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build the HTTP API router over the given repository.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/projects", post(create_project_handler))
        .route("/api/v1/projects/{project_id}/entries", get(list_entries_handler))
        .route("/api/v1/projects/{project_id}/entries/all", get(list_all_handler))
        .route("/api/v1/projects/{project_id}/files", post(create_file_handler))
        .route("/api/v1/projects/{project_id}/folders", post(create_folder_handler))
        .route(
            "/api/v1/entries/{id}",
            get(get_entry_handler)
                .patch(rename_handler)
                .delete(delete_handler),
        )
        .route("/api/v1/entries/{id}/content", put(update_content_handler))
        .with_state(state)
}
