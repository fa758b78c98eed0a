use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::{
    FilePage, FilePatch, FileRecord, Principal, ShareWithUser, UserSummary,
};
use crate::utils::auth::Claims;

#[derive(Deserialize)]
pub struct ListFilesQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct FileDetailsResponse {
    pub file: FileRecord,
    pub owner: Option<UserSummary>,
    pub shares: Vec<ShareWithUser>,
}

/// OpenAPI shape of the multipart upload form.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/files",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded successfully", body = FileRecord),
        (status = 400, description = "No file provided or invalid filename"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File exceeds the configured maximum size")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileRecord>), AppError> {
    let principal = Principal::from_claims(Some(&claims));

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let file = state
            .files
            .upload(&principal, &bytes, &original_filename, content_type.as_deref())
            .await?;

        return Ok((StatusCode::CREATED, Json(file)));
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}

#[utoipa::path(
    get,
    path = "/files",
    params(
        ("search" = Option<String>, Query, description = "Filename substring filter"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Files visible to the caller", body = FilePage),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<FilePage>, AppError> {
    let principal = Principal::from_claims(Some(&claims));
    let page = state
        .files
        .list_accessible(
            &principal,
            query.search.as_deref(),
            query.page,
            query.page_size,
        )
        .await?;

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File details with owner and shares", body = FileDetailsResponse),
        (status = 404, description = "File not found or access denied")
    ),
    tag = "files"
)]
pub async fn get_file(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(file_id): Path<String>,
) -> Result<Json<FileDetailsResponse>, AppError> {
    let principal = Principal::from_claims(claims.as_deref());
    let (file, owner, shares) = state.files.get_details(&principal, &file_id).await?;

    Ok(Json(FileDetailsResponse {
        file,
        owner,
        shares,
    }))
}

#[utoipa::path(
    patch,
    path = "/files/{id}",
    params(("id" = String, Path, description = "File ID")),
    request_body = FilePatch,
    responses(
        (status = 200, description = "Updated file", body = FileRecord),
        (status = 400, description = "No valid fields to update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "File not found or access denied")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn update_file(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(file_id): Path<String>,
    Json(patch): Json<FilePatch>,
) -> Result<Json<FileRecord>, AppError> {
    let principal = Principal::from_claims(claims.as_deref());
    let file = state.files.update(&principal, &file_id, patch).await?;
    Ok(Json(file))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "File not found or access denied")
    ),
    security(("jwt" = [])),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let principal = Principal::from_claims(claims.as_deref());
    state.files.delete(&principal, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/files/{id}/download",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File download stream"),
        (status = 404, description = "File not found or access denied")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let principal = Principal::from_claims(claims.as_deref());
    let (file, blob) = state.files.download(&principal, &file_id).await?;

    let body = Body::from_stream(ReaderStream::new(blob));

    // ASCII fallback plus an RFC 5987 encoded form for non-ASCII names.
    let ascii_filename = file
        .original_filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file".to_string()
    } else {
        ascii_filename
    };
    let encoded_filename =
        utf8_percent_encode(&file.original_filename, NON_ALPHANUMERIC).to_string();
    let content_disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    );

    let headers = [
        (header::CONTENT_TYPE, file.mime_type),
        (header::CONTENT_DISPOSITION, content_disposition),
    ];

    Ok((headers, body).into_response())
}
