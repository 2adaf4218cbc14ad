use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::intake::read_resume_text;
use crate::intake::upload::read_upload;
use crate::models::analysis::AnalysisRow;
use crate::models::resume::{ResumeEditRow, ResumeRow};
use crate::resumes::{owned_resume, persist_upload};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResumeDetailResponse {
    pub success: bool,
    pub resume: ResumeRow,
    pub analysis: Option<AnalysisRow>,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceRequest {
    pub resume_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub edited_data: Option<Value>,
}

/// POST /api/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let file = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    let text = read_resume_text(&state.extractor, &file).await?;
    let resume = persist_upload(&state, &user, &file, text).await?;
    Ok(Json(json!({ "success": true, "resume": resume })))
}

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let resumes = state.store.list_resumes(user.id).await?;
    Ok(Json(json!({ "success": true, "resumes": resumes })))
}

async fn detail(state: &AppState, resume: ResumeRow) -> Result<ResumeDetailResponse, AppError> {
    let analysis = state.store.latest_analysis(resume.id).await?;
    Ok(ResumeDetailResponse {
        success: true,
        resume,
        analysis,
    })
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(resume_id): ApiPath<Uuid>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let resume = owned_resume(&state, &user, resume_id).await?;
    Ok(Json(detail(&state, resume).await?))
}

/// DELETE /api/resumes/:id
///
/// Analyses and edit snapshots go with it (FK cascade).
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(resume_id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_resume(resume_id, user.id).await? {
        return Err(AppError::NotFound("Resume not found".to_string()));
    }
    info!("Deleted resume {resume_id} for user {}", user.id);
    Ok(Json(json!({ "success": true })))
}

/// POST /api/resumes/reference
///
/// The resume (and its current analysis) to use as context elsewhere. Without
/// `resume_id`, the caller's most recent upload.
pub async fn handle_reference(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ReferenceRequest>,
) -> Result<Json<ResumeDetailResponse>, AppError> {
    let resume = match request.resume_id {
        Some(id) => owned_resume(&state, &user, id).await?,
        None => state
            .store
            .latest_resume(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("No resumes uploaded yet".to_string()))?,
    };
    Ok(Json(detail(&state, resume).await?))
}

/// GET /api/resumes/:id/edits
pub async fn handle_list_edits(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(resume_id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let resume = owned_resume(&state, &user, resume_id).await?;
    let edits: Vec<ResumeEditRow> = state.store.list_edits(resume.id, user.id).await?;
    Ok(Json(json!({ "success": true, "edits": edits })))
}

/// POST /api/resumes/:id/edits
pub async fn handle_create_edit(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(resume_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<EditRequest>,
) -> Result<Json<Value>, AppError> {
    let edited_data = request
        .edited_data
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::missing_field("edited_data"))?;
    let resume = owned_resume(&state, &user, resume_id).await?;
    let edit = state.store.insert_edit(resume.id, user.id, edited_data).await?;
    info!("Saved edit {} for resume {}", edit.id, resume.id);
    Ok(Json(json!({ "success": true, "edit": edit })))
}
