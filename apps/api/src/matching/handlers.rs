use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::matching::matcher::match_resume;
use crate::models::job_match::NewJobMatch;
use crate::resumes::owned_resume;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobMatchRequest {
    pub resume_id: Option<Uuid>,
    pub job_description: Option<String>,
    pub company_name: Option<String>,
}

/// POST /api/job-matching
pub async fn handle_create_job_match(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<JobMatchRequest>,
) -> Result<Json<Value>, AppError> {
    let resume_id = request
        .resume_id
        .ok_or_else(|| AppError::missing_field("resume_id"))?;
    let job_description = request
        .job_description
        .map(|jd| jd.trim().to_string())
        .filter(|jd| !jd.is_empty())
        .ok_or_else(|| AppError::missing_field("job_description"))?;
    let company_name = request
        .company_name
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let resume = owned_resume(&state, &user, resume_id).await?;
    let analysis = match_resume(
        &state.llm,
        &state.prompts,
        &resume.raw_text,
        &job_description,
        company_name.as_deref(),
    )
    .await?;

    let result = state
        .store
        .insert_job_match(NewJobMatch {
            user_id: user.id,
            resume_id: resume.id,
            job_description,
            company_name,
            ai_analysis: analysis,
        })
        .await?;

    info!(
        "Job match {} for resume {}: score {}",
        result.id, resume.id, result.ai_analysis.match_score
    );
    Ok(Json(json!({ "success": true, "result": result })))
}

/// GET /api/job-matching
pub async fn handle_list_job_matches(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let results = state.store.list_job_matches(user.id).await?;
    Ok(Json(json!({ "success": true, "results": results })))
}

/// GET /api/job-matching/:id
pub async fn handle_get_job_match(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let result = state
        .store
        .get_job_match(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job match not found".to_string()))?;
    Ok(Json(json!({ "success": true, "result": result })))
}
