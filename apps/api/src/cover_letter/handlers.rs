use axum::{extract::State, response::Response, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cover_letter::generator::{generate_cover_letter, QuestionAnswer};
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::cover_letter::{CoverLetterRow, NewCoverLetter};
use crate::models::lenient;
use crate::render::docx::{render_docx, DOCX_MIME};
use crate::render::document::Document;
use crate::render::handlers::attachment;
use crate::resumes::owned_resume;
use crate::state::AppState;

const LETTER_TITLE: &str = "Cover Letter";

#[derive(Debug, Deserialize)]
pub struct GenerateCoverLetterRequest {
    pub resume_id: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub resume_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub job_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub answers: Vec<QuestionAnswer>,
}

/// POST /api/cover-letter/generate
///
/// Uses the stored resume when `resume_id` is given, otherwise `resume_text`.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<GenerateCoverLetterRequest>,
) -> Result<Json<Value>, AppError> {
    let (resume_id, resume_text) = match (request.resume_id, request.resume_text) {
        (Some(id), _) => {
            let resume = owned_resume(&state, &user, id).await?;
            (Some(resume.id), resume.raw_text)
        }
        (None, Some(text)) => (None, text),
        (None, None) => return Err(AppError::missing_field("resume_id or resume_text")),
    };

    let letter = generate_cover_letter(
        &state.llm,
        &state.prompts,
        &resume_text,
        request.job_description.as_deref(),
        &request.answers,
    )
    .await?;

    let row = state
        .store
        .insert_cover_letter(NewCoverLetter {
            user_id: user.id,
            resume_id,
            job_description: request.job_description,
            cover_letter: letter,
        })
        .await?;

    info!("Generated cover letter {} for user {}", row.id, user.id);
    Ok(Json(json!({
        "success": true,
        "coverLetter": row.cover_letter,
        "coverLetterId": row.id,
    })))
}

/// GET /api/cover-letter
pub async fn handle_list_cover_letters(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let letters = state.store.list_cover_letters(user.id).await?;
    Ok(Json(json!({ "success": true, "coverLetters": letters })))
}

async fn owned_letter(state: &AppState, user: &AuthUser, id: Uuid) -> Result<CoverLetterRow, AppError> {
    state
        .store
        .get_cover_letter(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cover letter not found".to_string()))
}

/// GET /api/cover-letter/:id
pub async fn handle_get_cover_letter(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let letter = owned_letter(&state, &user, id).await?;
    Ok(Json(json!({ "success": true, "coverLetter": letter })))
}

/// GET /api/cover-letter/:id/pdf
pub async fn handle_cover_letter_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let letter = owned_letter(&state, &user, id).await?;
    let document = Document::from_letter(LETTER_TITLE, &letter.cover_letter);
    let html = state.templates.fill_letter(&document)?;
    let pdf = state.pdf.render(&html).await?;
    Ok(attachment(pdf, "application/pdf", &format!("cover-letter-{id}.pdf")))
}

/// GET /api/cover-letter/:id/docx
pub async fn handle_cover_letter_docx(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let letter = owned_letter(&state, &user, id).await?;
    let docx = render_docx(&Document::from_letter(LETTER_TITLE, &letter.cover_letter))?;
    Ok(attachment(docx, DOCX_MIME, &format!("cover-letter-{id}.docx")))
}
