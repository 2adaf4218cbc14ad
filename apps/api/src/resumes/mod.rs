//! Stored resumes: upload, listing, lookup, deletion, and edit snapshots.

pub mod handlers;

use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::intake::upload::UploadedFile;
use crate::models::resume::{NewResume, ResumeRow};
use crate::state::AppState;

/// Archives the original (best effort) and inserts the resume row.
pub async fn persist_upload(
    state: &AppState,
    user: &AuthUser,
    file: &UploadedFile,
    raw_text: String,
) -> Result<ResumeRow, AppError> {
    let resume_id = Uuid::new_v4();
    let mimetype = file.kind.mime().to_string();
    let storage_key = state
        .archive
        .store(
            user.id,
            resume_id,
            &file.filename,
            &mimetype,
            file.bytes.clone(),
        )
        .await;

    let resume = state
        .store
        .insert_resume(NewResume {
            id: resume_id,
            user_id: user.id,
            original_filename: file.filename.clone(),
            mimetype,
            size: file.size(),
            raw_text,
            storage_key,
        })
        .await?;
    Ok(resume)
}

/// The caller's resume, or a 404 that does not reveal whether it exists.
pub async fn owned_resume(
    state: &AppState,
    user: &AuthUser,
    resume_id: Uuid,
) -> Result<ResumeRow, AppError> {
    state
        .store
        .get_resume(resume_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}
