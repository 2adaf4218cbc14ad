//! Persistence seam. Every read of user-owned data takes the caller's id and
//! filters on it, so a foreign row is indistinguishable from a missing one.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::analysis::{AnalysisRow, NewAnalysis};
use crate::models::cover_letter::{CoverLetterRow, NewCoverLetter};
use crate::models::job_match::{JobMatchRow, NewJobMatch};
use crate::models::resume::{NewResume, ResumeEditRow, ResumeRow};
use crate::models::user::UserRow;

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts the profile row, or refreshes its email if it already exists.
    async fn ensure_user(&self, id: Uuid, email: &str) -> StoreResult<UserRow>;

    async fn insert_resume(&self, resume: NewResume) -> StoreResult<ResumeRow>;
    /// Newest first.
    async fn list_resumes(&self, user_id: Uuid) -> StoreResult<Vec<ResumeRow>>;
    async fn get_resume(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<ResumeRow>>;
    async fn latest_resume(&self, user_id: Uuid) -> StoreResult<Option<ResumeRow>>;
    /// Returns false when nothing owned by `user_id` matched.
    async fn delete_resume(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    async fn insert_analysis(&self, analysis: NewAnalysis) -> StoreResult<AnalysisRow>;
    /// Most recent by `analyzed_at`. Callers check resume ownership first.
    async fn latest_analysis(&self, resume_id: Uuid) -> StoreResult<Option<AnalysisRow>>;

    async fn insert_edit(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        edited_data: serde_json::Value,
    ) -> StoreResult<ResumeEditRow>;
    async fn list_edits(&self, resume_id: Uuid, user_id: Uuid) -> StoreResult<Vec<ResumeEditRow>>;

    async fn insert_job_match(&self, job_match: NewJobMatch) -> StoreResult<JobMatchRow>;
    async fn list_job_matches(&self, user_id: Uuid) -> StoreResult<Vec<JobMatchRow>>;
    async fn get_job_match(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<JobMatchRow>>;

    async fn insert_cover_letter(&self, letter: NewCoverLetter) -> StoreResult<CoverLetterRow>;
    async fn list_cover_letters(&self, user_id: Uuid) -> StoreResult<Vec<CoverLetterRow>>;
    async fn get_cover_letter(&self, id: Uuid, user_id: Uuid)
        -> StoreResult<Option<CoverLetterRow>>;
}
