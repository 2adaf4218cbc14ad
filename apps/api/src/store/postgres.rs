use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::analysis::{AnalysisRow, NewAnalysis};
use crate::models::cover_letter::{CoverLetterRow, NewCoverLetter};
use crate::models::job_match::{JobMatchRow, NewJobMatch};
use crate::models::resume::{NewResume, ResumeEditRow, ResumeRow};
use crate::models::user::UserRow;
use crate::store::{Store, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_user(&self, id: Uuid, email: &str) -> StoreResult<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_resume(&self, resume: NewResume) -> StoreResult<ResumeRow> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes
                (id, user_id, original_filename, mimetype, size, raw_text, storage_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(resume.user_id)
        .bind(&resume.original_filename)
        .bind(&resume.mimetype)
        .bind(resume.size)
        .bind(&resume.raw_text)
        .bind(&resume.storage_key)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted resume {} for user {}", row.id, resume.user_id);
        Ok(row)
    }

    async fn list_resumes(&self, user_id: Uuid) -> StoreResult<Vec<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_resume(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn latest_resume(&self, user_id: Uuid) -> StoreResult<Option<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY uploaded_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_resume(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_analysis(&self, analysis: NewAnalysis) -> StoreResult<AnalysisRow> {
        sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO resume_analysis
                (resume_id, ats_score, category_insights, line_improvements)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(analysis.resume_id)
        .bind(Json(&analysis.ats_score))
        .bind(Json(&analysis.category_insights))
        .bind(Json(&analysis.line_improvements))
        .fetch_one(&self.pool)
        .await
    }

    async fn latest_analysis(&self, resume_id: Uuid) -> StoreResult<Option<AnalysisRow>> {
        sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT * FROM resume_analysis
            WHERE resume_id = $1
            ORDER BY analyzed_at DESC
            LIMIT 1
            "#,
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_edit(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        edited_data: serde_json::Value,
    ) -> StoreResult<ResumeEditRow> {
        sqlx::query_as::<_, ResumeEditRow>(
            r#"
            INSERT INTO resume_edits (resume_id, user_id, edited_data)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(resume_id)
        .bind(user_id)
        .bind(edited_data)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_edits(&self, resume_id: Uuid, user_id: Uuid) -> StoreResult<Vec<ResumeEditRow>> {
        sqlx::query_as::<_, ResumeEditRow>(
            r#"
            SELECT * FROM resume_edits
            WHERE resume_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(resume_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_job_match(&self, job_match: NewJobMatch) -> StoreResult<JobMatchRow> {
        sqlx::query_as::<_, JobMatchRow>(
            r#"
            INSERT INTO job_matching_results
                (user_id, resume_id, job_description, company_name, ai_analysis)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(job_match.user_id)
        .bind(job_match.resume_id)
        .bind(&job_match.job_description)
        .bind(&job_match.company_name)
        .bind(Json(&job_match.ai_analysis))
        .fetch_one(&self.pool)
        .await
    }

    async fn list_job_matches(&self, user_id: Uuid) -> StoreResult<Vec<JobMatchRow>> {
        sqlx::query_as::<_, JobMatchRow>(
            "SELECT * FROM job_matching_results WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_job_match(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<JobMatchRow>> {
        sqlx::query_as::<_, JobMatchRow>(
            "SELECT * FROM job_matching_results WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_cover_letter(&self, letter: NewCoverLetter) -> StoreResult<CoverLetterRow> {
        sqlx::query_as::<_, CoverLetterRow>(
            r#"
            INSERT INTO cover_letters (user_id, resume_id, job_description, cover_letter)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(letter.user_id)
        .bind(letter.resume_id)
        .bind(&letter.job_description)
        .bind(&letter.cover_letter)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_cover_letters(&self, user_id: Uuid) -> StoreResult<Vec<CoverLetterRow>> {
        sqlx::query_as::<_, CoverLetterRow>(
            "SELECT * FROM cover_letters WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_cover_letter(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<CoverLetterRow>> {
        sqlx::query_as::<_, CoverLetterRow>(
            "SELECT * FROM cover_letters WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
