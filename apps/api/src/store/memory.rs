//! In-process `Store` for router tests. Counts every call so tests can assert
//! that a rejected request never reached the database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::analysis::{AnalysisRow, NewAnalysis};
use crate::models::cover_letter::{CoverLetterRow, NewCoverLetter};
use crate::models::job_match::{JobMatchRow, NewJobMatch};
use crate::models::resume::{NewResume, ResumeEditRow, ResumeRow};
use crate::models::user::UserRow;
use crate::store::{Store, StoreResult};

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    resumes: Vec<ResumeRow>,
    analyses: Vec<AnalysisRow>,
    edits: Vec<ResumeEditRow>,
    job_matches: Vec<JobMatchRow>,
    cover_letters: Vec<CoverLetterRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn resume_count(&self) -> usize {
        self.tables.lock().unwrap().resumes.len()
    }

    pub fn analysis_count(&self) -> usize {
        self.tables.lock().unwrap().analyses.len()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().unwrap()
    }
}

fn newest_first<T: Clone>(rows: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    rows.rev().collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn ensure_user(&self, id: Uuid, email: &str) -> StoreResult<UserRow> {
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.email = email.to_string();
            return Ok(user.clone());
        }
        let user = UserRow {
            id,
            email: email.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn insert_resume(&self, resume: NewResume) -> StoreResult<ResumeRow> {
        let row = ResumeRow {
            id: resume.id,
            user_id: Some(resume.user_id),
            original_filename: resume.original_filename,
            mimetype: resume.mimetype,
            size: resume.size,
            raw_text: resume.raw_text,
            storage_key: resume.storage_key,
            uploaded_at: Utc::now(),
        };
        self.tables().resumes.push(row.clone());
        Ok(row)
    }

    async fn list_resumes(&self, user_id: Uuid) -> StoreResult<Vec<ResumeRow>> {
        let tables = self.tables();
        Ok(newest_first(
            tables
                .resumes
                .iter()
                .filter(|r| r.user_id == Some(user_id))
                .cloned(),
        ))
    }

    async fn get_resume(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<ResumeRow>> {
        let tables = self.tables();
        Ok(tables
            .resumes
            .iter()
            .find(|r| r.id == id && r.user_id == Some(user_id))
            .cloned())
    }

    async fn latest_resume(&self, user_id: Uuid) -> StoreResult<Option<ResumeRow>> {
        let tables = self.tables();
        Ok(tables
            .resumes
            .iter()
            .rev()
            .find(|r| r.user_id == Some(user_id))
            .cloned())
    }

    async fn delete_resume(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables();
        let before = tables.resumes.len();
        tables
            .resumes
            .retain(|r| !(r.id == id && r.user_id == Some(user_id)));
        let deleted = tables.resumes.len() < before;
        if deleted {
            tables.analyses.retain(|a| a.resume_id != id);
            tables.edits.retain(|e| e.resume_id != id);
        }
        Ok(deleted)
    }

    async fn insert_analysis(&self, analysis: NewAnalysis) -> StoreResult<AnalysisRow> {
        let row = AnalysisRow {
            id: Uuid::new_v4(),
            resume_id: analysis.resume_id,
            ats_score: Json(analysis.ats_score),
            category_insights: Json(analysis.category_insights),
            line_improvements: Json(analysis.line_improvements),
            analyzed_at: Utc::now(),
        };
        self.tables().analyses.push(row.clone());
        Ok(row)
    }

    async fn latest_analysis(&self, resume_id: Uuid) -> StoreResult<Option<AnalysisRow>> {
        let tables = self.tables();
        Ok(tables
            .analyses
            .iter()
            .rev()
            .find(|a| a.resume_id == resume_id)
            .cloned())
    }

    async fn insert_edit(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        edited_data: serde_json::Value,
    ) -> StoreResult<ResumeEditRow> {
        let row = ResumeEditRow {
            id: Uuid::new_v4(),
            resume_id,
            user_id,
            edited_data,
            created_at: Utc::now(),
        };
        self.tables().edits.push(row.clone());
        Ok(row)
    }

    async fn list_edits(&self, resume_id: Uuid, user_id: Uuid) -> StoreResult<Vec<ResumeEditRow>> {
        let tables = self.tables();
        Ok(newest_first(
            tables
                .edits
                .iter()
                .filter(|e| e.resume_id == resume_id && e.user_id == user_id)
                .cloned(),
        ))
    }

    async fn insert_job_match(&self, job_match: NewJobMatch) -> StoreResult<JobMatchRow> {
        let row = JobMatchRow {
            id: Uuid::new_v4(),
            user_id: job_match.user_id,
            resume_id: job_match.resume_id,
            job_description: job_match.job_description,
            company_name: job_match.company_name,
            ai_analysis: Json(job_match.ai_analysis),
            created_at: Utc::now(),
        };
        self.tables().job_matches.push(row.clone());
        Ok(row)
    }

    async fn list_job_matches(&self, user_id: Uuid) -> StoreResult<Vec<JobMatchRow>> {
        let tables = self.tables();
        Ok(newest_first(
            tables
                .job_matches
                .iter()
                .filter(|m| m.user_id == user_id)
                .cloned(),
        ))
    }

    async fn get_job_match(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<JobMatchRow>> {
        let tables = self.tables();
        Ok(tables
            .job_matches
            .iter()
            .find(|m| m.id == id && m.user_id == user_id)
            .cloned())
    }

    async fn insert_cover_letter(&self, letter: NewCoverLetter) -> StoreResult<CoverLetterRow> {
        let row = CoverLetterRow {
            id: Uuid::new_v4(),
            user_id: letter.user_id,
            resume_id: letter.resume_id,
            job_description: letter.job_description,
            cover_letter: letter.cover_letter,
            created_at: Utc::now(),
        };
        self.tables().cover_letters.push(row.clone());
        Ok(row)
    }

    async fn list_cover_letters(&self, user_id: Uuid) -> StoreResult<Vec<CoverLetterRow>> {
        let tables = self.tables();
        Ok(newest_first(
            tables
                .cover_letters
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned(),
        ))
    }

    async fn get_cover_letter(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<CoverLetterRow>> {
        let tables = self.tables();
        Ok(tables
            .cover_letters
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_resume(user_id: Uuid, name: &str) -> NewResume {
        NewResume {
            id: Uuid::new_v4(),
            user_id,
            original_filename: name.into(),
            mimetype: "text/plain".into(),
            size: 10,
            raw_text: "text".into(),
            storage_key: None,
        }
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_owner() {
        let store = MemoryStore::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let resume = store.insert_resume(new_resume(alice, "a.txt")).await.unwrap();

        assert!(store.get_resume(resume.id, alice).await.unwrap().is_some());
        assert!(store.get_resume(resume.id, bob).await.unwrap().is_none());
        assert!(!store.delete_resume(resume.id, bob).await.unwrap());
        assert_eq!(store.resume_count(), 1);
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        store.insert_resume(new_resume(user, "old.txt")).await.unwrap();
        store.insert_resume(new_resume(user, "new.txt")).await.unwrap();

        let names: Vec<_> = store
            .list_resumes(user)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.original_filename)
            .collect();
        assert_eq!(names, ["new.txt", "old.txt"]);
        assert_eq!(
            store.latest_resume(user).await.unwrap().unwrap().original_filename,
            "new.txt"
        );
    }
}
