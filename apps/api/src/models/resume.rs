use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub original_filename: String,
    pub mimetype: String,
    pub size: i64,
    pub raw_text: String,
    pub storage_key: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Fields supplied when a resume is first stored.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_filename: String,
    pub mimetype: String,
    pub size: i64,
    pub raw_text: String,
    pub storage_key: Option<String>,
}

/// Append-only edit snapshot. `edited_data` is whatever the editor sent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeEditRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub user_id: Uuid,
    pub edited_data: Value,
    pub created_at: DateTime<Utc>,
}
