use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::lenient;

/// The AI's compatibility assessment. Every key is required; `match_score` may
/// arrive as a number or numeric string and is clamped to 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatchAnalysis {
    #[serde(deserialize_with = "lenient::score")]
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMatchRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub job_description: String,
    pub company_name: Option<String>,
    pub ai_analysis: Json<JobMatchAnalysis>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJobMatch {
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub job_description: String,
    pub company_name: Option<String>,
    pub ai_analysis: JobMatchAnalysis,
}
