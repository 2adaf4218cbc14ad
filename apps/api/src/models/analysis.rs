use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-section feedback bullets, keyed by section name.
pub type CategoryInsights = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    /// Always within 0..=100.
    pub score: i32,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineImprovement {
    pub original: String,
    pub issue: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub ats_score: Json<AtsScore>,
    pub category_insights: Json<CategoryInsights>,
    pub line_improvements: Json<Vec<LineImprovement>>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub resume_id: Uuid,
    pub ats_score: AtsScore,
    pub category_insights: CategoryInsights,
    pub line_improvements: Vec<LineImprovement>,
}
