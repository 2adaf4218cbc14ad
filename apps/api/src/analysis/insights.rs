//! Category Classifier: per-section feedback and line-level rewrites.

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::{PromptKind, PromptSet};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::analysis::{CategoryInsights, LineImprovement};

/// Both keys are required; a response missing either is `Malformed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub category_insights: CategoryInsights,
    pub line_improvements: Vec<LineImprovement>,
}

impl CategoryAnalysis {
    /// Drops blank bullets and categories left with nothing to say.
    fn tidy(mut self) -> Self {
        for bullets in self.category_insights.values_mut() {
            bullets.retain(|b| !b.trim().is_empty());
        }
        self.category_insights.retain(|_, bullets| !bullets.is_empty());
        self.line_improvements
            .retain(|l| !l.original.trim().is_empty() && !l.suggestion.trim().is_empty());
        self
    }
}

pub async fn classify_resume(
    llm: &LlmClient,
    prompts: &PromptSet,
    resume_text: &str,
) -> Result<CategoryAnalysis, LlmError> {
    let prompt = prompts.render(PromptKind::CategoryInsights, &[("resume_text", resume_text)]);
    let analysis = llm.call_json::<CategoryAnalysis>(&prompt).await?;
    Ok(analysis.tidy())
}
