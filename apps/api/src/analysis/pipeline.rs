//! Parse, score, and classify one resume text. The three AI calls are
//! independent and run concurrently; the gateway caps how many reach the provider.

use serde::Serialize;
use tracing::info;

use crate::analysis::ats::score_resume;
use crate::analysis::insights::{classify_resume, CategoryAnalysis};
use crate::analysis::parser::{parse_resume, ParsedResume};
use crate::llm_client::prompts::PromptSet;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::analysis::AtsScore;

#[derive(Debug, Clone, Serialize)]
pub struct ResumeAnalysis {
    pub parsed: ParsedResume,
    pub ats: AtsScore,
    pub categories: CategoryAnalysis,
}

pub async fn analyze_resume(
    llm: &LlmClient,
    prompts: &PromptSet,
    resume_text: &str,
) -> Result<ResumeAnalysis, LlmError> {
    let (parsed, ats, categories) = tokio::try_join!(
        parse_resume(llm, prompts, resume_text),
        score_resume(llm, prompts, resume_text),
        classify_resume(llm, prompts, resume_text),
    )?;

    info!(
        "Analysis complete: ats_score={}, categories={}, line_improvements={}",
        ats.score,
        categories.category_insights.len(),
        categories.line_improvements.len()
    );

    Ok(ResumeAnalysis {
        parsed,
        ats,
        categories,
    })
}
