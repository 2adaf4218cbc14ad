//! ATS Scorer: free-text model answer reduced to a clamped 0–100 score.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm_client::prompts::{PromptKind, PromptSet};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::analysis::AtsScore;
use crate::models::lenient::clamp_score;

static SCORE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d{1,3}").unwrap());

/// First integer token in `text`, clamped; `0` when there is none.
pub fn parse_ats_score(text: &str) -> AtsScore {
    let score = SCORE_TOKEN
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(clamp_score)
        .unwrap_or(0);
    AtsScore {
        score,
        explanation: text.trim().to_string(),
    }
}

pub async fn score_resume(
    llm: &LlmClient,
    prompts: &PromptSet,
    resume_text: &str,
) -> Result<AtsScore, LlmError> {
    let prompt = prompts.render(PromptKind::AtsScore, &[("resume_text", resume_text)]);
    let text = llm.call(&prompt).await?;
    Ok(parse_ats_score(&text))
}
