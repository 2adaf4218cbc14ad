//! Job Matcher: one resume against one job description.

use crate::llm_client::prompts::{PromptKind, PromptSet};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::job_match::JobMatchAnalysis;

/// Used in the prompt when the caller gave no company.
const UNNAMED_COMPANY: &str = "the hiring company";

pub async fn match_resume(
    llm: &LlmClient,
    prompts: &PromptSet,
    resume_text: &str,
    job_description: &str,
    company_name: Option<&str>,
) -> Result<JobMatchAnalysis, LlmError> {
    let prompt = prompts.render(
        PromptKind::JobMatch,
        &[
            ("resume_text", resume_text),
            ("job_description", job_description),
            ("company_name", company_name.unwrap_or(UNNAMED_COMPANY)),
        ],
    );
    llm.call_json::<JobMatchAnalysis>(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_response;
    use crate::testing::{fake_llm_client, FakeBackend};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_string_score_is_parsed_and_clamped() {
        let analysis: JobMatchAnalysis = parse_json_response(
            r#"{"match_score": "140", "strengths": ["Rust"], "gaps": [], "suggestions": []}"#,
        )
        .unwrap();
        assert_eq!(analysis.match_score, 100);
    }

    #[test]
    fn test_missing_key_is_malformed() {
        let err = parse_json_response::<JobMatchAnalysis>(
            r#"{"match_score": 70, "strengths": [], "gaps": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_prompt_carries_inputs_and_company_fallback() {
        let seen = Arc::new(Mutex::new(String::new()));
        let captured = seen.clone();
        let backend = Arc::new(FakeBackend::by_prompt(move |prompt| {
            *captured.lock().unwrap() = prompt.to_string();
            Ok(r#"{"match_score": 64, "strengths": [], "gaps": ["Go"], "suggestions": []}"#.into())
        }));
        let llm = fake_llm_client(backend);
        let prompts = PromptSet::embedded().unwrap();

        let analysis = match_resume(&llm, &prompts, "RESUME-TEXT", "Needs Go and {resume_text}", None)
            .await
            .unwrap();

        assert_eq!(analysis.match_score, 64);
        let prompt = seen.lock().unwrap().clone();
        assert!(prompt.contains("RESUME-TEXT"));
        assert!(prompt.contains("Needs Go and {resume_text}"));
        assert!(prompt.contains(UNNAMED_COMPANY));
    }
}
