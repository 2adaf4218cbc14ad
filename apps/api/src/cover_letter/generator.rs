//! Cover-Letter Generator.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::intake::cleaner::clean_text;
use crate::llm_client::prompts::{PromptKind, PromptSet};
use crate::llm_client::{LlmClient, LlmError};

pub const NO_JOB_DESCRIPTION: &str = "No job description provided. Write a general cover letter highlighting the candidate's most transferable strengths.";
pub const NO_ANSWERS: &str = "No additional information provided.";

/// Section names followed by a colon, wherever they appear in a line.
static INLINE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(work experience|professional experience|experience|education|skills|projects|summary|objective|contact|certifications?)[ \t]*:[ \t]*",
    )
    .unwrap()
});

/// Sentence end followed by the start of the next sentence.
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])[ \t]+([A-Z])").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionAnswer {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Puts section headers on their own lines and each sentence on its own line.
pub fn reformat_resume(text: &str) -> String {
    let headed = INLINE_HEADER.replace_all(text, "\n\n$1:\n");
    let split = SENTENCE_BREAK.replace_all(&headed, "$1\n$2");
    clean_text(&split)
}

/// Non-empty pairs as `Q:`/`A:` blocks, or the fallback line.
pub fn format_answers(answers: &[QuestionAnswer]) -> String {
    let blocks: Vec<String> = answers
        .iter()
        .map(|qa| (qa.question.trim(), qa.answer.trim()))
        .filter(|(q, a)| !q.is_empty() && !a.is_empty())
        .map(|(q, a)| format!("Q: {q}\nA: {a}"))
        .collect();
    if blocks.is_empty() {
        NO_ANSWERS.to_string()
    } else {
        blocks.join("\n\n")
    }
}

pub async fn generate_cover_letter(
    llm: &LlmClient,
    prompts: &PromptSet,
    resume_text: &str,
    job_description: Option<&str>,
    answers: &[QuestionAnswer],
) -> Result<String, LlmError> {
    let resume = reformat_resume(resume_text);
    let job_description = job_description
        .map(str::trim)
        .filter(|jd| !jd.is_empty())
        .unwrap_or(NO_JOB_DESCRIPTION);
    let answers = format_answers(answers);

    let prompt = prompts.render(
        PromptKind::CoverLetter,
        &[
            ("resume_text", resume.as_str()),
            ("job_description", job_description),
            ("answers", answers.as_str()),
        ],
    );

    let letter = llm.call(&prompt).await?.trim().to_string();
    if letter.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(letter)
}
