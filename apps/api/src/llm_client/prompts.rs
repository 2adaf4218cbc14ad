// Prompt templates for every AI-backed feature.
//
// Templates live as plain text files under `apps/api/prompts/` and are embedded at
// build time. Setting PROMPTS_DIR overrides any of them at startup without a rebuild.
// Every template is checked for its required `{placeholders}` when loaded.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::info;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt '{name}' is missing required placeholder {{{placeholder}}}")]
    MissingPlaceholder { name: String, placeholder: String },

    #[error("failed to read prompt override {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    ResumeParse,
    AtsScore,
    CategoryInsights,
    JobMatch,
    CoverLetter,
}

impl PromptKind {
    pub const ALL: [PromptKind; 5] = [
        PromptKind::ResumeParse,
        PromptKind::AtsScore,
        PromptKind::CategoryInsights,
        PromptKind::JobMatch,
        PromptKind::CoverLetter,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            PromptKind::ResumeParse => "resume_parse.txt",
            PromptKind::AtsScore => "ats_score.txt",
            PromptKind::CategoryInsights => "category_insights.txt",
            PromptKind::JobMatch => "job_match.txt",
            PromptKind::CoverLetter => "cover_letter.txt",
        }
    }

    pub fn required_placeholders(&self) -> &'static [&'static str] {
        match self {
            PromptKind::ResumeParse | PromptKind::AtsScore | PromptKind::CategoryInsights => {
                &["resume_text"]
            }
            PromptKind::JobMatch => &["resume_text", "job_description", "company_name"],
            PromptKind::CoverLetter => &["resume_text", "job_description", "answers"],
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            PromptKind::ResumeParse => include_str!("../../prompts/resume_parse.txt"),
            PromptKind::AtsScore => include_str!("../../prompts/ats_score.txt"),
            PromptKind::CategoryInsights => include_str!("../../prompts/category_insights.txt"),
            PromptKind::JobMatch => include_str!("../../prompts/job_match.txt"),
            PromptKind::CoverLetter => include_str!("../../prompts/cover_letter.txt"),
        }
    }
}

/// A validated prompt template. Rendering is a pure `(inputs) -> prompt` function.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    body: String,
}

impl PromptTemplate {
    pub fn new(name: &str, body: String, required: &[&str]) -> Result<Self, PromptError> {
        for placeholder in required {
            if !body.contains(&format!("{{{placeholder}}}")) {
                return Err(PromptError::MissingPlaceholder {
                    name: name.to_string(),
                    placeholder: placeholder.to_string(),
                });
            }
        }
        Ok(Self { body })
    }

    /// Substitutes `{name}` tokens in a single pass. Substituted values are never
    /// re-scanned, so user text containing braces stays literal. Unknown tokens
    /// (e.g. JSON examples in the template) are left untouched.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        PLACEHOLDER
            .replace_all(&self.body, |caps: &Captures| {
                vars.iter()
                    .find(|(key, _)| *key == &caps[1])
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// All prompt templates, loaded once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: HashMap<PromptKind, PromptTemplate>,
}

impl PromptSet {
    /// Embedded templates only.
    pub fn embedded() -> Result<Self, PromptError> {
        Self::load(None)
    }

    /// Embedded templates, with any file present in `override_dir` taking precedence.
    pub fn load(override_dir: Option<&Path>) -> Result<Self, PromptError> {
        let mut templates = HashMap::new();
        for kind in PromptKind::ALL {
            let body = match override_dir.map(|dir| dir.join(kind.file_name())) {
                Some(path) if path.is_file() => {
                    info!("Loading prompt override {}", path.display());
                    std::fs::read_to_string(&path).map_err(|source| PromptError::Io {
                        path: path.display().to_string(),
                        source,
                    })?
                }
                _ => kind.embedded().to_string(),
            };
            let template = PromptTemplate::new(kind.file_name(), body, kind.required_placeholders())?;
            templates.insert(kind, template);
        }
        Ok(Self { templates })
    }

    pub fn render(&self, kind: PromptKind, vars: &[(&str, &str)]) -> String {
        // Every kind is inserted by `load`.
        self.templates
            .get(&kind)
            .map(|t| t.render(vars))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_templates_all_validate() {
        let prompts = PromptSet::embedded().unwrap();
        for kind in PromptKind::ALL {
            let rendered = prompts.render(kind, &[]);
            assert!(!rendered.is_empty(), "{kind:?} rendered empty");
        }
    }

    #[test]
    fn test_missing_placeholder_rejected_at_load() {
        let err = PromptTemplate::new("job_match.txt", "Compare {resume_text}".into(), &[
            "resume_text",
            "job_description",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("{job_description}"));
    }

    #[test]
    fn test_render_is_single_pass() {
        let template =
            PromptTemplate::new("t", "R: {resume_text}\nJ: {job_description}".into(), &[])
                .unwrap();
        let rendered = template.render(&[
            ("resume_text", "I wrote {job_description} literally"),
            ("job_description", "Rust dev"),
        ]);
        assert_eq!(rendered, "R: I wrote {job_description} literally\nJ: Rust dev");
    }

    #[test]
    fn test_unknown_tokens_left_alone() {
        let template = PromptTemplate::new("t", r#"{"score": {score}} {resume_text}"#.into(), &[])
            .unwrap();
        assert_eq!(
            template.render(&[("resume_text", "cv")]),
            r#"{"score": {score}} cv"#
        );
    }

    #[test]
    fn test_override_dir_replaces_single_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ats_score.txt"), "Custom ATS {resume_text}").unwrap();

        let prompts = PromptSet::load(Some(dir.path())).unwrap();
        assert_eq!(
            prompts.render(PromptKind::AtsScore, &[("resume_text", "cv")]),
            "Custom ATS cv"
        );
        assert!(prompts
            .render(PromptKind::ResumeParse, &[("resume_text", "cv")])
            .contains("cv"));
    }

    #[test]
    fn test_invalid_override_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job_match.txt"), "no placeholders here").unwrap();
        assert!(PromptSet::load(Some(dir.path())).is_err());
    }
}
