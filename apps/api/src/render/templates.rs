//! Template Filler: `Document` to HTML through tera.
//!
//! Templates are embedded from `apps/api/templates/`; a file of the same name in
//! TEMPLATES_DIR replaces the embedded one. All are compiled once at startup.

use std::path::Path;

use tera::{Context, Tera};
use tracing::info;

use crate::render::document::{Document, ResumeData};
use crate::render::RenderError;

/// Templates callers may ask for by name.
pub const RESUME_TEMPLATES: [&str; 3] = ["modern", "classic", "simple"];

const LETTER_TEMPLATE: &str = "letter";

const EMBEDDED: [(&str, &str); 4] = [
    ("modern", include_str!("../../templates/modern.html")),
    ("classic", include_str!("../../templates/classic.html")),
    ("simple", include_str!("../../templates/simple.html")),
    (LETTER_TEMPLATE, include_str!("../../templates/letter.html")),
];

/// Maps a caller-supplied name onto `RESUME_TEMPLATES`, case-insensitively.
pub fn resolve_template(template: &str) -> Result<&'static str, RenderError> {
    let wanted = template.trim();
    RESUME_TEMPLATES
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| RenderError::TemplateNotFound(template.to_string()))
}

pub struct TemplateFiller {
    tera: Tera,
}

impl TemplateFiller {
    pub fn embedded() -> Result<Self, RenderError> {
        Self::load(None)
    }

    pub fn load(override_dir: Option<&Path>) -> Result<Self, RenderError> {
        let mut sources = Vec::with_capacity(EMBEDDED.len());
        for (name, embedded) in EMBEDDED {
            let file_name = format!("{name}.html");
            let body = match override_dir.map(|dir| dir.join(&file_name)) {
                Some(path) if path.is_file() => {
                    info!("Loading template override {}", path.display());
                    std::fs::read_to_string(&path).map_err(|e| {
                        RenderError::Template(tera::Error::msg(format!(
                            "failed to read {}: {e}",
                            path.display()
                        )))
                    })?
                }
                _ => embedded.to_string(),
            };
            sources.push((file_name, body));
        }

        // Names end in .html, so tera autoescapes every value.
        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;
        Ok(Self { tera })
    }

    /// Renders resume data with one of `RESUME_TEMPLATES`.
    pub fn fill(&self, template: &str, data: &ResumeData) -> Result<String, RenderError> {
        let name = resolve_template(template)?;
        self.render(name, &Document::from_resume_data(data))
    }

    pub fn fill_letter(&self, document: &Document) -> Result<String, RenderError> {
        self.render(LETTER_TEMPLATE, document)
    }

    fn render(&self, name: &str, document: &Document) -> Result<String, RenderError> {
        let context = Context::from_serialize(document)?;
        Ok(self.tera.render(&format!("{name}.html"), &context)?)
    }
}
