use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::render::docx::{render_docx, DOCX_MIME};
use crate::render::document::{Document, ResumeData};
use crate::render::templates::resolve_template;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub template: Option<String>,
    #[serde(default)]
    pub data: Option<ResumeData>,
}

impl GenerateRequest {
    fn into_parts(self) -> Result<(String, ResumeData), AppError> {
        let template = self
            .template
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("template"))?;
        let data = self.data.ok_or_else(|| AppError::missing_field("data"))?;
        Ok((template, data))
    }
}

/// A binary download with `Content-Disposition: attachment`.
pub fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{safe}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Lower-case, hyphenated stem for download filenames.
pub fn file_stem(title: &str) -> String {
    let stem = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_ascii_lowercase();
    if stem.is_empty() {
        "resume".to_string()
    } else {
        stem
    }
}

/// POST /api/upload/generate
pub async fn handle_generate_html(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Html<String>, AppError> {
    let (template, data) = request.into_parts()?;
    Ok(Html(state.templates.fill(&template, &data)?))
}

/// POST /api/upload/generate-pdf
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Response, AppError> {
    let (template, data) = request.into_parts()?;
    let html = state.templates.fill(&template, &data)?;
    let pdf = state.pdf.render(&html).await?;
    info!("Generated {template} PDF ({} bytes)", pdf.len());

    let stem = file_stem(data.name.as_deref().unwrap_or("resume"));
    Ok(attachment(pdf, "application/pdf", &format!("{stem}.pdf")))
}

/// POST /api/upload/generate-docx
///
/// DOCX layout is fixed, but `template` must still name a known template.
pub async fn handle_generate_docx(
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Response, AppError> {
    let (template, data) = request.into_parts()?;
    resolve_template(&template)?;
    let docx = render_docx(&Document::from_resume_data(&data))?;
    info!("Generated DOCX ({} bytes)", docx.len());

    let stem = file_stem(data.name.as_deref().unwrap_or("resume"));
    Ok(attachment(docx, DOCX_MIME, &format!("{stem}.docx")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Jane O'Roe"), "jane-o-roe");
        assert_eq!(file_stem("  "), "resume");
    }

    #[test]
    fn test_attachment_headers() {
        let response = attachment(vec![1, 2], "application/pdf", "cv\"\r\n.pdf");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"cv.pdf\""
        );
    }
}
