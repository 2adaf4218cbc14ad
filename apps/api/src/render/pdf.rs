//! HTML to PDF through headless Chromium.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::render::RenderError;

/// A4 with fixed margins; backgrounds printed as on screen.
const PRINT_STYLES: &str = "<style>@page { size: A4; margin: 18mm 16mm; } \
html, body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }</style>";

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Inserts the print stylesheet at the end of `<head>`, or up front when there is none.
pub fn with_print_styles(html: &str) -> String {
    match html.find("</head>") {
        Some(at) => format!("{}{}{}", &html[..at], PRINT_STYLES, &html[at..]),
        None => format!("{PRINT_STYLES}{html}"),
    }
}

pub struct ChromiumPdf {
    binary: PathBuf,
    timeout: Duration,
}

impl ChromiumPdf {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }
}

#[async_trait]
impl PdfRenderer for ChromiumPdf {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        // Removed on drop, on every exit path.
        let workdir = tempfile::tempdir().map_err(|e| RenderError::Pdf(e.to_string()))?;
        let input = workdir.path().join("document.html");
        let output = workdir.path().join("document.pdf");

        tokio::fs::write(&input, with_print_styles(html))
            .await
            .map_err(|e| RenderError::Pdf(format!("writing HTML: {e}")))?;

        let child = Command::new(&self.binary)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::Pdf(format!("failed to start {}: {e}", self.binary.display()))
            })?;

        let finished = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("Chromium did not finish within {:?}", self.timeout);
                RenderError::Pdf(format!("timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        if !finished.status.success() {
            return Err(RenderError::Pdf(format!(
                "chromium exited with {}: {}",
                finished.status,
                String::from_utf8_lossy(&finished.stderr).trim()
            )));
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| RenderError::Pdf(format!("no PDF produced: {e}")))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(RenderError::Pdf("output is not a PDF".to_string()));
        }

        debug!("Rendered PDF ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_styles_go_inside_head() {
        let html = with_print_styles("<html><head><title>x</title></head><body></body></html>");
        let styles = html.find("@page").unwrap();
        assert!(styles > html.find("<title>").unwrap());
        assert!(styles < html.find("</head>").unwrap());
    }

    #[test]
    fn test_print_styles_prepended_without_head() {
        let html = with_print_styles("<p>hi</p>");
        assert!(html.starts_with("<style>@page"));
        assert!(html.ends_with("<p>hi</p>"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_render_error() {
        let renderer = ChromiumPdf::new(
            PathBuf::from("/nonexistent/chromium-for-tests"),
            Duration::from_secs(5),
        );
        assert!(matches!(
            renderer.render("<p>x</p>").await,
            Err(RenderError::Pdf(_))
        ));
    }
}
