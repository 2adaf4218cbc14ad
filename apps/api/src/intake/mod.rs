// Resume intake: bytes in, validated plain text out.
// Everything here runs before any AI call or database write.

pub mod cleaner;
pub mod extractor;
pub mod ocr;
pub mod upload;
pub mod validator;

use tracing::info;

use crate::errors::AppError;
use crate::intake::cleaner::clean_text;
use crate::intake::extractor::TextExtractor;
use crate::intake::upload::UploadedFile;
use crate::intake::validator::resume_signals;

/// Extracts, cleans, and gates an uploaded file. Rejects with `INVALID_RESUME`
/// when the text does not look like a resume.
pub async fn read_resume_text(
    extractor: &TextExtractor,
    file: &UploadedFile,
) -> Result<String, AppError> {
    let raw = extractor.extract(&file.bytes, file.kind).await?;
    let text = clean_text(&raw);

    let signals = resume_signals(&text);
    info!(
        "Intake for '{}' ({:?}, {} bytes): {} chars, {} headers, contact={}",
        file.filename,
        file.kind,
        file.bytes.len(),
        text.len(),
        signals.header_count,
        signals.has_contact()
    );

    if !signals.is_likely_resume() {
        return Err(AppError::bad_request(
            "INVALID_RESUME",
            "The uploaded file does not appear to be a resume",
        ));
    }

    Ok(text)
}
