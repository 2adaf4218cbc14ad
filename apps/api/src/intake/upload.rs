use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;
use crate::intake::extractor::{ExtractError, FileKind};

/// Multipart field names accepted for the resume file.
const FILE_FIELDS: &[&str] = &["resume", "file"];

/// A validated upload: known format, within the size cap.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub kind: FileKind,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }
}

/// Resolves the upload format from the declared content type, falling back to the
/// filename extension when the client sent nothing useful.
pub fn resolve_kind(content_type: Option<&str>, filename: &str) -> Result<FileKind, ExtractError> {
    match content_type.map(str::trim).filter(|ct| !ct.is_empty()) {
        Some(ct) if !ct.starts_with("application/octet-stream") => FileKind::from_mime(ct)
            .ok_or_else(|| ExtractError::UnsupportedFileType(ct.to_string())),
        _ => FileKind::from_extension(filename)
            .ok_or_else(|| ExtractError::UnsupportedFileType(filename.to_string())),
    }
}

/// Pulls the first resume file field out of a multipart body.
pub async fn read_upload(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        let is_file_field = field
            .name()
            .map(|name| FILE_FIELDS.contains(&name))
            .unwrap_or(false);
        if !is_file_field {
            continue;
        }
        return read_file_field(field, max_bytes).await;
    }

    Err(AppError::bad_request("NO_FILE", "No resume file was uploaded"))
}

async fn read_file_field(field: Field<'_>, max_bytes: usize) -> Result<UploadedFile, AppError> {
    let filename = field.file_name().unwrap_or("resume").to_string();
    let kind = resolve_kind(field.content_type(), &filename)?;
    let bytes = field.bytes().await.map_err(invalid_upload)?;

    if bytes.len() > max_bytes {
        return Err(AppError::bad_request(
            "FILE_TOO_LARGE",
            format!("File exceeds the {} byte upload limit", max_bytes),
        ));
    }
    if bytes.is_empty() {
        return Err(AppError::bad_request("NO_FILE", "Uploaded file is empty"));
    }

    debug!("Received upload '{filename}' as {kind:?}, {} bytes", bytes.len());
    Ok(UploadedFile {
        filename,
        kind,
        bytes,
    })
}

fn invalid_upload(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::bad_request("FILE_TOO_LARGE", "File exceeds the upload limit");
    }
    AppError::bad_request("INVALID_BODY", format!("Malformed multipart body: {e}"))
}
