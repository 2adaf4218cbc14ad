//! Text Extractor: dispatches raw upload bytes to a format-specific decoder.
//!
//! PDF goes through `pdf-extract` on the blocking pool, DOCX is read straight out of
//! its ZIP container, DOC/RTF/TXT use lightweight text recovery, and images go to OCR.

use std::io::{Cursor, Read};
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

use crate::intake::ocr::OcrEngine;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read DOCX: {0}")]
    Docx(String),

    #[error("OCR failed: {0}")]
    Ocr(String),
}

/// The closed set of upload formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Doc,
    Txt,
    Rtf,
    Jpeg,
    Png,
}

impl FileKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(FileKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Docx)
            }
            "application/msword" => Some(FileKind::Doc),
            "text/plain" => Some(FileKind::Txt),
            "application/rtf" | "text/rtf" => Some(FileKind::Rtf),
            "image/jpeg" | "image/jpg" => Some(FileKind::Jpeg),
            "image/png" => Some(FileKind::Png),
            _ => None,
        }
    }

    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "doc" => Some(FileKind::Doc),
            "txt" => Some(FileKind::Txt),
            "rtf" => Some(FileKind::Rtf),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "png" => Some(FileKind::Png),
            _ => None,
        }
    }

    /// Canonical MIME type stored alongside the resume.
    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Doc => "application/msword",
            FileKind::Txt => "text/plain",
            FileKind::Rtf => "application/rtf",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
        }
    }
}

#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl TextExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub async fn extract(&self, bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
        match kind {
            FileKind::Pdf => {
                let owned = bytes.to_vec();
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&owned))
                    .await
                    .map_err(|e| ExtractError::Pdf(e.to_string()))?
                    .map_err(|e| ExtractError::Pdf(e.to_string()))
            }
            FileKind::Docx => docx_text(bytes),
            FileKind::Doc => Ok(legacy_doc_text(bytes)),
            FileKind::Rtf => Ok(rtf_text(&String::from_utf8_lossy(bytes))),
            FileKind::Txt => Ok(plain_text(bytes)),
            FileKind::Jpeg | FileKind::Png => self.ocr.recognize(bytes).await,
        }
    }
}

fn plain_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads `word/document.xml` out of a DOCX package and flattens it to text.
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
    }

    Ok(out)
}

const MIN_RUN: usize = 4;

/// Best-effort text recovery for binary Word 97 files: keep runs of printable
/// characters from both the 8-bit and the UTF-16LE reading, whichever yields more.
fn legacy_doc_text(bytes: &[u8]) -> String {
    let narrow = printable_runs(bytes.iter().map(|&b| b as u16));
    let wide = printable_runs(
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
    );
    if wide.len() > narrow.len() {
        wide
    } else {
        narrow
    }
}

fn printable_runs(units: impl Iterator<Item = u16>) -> String {
    let mut out = String::new();
    let mut run = String::new();

    let flush = |run: &mut String, out: &mut String| {
        if run.trim().chars().count() >= MIN_RUN {
            out.push_str(run.trim());
            out.push('\n');
        }
        run.clear();
    };

    for unit in units {
        match unit {
            0x0D | 0x0A | 0x0B => flush(&mut run, &mut out),
            0x09 => run.push('\t'),
            0x20..=0x7E => run.push(unit as u8 as char),
            0xA0..=0xFF => run.push(char::from(unit as u8)),
            _ => flush(&mut run, &mut out),
        }
    }
    flush(&mut run, &mut out);
    out
}

/// RTF groups whose contents are never body text.
const IGNORED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "footer",
    "listtable",
    "listoverridetable",
];

/// Strips RTF markup down to its visible text.
fn rtf_text(rtf: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = rtf.chars().collect();
    let mut i = 0;
    let mut depth = 0usize;
    // Depth at which the current skipped group started; `None` while emitting.
    let mut skip_from: Option<usize> = None;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                depth += 1;
                i += 1;
            }
            '}' => {
                if skip_from == Some(depth) {
                    skip_from = None;
                }
                depth = depth.saturating_sub(1);
                i += 1;
            }
            '\\' => {
                let next = chars.get(i + 1).copied();
                match next {
                    Some(ch @ ('\\' | '{' | '}')) => {
                        if skip_from.is_none() {
                            out.push(ch);
                        }
                        i += 2;
                    }
                    Some('*') => {
                        skip_from.get_or_insert(depth);
                        i += 2;
                    }
                    Some('\'') => {
                        let hex: String = chars.iter().skip(i + 2).take(2).collect();
                        if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                            if skip_from.is_none() {
                                out.push(char::from(byte));
                            }
                        }
                        i += 4;
                    }
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        let start = i + 1;
                        let mut end = start;
                        while end < chars.len() && chars[end].is_ascii_alphabetic() {
                            end += 1;
                        }
                        let word: String = chars[start..end].iter().collect();
                        if end < chars.len() && chars[end] == '-' {
                            end += 1;
                        }
                        while end < chars.len() && chars[end].is_ascii_digit() {
                            end += 1;
                        }
                        if end < chars.len() && chars[end] == ' ' {
                            end += 1;
                        }
                        i = end;

                        if IGNORED_DESTINATIONS.contains(&word.as_str()) {
                            skip_from.get_or_insert(depth);
                        } else if skip_from.is_none() {
                            match word.as_str() {
                                "par" | "line" | "sect" | "page" => out.push('\n'),
                                "tab" => out.push('\t'),
                                _ => {}
                            }
                        }
                    }
                    _ => i += 2,
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if skip_from.is_none() {
                    out.push(c);
                }
                i += 1;
            }
        }
    }

    out
}
