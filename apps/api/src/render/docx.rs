//! Minimal WordprocessingML writer for `Document`.
//!
//! Styling is fixed: Calibri, dark grey text, 11 pt body with 16/12 pt headings,
//! A4 pages, bullets as hanging-indent paragraphs.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::render::document::{Document, Paragraph, ParagraphStyle, Run, SectionKind};
use crate::render::RenderError;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

/// A4 (twips), 18 mm top/bottom and 16 mm side margins.
const DOCUMENT_CLOSE: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1020" w:right="907" w:bottom="1020" w:left="907" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

const FONT: &str = "Calibri";
const COLOR: &str = "333333";

// Half-points.
const BODY_SIZE: u32 = 22;
const META_SIZE: u32 = 20;
const TITLE_SIZE: u32 = 32;
const HEADING_SIZE: u32 = 24;

/// XML 1.0 `Char`: no C0 controls other than tab, LF and CR; no U+FFFE / U+FFFF.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}')
}

/// Drops characters Word would reject (form feeds from PDF text, stray control bytes).
fn xml_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn run_xml(out: &mut String, run: &Run, size: u32, force_bold: bool) {
    out.push_str("<w:r><w:rPr>");
    out.push_str(&format!(
        r#"<w:rFonts w:ascii="{FONT}" w:hAnsi="{FONT}" w:cs="{FONT}"/>"#
    ));
    if run.bold || force_bold {
        out.push_str("<w:b/>");
    }
    if run.italic {
        out.push_str("<w:i/>");
    }
    out.push_str(&format!(
        r#"<w:color w:val="{COLOR}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#
    ));
    out.push_str(r#"</w:rPr><w:t xml:space="preserve">"#);
    let text = xml_text(&run.text);
    out.push_str(&escape(&*text));
    out.push_str("</w:t></w:r>");
}

fn paragraph_xml(out: &mut String, properties: &str, runs: &[Run], size: u32, force_bold: bool) {
    out.push_str("<w:p><w:pPr>");
    out.push_str(properties);
    out.push_str("</w:pPr>");
    for run in runs {
        run_xml(out, run, size, force_bold);
    }
    out.push_str("</w:p>");
}

fn body_paragraph_xml(out: &mut String, paragraph: &Paragraph) {
    match paragraph.style {
        ParagraphStyle::EntryTitle => paragraph_xml(
            out,
            r#"<w:spacing w:before="120" w:after="0"/>"#,
            &paragraph.runs,
            BODY_SIZE,
            false,
        ),
        ParagraphStyle::EntryMeta => paragraph_xml(
            out,
            r#"<w:spacing w:before="0" w:after="40"/>"#,
            &paragraph.runs,
            META_SIZE,
            false,
        ),
        ParagraphStyle::Body => paragraph_xml(
            out,
            r#"<w:spacing w:before="0" w:after="80"/>"#,
            &paragraph.runs,
            BODY_SIZE,
            false,
        ),
        ParagraphStyle::Bullet => {
            let mut runs = Vec::with_capacity(paragraph.runs.len() + 1);
            runs.push(Run::plain("•\u{00a0}\u{00a0}"));
            runs.extend(paragraph.runs.iter().cloned());
            paragraph_xml(
                out,
                r#"<w:spacing w:before="0" w:after="40"/><w:ind w:left="360" w:hanging="220"/>"#,
                &runs,
                BODY_SIZE,
                false,
            )
        }
    }
}

fn document_xml(document: &Document) -> String {
    let mut out = String::from(DOCUMENT_OPEN);
    let is_letter = document
        .sections
        .iter()
        .all(|s| s.kind == SectionKind::Letter);

    if !is_letter {
        paragraph_xml(
            &mut out,
            r#"<w:jc w:val="center"/><w:spacing w:after="40"/>"#,
            &[Run::plain(document.title.as_str())],
            TITLE_SIZE,
            true,
        );
        if !document.contact.is_empty() {
            paragraph_xml(
                &mut out,
                r#"<w:jc w:val="center"/><w:spacing w:after="120"/>"#,
                &[Run::plain(document.contact.join(" | "))],
                META_SIZE,
                false,
            );
        }
    }

    for section in &document.sections {
        if !section.heading.is_empty() {
            paragraph_xml(
                &mut out,
                r#"<w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="333333"/></w:pBdr><w:spacing w:before="240" w:after="80"/>"#,
                &[Run::plain(section.heading.to_uppercase())],
                HEADING_SIZE,
                true,
            );
        }
        for paragraph in &section.paragraphs {
            body_paragraph_xml(&mut out, paragraph);
        }
    }

    out.push_str(DOCUMENT_CLOSE);
    out
}

fn docx_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Docx(e.to_string())
}

pub fn render_docx(document: &Document) -> Result<Vec<u8>, RenderError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("word/document.xml", document_xml(document)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).map_err(docx_err)?;
        zip.write_all(body.as_bytes()).map_err(docx_err)?;
    }

    let cursor = zip.finish().map_err(docx_err)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::extractor::docx_text;
    use crate::render::document::ResumeData;
    use serde_json::json;

    #[test]
    fn test_resume_docx_contains_all_text() {
        let data: ResumeData = serde_json::from_value(json!({
            "name": "Jane & Co",
            "email": "jane@example.com",
            "experience": [{"title": "Engineer", "company": "Acme", "description": "- Cut <costs>"}],
            "skills": "Rust, SQL"
        }))
        .unwrap();

        let bytes = render_docx(&Document::from_resume_data(&data)).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let text = docx_text(&bytes).unwrap();
        assert!(text.contains("Jane & Co"));
        assert!(text.contains("EXPERIENCE"));
        assert!(text.contains("Cut <costs>"));
        assert!(text.contains("Rust, SQL"));
    }

    #[test]
    fn test_letter_docx_has_no_title_block() {
        let doc = Document::from_letter("Cover Letter", "Dear team,\n\nRegards");
        let text = docx_text(&render_docx(&doc).unwrap()).unwrap();
        assert_eq!(text, "Dear team,\nRegards\n");
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let doc = Document::from_letter("Cover Letter", "Dear team,\u{0b} I build\u{0c}things\u{1}.");
        let xml = document_xml(&doc);
        assert!(!xml.chars().any(|c| matches!(c, '\u{1}' | '\u{b}' | '\u{c}')));

        let text = docx_text(&render_docx(&doc).unwrap()).unwrap();
        assert_eq!(text, "Dear team, I buildthings.\n");
    }

    #[test]
    fn test_xml_text_keeps_valid_characters() {
        assert!(matches!(xml_text("Tab\there, café ✓"), Cow::Borrowed(_)));
        assert_eq!(xml_text("a\u{0}b\u{fffe}c\u{1f600}"), "abc\u{1f600}");
    }

    #[test]
    fn test_page_setup_is_a4() {
        let xml = document_xml(&Document::from_letter("x", "y"));
        assert!(xml.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
        assert!(xml.contains(r#"w:ascii="Calibri""#));
        assert!(xml.contains(r#"<w:color w:val="333333"/>"#));
    }
}
