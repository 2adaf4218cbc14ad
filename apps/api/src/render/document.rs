//! Semantic document model shared by the HTML templates and the DOCX writer.

use serde::{Deserialize, Serialize};

use crate::models::lenient;

/// Resume content as sent by the editor. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeData {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    EntryTitle,
    EntryMeta,
    Body,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            italic: true,
            ..Self::plain(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub runs: Vec<Run>,
}

impl Paragraph {
    fn new(style: ParagraphStyle, runs: Vec<Run>) -> Self {
        Self { style, runs }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: String,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub contact: Vec<String>,
    pub sections: Vec<Section>,
}

const BULLET_MARKERS: &[char] = &['-', '*', '•'];

/// One paragraph per non-empty line; marker-prefixed lines become bullets.
fn text_paragraphs(text: &str) -> Vec<Paragraph> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix(BULLET_MARKERS) {
            Some(rest) if !rest.trim().is_empty() => {
                Paragraph::new(ParagraphStyle::Bullet, vec![Run::plain(rest.trim())])
            }
            _ => Paragraph::new(ParagraphStyle::Body, vec![Run::plain(line)]),
        })
        .collect()
}

/// "Title, Company" with the title in bold. `None` when both are missing.
fn entry_title(primary: Option<&str>, secondary: Option<&str>) -> Option<Paragraph> {
    let runs = match (primary, secondary) {
        (Some(p), Some(s)) => vec![Run::bold(p), Run::plain(format!(", {s}"))],
        (Some(p), None) => vec![Run::bold(p)],
        (None, Some(s)) => vec![Run::bold(s)],
        (None, None) => return None,
    };
    Some(Paragraph::new(ParagraphStyle::EntryTitle, runs))
}

fn date_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    match (start, end) {
        (Some(s), Some(e)) => Some(format!("{s} - {e}")),
        (Some(s), None) => Some(format!("{s} - Present")),
        (None, Some(e)) => Some(e.to_string()),
        (None, None) => None,
    }
}

/// Location and dates as one italic line.
fn entry_meta(parts: &[Option<String>]) -> Option<Paragraph> {
    let parts: Vec<&str> = parts.iter().flatten().map(String::as_str).collect();
    (!parts.is_empty())
        .then(|| Paragraph::new(ParagraphStyle::EntryMeta, vec![Run::italic(parts.join(" | "))]))
}

fn push_section(sections: &mut Vec<Section>, kind: SectionKind, heading: &str, paragraphs: Vec<Paragraph>) {
    if !paragraphs.is_empty() {
        sections.push(Section {
            kind,
            heading: heading.to_string(),
            paragraphs,
        });
    }
}

impl Document {
    pub fn from_resume_data(data: &ResumeData) -> Self {
        let contact = [
            &data.email,
            &data.phone,
            &data.location,
            &data.linkedin,
            &data.website,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

        let mut sections = Vec::new();

        push_section(
            &mut sections,
            SectionKind::Summary,
            "Summary",
            data.summary.as_deref().map(text_paragraphs).unwrap_or_default(),
        );

        let experience = data
            .experience
            .iter()
            .flat_map(|e| {
                let mut paragraphs: Vec<Paragraph> =
                    entry_title(e.title.as_deref(), e.company.as_deref())
                        .into_iter()
                        .collect();
                paragraphs.extend(entry_meta(&[
                    e.location.clone(),
                    date_range(e.start_date.as_deref(), e.end_date.as_deref()),
                ]));
                paragraphs.extend(e.description.as_deref().map(text_paragraphs).unwrap_or_default());
                paragraphs
            })
            .collect();
        push_section(&mut sections, SectionKind::Experience, "Experience", experience);

        let education = data
            .education
            .iter()
            .flat_map(|e| {
                let mut paragraphs: Vec<Paragraph> =
                    entry_title(e.degree.as_deref(), e.institution.as_deref())
                        .into_iter()
                        .collect();
                paragraphs.extend(entry_meta(&[
                    e.location.clone(),
                    date_range(e.start_date.as_deref(), e.end_date.as_deref()),
                ]));
                paragraphs.extend(e.details.as_deref().map(text_paragraphs).unwrap_or_default());
                paragraphs
            })
            .collect();
        push_section(&mut sections, SectionKind::Education, "Education", education);

        let skills = if data.skills.is_empty() {
            Vec::new()
        } else {
            vec![Paragraph::new(
                ParagraphStyle::Body,
                vec![Run::plain(data.skills.join(", "))],
            )]
        };
        push_section(&mut sections, SectionKind::Skills, "Skills", skills);

        let projects = data
            .projects
            .iter()
            .flat_map(|p| {
                let mut paragraphs: Vec<Paragraph> =
                    entry_title(p.name.as_deref(), None).into_iter().collect();
                paragraphs.extend(entry_meta(&[p.link.clone()]));
                paragraphs.extend(p.description.as_deref().map(text_paragraphs).unwrap_or_default());
                paragraphs
            })
            .collect();
        push_section(&mut sections, SectionKind::Projects, "Projects", projects);

        let certifications = data
            .certifications
            .iter()
            .map(|c| Paragraph::new(ParagraphStyle::Bullet, vec![Run::plain(c.as_str())]))
            .collect();
        push_section(
            &mut sections,
            SectionKind::Certifications,
            "Certifications",
            certifications,
        );

        Document {
            title: data.name.clone().unwrap_or_else(|| "Resume".to_string()),
            contact,
            sections,
        }
    }

    /// A cover letter: one body paragraph per blank-line separated block.
    pub fn from_letter(title: &str, text: &str) -> Self {
        let paragraphs = text
            .split("\n\n")
            .map(|block| {
                block
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|block| !block.is_empty())
            .map(|block| Paragraph::new(ParagraphStyle::Body, vec![Run::plain(block)]))
            .collect();

        Document {
            title: title.to_string(),
            contact: Vec::new(),
            sections: vec![Section {
                kind: SectionKind::Letter,
                heading: String::new(),
                paragraphs,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> ResumeData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_data_yields_no_sections() {
        let doc = Document::from_resume_data(&ResumeData::default());
        assert_eq!(doc.title, "Resume");
        assert!(doc.contact.is_empty());
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_description_lines_become_bullets() {
        let doc = Document::from_resume_data(&data(json!({
            "name": "Jane Roe",
            "experience": [{
                "title": "Engineer",
                "company": "Acme",
                "start_date": "2020",
                "description": "Owned billing.\n- Cut costs 20%\n  • Led 3 engineers\n\n"
            }]
        })));

        let experience = &doc.sections[0];
        assert_eq!(experience.kind, SectionKind::Experience);
        let styles: Vec<_> = experience.paragraphs.iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            [
                ParagraphStyle::EntryTitle,
                ParagraphStyle::EntryMeta,
                ParagraphStyle::Body,
                ParagraphStyle::Bullet,
                ParagraphStyle::Bullet,
            ]
        );
        assert_eq!(experience.paragraphs[0].text(), "Engineer, Acme");
        assert_eq!(experience.paragraphs[1].text(), "2020 - Present");
        assert_eq!(experience.paragraphs[4].text(), "Led 3 engineers");
    }

    #[test]
    fn test_blank_fields_are_dropped() {
        let doc = Document::from_resume_data(&data(json!({
            "email": "  ",
            "phone": "555-0100",
            "skills": "Rust, , SQL",
            "projects": [{"name": null, "description": null, "link": null}],
            "certifications": null
        })));
        assert_eq!(doc.contact, ["555-0100"]);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].paragraphs[0].text(), "Rust, SQL");
    }

    #[test]
    fn test_letter_blocks_become_paragraphs() {
        let doc = Document::from_letter("Cover Letter", "Dear team,\n\nI build\nthings.\n\n\nRegards");
        let texts: Vec<_> = doc.sections[0].paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, ["Dear team,", "I build things.", "Regards"]);
    }
}
