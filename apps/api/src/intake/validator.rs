//! Resume likelihood gate: a heuristic, not a classifier.
//!
//! Accepts text with at least three recognised section headers AND at least one
//! contact signal (email, phone number, or a `YYYY-YYYY` year range). Non-English
//! headers or unconventional layouts are rejected; that false-negative rate is
//! accepted.

use once_cell::sync::Lazy;
use regex::Regex;

const MIN_HEADERS: usize = 3;

static SECTION_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        "experiences?",
        "education",
        "skills?",
        "projects?",
        "summary",
        "objective",
        "contact",
        "certifications?",
    ]
    .iter()
    .map(|h| Regex::new(&format!(r"(?im)^[ \t]*{h}[ \t]*:?[ \t]*$")).unwrap())
    .collect()
});

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[\s.-]?)?(?:\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4}").unwrap()
});

static YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\s*[-–]\s*(?:19|20)\d{2}\b").unwrap());

/// What the gate saw in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeSignals {
    pub header_count: usize,
    pub has_email: bool,
    pub has_phone: bool,
    pub has_year_range: bool,
}

impl ResumeSignals {
    pub fn has_contact(&self) -> bool {
        self.has_email || self.has_phone || self.has_year_range
    }

    pub fn is_likely_resume(&self) -> bool {
        self.header_count >= MIN_HEADERS && self.has_contact()
    }
}

pub fn resume_signals(text: &str) -> ResumeSignals {
    ResumeSignals {
        header_count: SECTION_HEADERS.iter().filter(|re| re.is_match(text)).count(),
        has_email: EMAIL.is_match(text),
        has_phone: PHONE.is_match(text),
        has_year_range: YEAR_RANGE.is_match(text),
    }
}

pub fn is_likely_resume(text: &str) -> bool {
    resume_signals(text).is_likely_resume()
}
