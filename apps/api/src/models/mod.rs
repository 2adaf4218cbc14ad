pub mod analysis;
pub mod cover_letter;
pub mod job_match;
pub mod lenient;
pub mod resume;
pub mod user;
