pub mod ats;
pub mod handlers;
pub mod insights;
pub mod parser;
pub mod pipeline;
