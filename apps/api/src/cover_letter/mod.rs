pub mod generator;
pub mod handlers;
