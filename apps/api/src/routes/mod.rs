pub mod health;


use axum::{
    extract::DefaultBodyLimit,
    middleware::map_response_with_state,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::auth::handlers as auth;
use crate::cover_letter::handlers as cover_letter;
use crate::errors::expose_error_detail;
use crate::matching::handlers as matching;
use crate::render::handlers as render;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// Room for multipart framing and the other form fields around the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;
    let expose_detail = !state.config.is_production();

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/signup", post(auth::handle_signup))
        .route("/api/auth/signin", post(auth::handle_signin))
        .route("/api/auth/google", get(auth::handle_google))
        .route(
            "/api/auth/google/callback",
            get(auth::handle_google_callback),
        )
        // Analysis & stored resumes
        .route("/api/analyze", post(analysis::handle_analyze))
        .route("/api/upload", post(resumes::handle_upload))
        .route("/api/resumes", get(resumes::handle_list_resumes))
        .route("/api/resumes/reference", post(resumes::handle_reference))
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get_resume).delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/resumes/:id/edits",
            get(resumes::handle_list_edits).post(resumes::handle_create_edit),
        )
        // Job matching
        .route(
            "/api/job-matching",
            get(matching::handle_list_job_matches).post(matching::handle_create_job_match),
        )
        .route("/api/job-matching/:id", get(matching::handle_get_job_match))
        // Cover letters
        .route(
            "/api/cover-letter/generate",
            post(cover_letter::handle_generate_cover_letter),
        )
        .route(
            "/api/cover-letter",
            get(cover_letter::handle_list_cover_letters),
        )
        .route(
            "/api/cover-letter/:id",
            get(cover_letter::handle_get_cover_letter),
        )
        .route(
            "/api/cover-letter/:id/pdf",
            get(cover_letter::handle_cover_letter_pdf),
        )
        .route(
            "/api/cover-letter/:id/docx",
            get(cover_letter::handle_cover_letter_docx),
        )
        // Document generation
        .route("/api/upload/generate", post(render::handle_generate_html))
        .route("/api/upload/generate-pdf", post(render::handle_generate_pdf))
        .route(
            "/api/upload/generate-docx",
            post(render::handle_generate_docx),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        // 5xx bodies carry upstream error text outside production only
        .layer(map_response_with_state(expose_detail, expose_error_detail))
        .with_state(state)
}
