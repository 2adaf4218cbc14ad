use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::parser::ParsedResume;
use crate::analysis::pipeline::{analyze_resume, ResumeAnalysis};
use crate::auth::MaybeAuthUser;
use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::intake::read_resume_text;
use crate::intake::upload::read_upload;
use crate::models::analysis::{AtsScore, CategoryInsights, LineImprovement, NewAnalysis};
use crate::resumes::{owned_resume, persist_upload};
use crate::state::AppState;
use crate::throttle::client_key;

#[derive(Debug, Deserialize)]
pub struct AnalyzeByIdRequest {
    pub resume_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub parsed: ParsedResume,
    pub ats_score: AtsScore,
    pub category_insights: CategoryInsights,
    pub line_improvements: Vec<LineImprovement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<Uuid>,
}

impl AnalyzeResponse {
    fn new(analysis: ResumeAnalysis, ids: Option<(Uuid, Uuid)>) -> Self {
        Self {
            success: true,
            parsed: analysis.parsed,
            ats_score: analysis.ats,
            category_insights: analysis.categories.category_insights,
            line_improvements: analysis.categories.line_improvements,
            resume_id: ids.map(|(resume, _)| resume),
            analysis_id: ids.map(|(_, analysis)| analysis),
        }
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn store_analysis(
    state: &AppState,
    resume_id: Uuid,
    analysis: &ResumeAnalysis,
) -> Result<Uuid, AppError> {
    let row = state
        .store
        .insert_analysis(NewAnalysis {
            resume_id,
            ats_score: analysis.ats.clone(),
            category_insights: analysis.categories.category_insights.clone(),
            line_improvements: analysis.categories.line_improvements.clone(),
        })
        .await?;
    Ok(row.id)
}

/// POST /api/analyze
///
/// Accepts either a multipart upload (field `resume` or `file`) or JSON
/// `{resume_id}` for a stored resume. Anonymous uploads are analysed but not
/// stored, and count against the anonymous throttle.
pub async fn handle_analyze(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    request: Request,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if !is_multipart(&headers) {
        let user = user.ok_or(AppError::Unauthorized)?;
        let ApiJson(body) = ApiJson::<AnalyzeByIdRequest>::from_request(request, &state).await?;
        let resume_id = body.resume_id.ok_or_else(|| AppError::missing_field("resume_id"))?;
        let resume = owned_resume(&state, &user, resume_id).await?;

        let analysis = analyze_resume(&state.llm, &state.prompts, &resume.raw_text).await?;
        let analysis_id = store_analysis(&state, resume.id, &analysis).await?;
        info!("Re-analysed resume {} for user {}", resume.id, user.id);
        return Ok(Json(AnalyzeResponse::new(
            analysis,
            Some((resume.id, analysis_id)),
        )));
    }

    let mut multipart = Multipart::from_request(request, &state).await?;
    let file = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    let text = read_resume_text(&state.extractor, &file).await?;

    if user.is_none() {
        let peer = peer.map(|ConnectInfo(addr)| addr);
        let key = client_key(&headers, peer, state.config.trusted_proxy);
        state.anon_throttle.check(&key).await?;
    }

    let analysis = analyze_resume(&state.llm, &state.prompts, &text).await?;

    let ids = match &user {
        Some(user) => {
            let resume = persist_upload(&state, user, &file, text).await?;
            let analysis_id = store_analysis(&state, resume.id, &analysis).await?;
            info!("Stored resume {} and analysis {analysis_id} for user {}", resume.id, user.id);
            Some((resume.id, analysis_id))
        }
        None => {
            info!("Anonymous analysis of '{}' completed (not stored)", file.filename);
            None
        }
    };

    Ok(Json(AnalyzeResponse::new(analysis, ids)))
}
