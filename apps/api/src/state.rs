use std::sync::Arc;

use crate::archive::FileArchive;
use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::intake::extractor::TextExtractor;
use crate::llm_client::prompts::PromptSet;
use crate::llm_client::LlmClient;
use crate::render::pdf::PdfRenderer;
use crate::render::templates::TemplateFiller;
use crate::store::Store;
use crate::throttle::AnonThrottle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// The only path to the AI provider. Holds the process-wide concurrency cap.
    pub llm: LlmClient,
    pub prompts: Arc<PromptSet>,
    pub identity: Arc<dyn IdentityProvider>,
    pub extractor: TextExtractor,
    pub templates: Arc<TemplateFiller>,
    pub pdf: Arc<dyn PdfRenderer>,
    /// `NoopArchive` unless S3 is configured.
    pub archive: Arc<dyn FileArchive>,
    pub anon_throttle: AnonThrottle,
    pub config: Config,
}
