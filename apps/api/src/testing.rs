//! In-process fakes for unit and router tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::archive::NoopArchive;
use crate::auth::{AuthError, AuthSession, AuthUser, IdentityProvider};
use crate::config::{AiLimits, Config};
use crate::intake::extractor::{ExtractError, TextExtractor};
use crate::intake::ocr::OcrEngine;
use crate::llm_client::prompts::PromptSet;
use crate::llm_client::{LlmBackend, LlmClient, LlmError};
use crate::render::pdf::PdfRenderer;
use crate::render::templates::TemplateFiller;
use crate::render::RenderError;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::throttle::{AnonThrottle, MemoryThrottle};

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

enum Behavior {
    Sequence(Mutex<VecDeque<Result<String, LlmError>>>),
    Respond(Responder),
    Track {
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    },
}

/// Scripted `LlmBackend` that counts every call it receives.
pub struct FakeBackend {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeBackend {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Replays `responses` in order; further calls fail with `EmptyContent`.
    pub fn sequence(responses: Vec<Result<String, LlmError>>) -> Self {
        Self::new(Behavior::Sequence(Mutex::new(responses.into())))
    }

    pub fn always(respond: impl Fn() -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self::new(Behavior::Respond(Box::new(move |_| respond())))
    }

    pub fn by_prompt(
        respond: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(Behavior::Respond(Box::new(respond)))
    }

    /// Records how many calls overlap; each call takes 20ms.
    pub fn tracking(in_flight: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Self {
        Self::new(Behavior::Track { in_flight, peak })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for FakeBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Sequence(queue) => {
                let next = queue.lock().unwrap().pop_front();
                next.unwrap_or(Err(LlmError::EmptyContent))
            }
            Behavior::Respond(respond) => respond(prompt),
            Behavior::Track { in_flight, peak } => {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(format!("ok {prompt}"))
            }
        }
    }
}

pub const PARSED_JSON: &str = r#"{"name": "John Doe", "email": "john@x.com", "skills": ["Rust", "SQL"],
  "experience": [{"title": "Engineer", "company": "Acme", "description": "Built things"}]}"#;
pub const ATS_TEXT: &str = "82\nClear headings and consistent dates.";
pub const INSIGHTS_JSON: &str = r#"{"category_insights": {"Experience": ["Quantify impact"]},
  "line_improvements": [{"original": "Built things", "issue": "Vague", "suggestion": "Built [N] services"}]}"#;
pub const MATCH_JSON: &str =
    r#"{"match_score": 71, "strengths": ["Rust"], "gaps": ["Go"], "suggestions": ["Mention Go"]}"#;
pub const LETTER_TEXT: &str = "Dear hiring team,\n\nI would love to join.";

/// Answers each embedded prompt with a plausible response, keyed on the prompt's opening line.
pub fn scripted_backend() -> FakeBackend {
    FakeBackend::by_prompt(|prompt| {
        let reply = if prompt.starts_with("You are a precise resume data extractor") {
            PARSED_JSON
        } else if prompt.starts_with("You are an Applicant Tracking System") {
            ATS_TEXT
        } else if prompt.starts_with("You are an experienced technical recruiter") {
            INSIGHTS_JSON
        } else if prompt.starts_with("You are a hiring manager") {
            MATCH_JSON
        } else if prompt.starts_with("You are a professional career writer") {
            LETTER_TEXT
        } else {
            return Err(LlmError::Api {
                status: 400,
                message: "unexpected prompt".into(),
            });
        };
        Ok(reply.to_string())
    })
}

pub fn fake_llm_client(backend: Arc<dyn LlmBackend>) -> LlmClient {
    LlmClient::new(
        backend,
        AiLimits {
            max_concurrency: 2,
            max_attempts: 3,
            backoff_unit: Duration::from_millis(10),
        },
    )
}

/// Accepts a fixed set of bearer tokens.
#[derive(Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, AuthUser>,
}

impl StaticIdentity {
    pub fn with_user(mut self, token: &str, user: AuthUser) -> Self {
        self.tokens.insert(token.to_string(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn verify(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.tokens.get(token).cloned())
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthSession, AuthError> {
        Ok(AuthSession {
            access_token: None,
            refresh_token: None,
            expires_in: None,
            token_type: None,
            user: AuthUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let (token, user) = self
            .tokens
            .iter()
            .find(|(_, user)| user.email == email)
            .filter(|_| password == "correct-password")
            .ok_or_else(|| AuthError::Rejected("Invalid login credentials".into()))?;
        Ok(AuthSession {
            access_token: Some(token.clone()),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: Some("bearer".into()),
            user: user.clone(),
        })
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        format!("https://idp.test/authorize?provider={provider}&redirect_to={redirect_to}")
    }
}

pub struct FakePdf;

pub const FAKE_PDF: &[u8] = b"%PDF-1.7 fake";

#[async_trait]
impl PdfRenderer for FakePdf {
    async fn render(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
        Ok(FAKE_PDF.to_vec())
    }
}

pub struct NoOcr;

#[async_trait]
impl OcrEngine for NoOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<String, ExtractError> {
        Err(ExtractError::Ocr("OCR disabled in tests".into()))
    }
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("DATABASE_URL", "postgres://localhost/test"),
        ("GEMINI_API_KEY", "test"),
        ("SUPABASE_URL", "https://idp.test"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("MAX_UPLOAD_BYTES", "4096"),
        ("ANON_ANALYZE_LIMIT", "2"),
        ("FRONTEND_URL", "https://app.test"),
        ("PUBLIC_URL", "https://api.test"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn test_state(
    store: Arc<MemoryStore>,
    backend: Arc<FakeBackend>,
    identity: StaticIdentity,
) -> AppState {
    let config = test_config();
    AppState {
        store,
        llm: fake_llm_client(backend),
        prompts: Arc::new(PromptSet::embedded().unwrap()),
        identity: Arc::new(identity),
        extractor: TextExtractor::new(Arc::new(NoOcr)),
        templates: Arc::new(TemplateFiller::embedded().unwrap()),
        pdf: Arc::new(FakePdf),
        archive: Arc::new(NoopArchive),
        anon_throttle: AnonThrottle::new(
            Arc::new(MemoryThrottle::default()),
            config.anon_analyze_limit,
            config.anon_analyze_window,
        ),
        config,
    }
}
