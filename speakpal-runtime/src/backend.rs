use async_trait::async_trait;
use speakpal_core::types::{Gender, Level, ParticipantId, SessionId};
use speakpal_engine::traits::{
    AudioClip, EndSessionResponse, PracticeBackend, StartSessionResponse, TurnResponse,
};
use speakpal_providers::backend::{
    build_end_request, build_start_request, build_text_request, build_voice_request,
};
use speakpal_providers::parse::{
    parse_end_session, parse_start_session, parse_text_turn, parse_voice_turn,
};
use speakpal_providers::request::HttpRequest;
use speakpal_providers::runtime::{HttpExecutor, HttpResponse, HttpTimeouts};

/// `PracticeBackend` over HTTP. Non-2xx responses and unparseable bodies are errors.
#[derive(Debug, Clone)]
pub struct HttpPracticeBackend {
    base_url: String,
    exec: HttpExecutor,
}

impl HttpPracticeBackend {
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            exec: HttpExecutor::new(timeouts)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        log::debug!("POST {}", req.url);
        let resp = self.exec.execute(req).await?;
        log::debug!("{} -> {}", req.url, resp.status);
        resp.error_for_status()
    }
}

#[async_trait]
impl PracticeBackend for HttpPracticeBackend {
    async fn start_session(
        &self,
        participant: &ParticipantId,
        level: Level,
        gender: Gender,
    ) -> anyhow::Result<StartSessionResponse> {
        let req = build_start_request(&self.base_url, participant, level, gender)?;
        let resp = self.send(&req).await?;
        parse_start_session(&resp.body)
    }

    async fn voice_turn(
        &self,
        session_id: &SessionId,
        audio: &AudioClip,
    ) -> anyhow::Result<TurnResponse> {
        let req = build_voice_request(&self.base_url, session_id, audio);
        let resp = self.send(&req).await?;
        parse_voice_turn(&resp.body)
    }

    async fn text_turn(
        &self,
        session_id: &SessionId,
        message: &str,
    ) -> anyhow::Result<TurnResponse> {
        let req = build_text_request(&self.base_url, session_id, message)?;
        let resp = self.send(&req).await?;
        parse_text_turn(&resp.body)
    }

    async fn end_session(&self, session_id: &SessionId) -> anyhow::Result<EndSessionResponse> {
        let req = build_end_request(&self.base_url, session_id)?;
        let resp = self.send(&req).await?;
        parse_end_session(&resp.body)
    }
}
