use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use speakpal_core::stats::StatsDisplay;
use speakpal_core::types::{Gender, Level, ParticipantId, Screen, SessionId};
use std::time::Duration;

pub use speakpal_providers::backend::AudioClip;
pub use speakpal_providers::parse::{EndSessionResponse, StartSessionResponse, TurnResponse};

/// The remote practice service. One call per user action; no retries.
#[async_trait]
pub trait PracticeBackend: Send + Sync {
    async fn start_session(
        &self,
        participant: &ParticipantId,
        level: Level,
        gender: Gender,
    ) -> anyhow::Result<StartSessionResponse>;

    async fn voice_turn(
        &self,
        session_id: &SessionId,
        audio: &AudioClip,
    ) -> anyhow::Result<TurnResponse>;

    async fn text_turn(
        &self,
        session_id: &SessionId,
        message: &str,
    ) -> anyhow::Result<TurnResponse>;

    async fn end_session(&self, session_id: &SessionId) -> anyhow::Result<EndSessionResponse>;
}

pub type PlaybackFinished = Box<dyn FnOnce() + Send + 'static>;

pub trait AudioPlayer: Send + Sync {
    /// Play a complete audio container, stopping and releasing whatever is playing.
    ///
    /// `on_finished` runs only when this playback reaches its natural end.
    fn play(&self, audio: Vec<u8>, on_finished: PlaybackFinished) -> anyhow::Result<()>;

    fn stop(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Active,
    Speaking,
}

impl CallStatus {
    pub fn label(self) -> &'static str {
        match self {
            CallStatus::Active => "● Active",
            CallStatus::Speaking => "● Speaking...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryContent {
    Loading,
    Text(String),
}

/// Everything the learner sees. Calls are fire-and-forget and must be fast.
pub trait SessionView: Send + Sync {
    fn show_screen(&self, screen: Screen);
    fn set_persona(&self, gender: Gender);
    fn set_level_badge(&self, level: Level);

    fn add_ai_message(&self, text: &str);
    fn add_user_message(&self, text: &str);
    fn add_feedback(&self, text: &str, display_for: Duration);
    fn clear_transcript(&self);

    fn show_thinking(&self);
    fn hide_thinking(&self);
    fn set_inputs_enabled(&self, enabled: bool);

    fn set_stats(&self, stats: &StatsDisplay);
    fn set_elapsed(&self, text: &str);
    fn set_call_status(&self, status: CallStatus);

    fn set_recording(&self, recording: bool);
    fn set_voice_hint(&self, hint: &str);
    fn alert(&self, message: &str);

    fn set_final_stats(&self, stats: &StatsDisplay);
    fn show_summary(&self, content: &SummaryContent);
}
