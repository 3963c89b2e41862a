use serde::{Deserialize, Serialize};
use speakpal_core::stats::StatsDisplay;
use speakpal_core::types::{Gender, Level, ParticipantId, SessionId};
use speakpal_providers::backend::AudioClip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    // Gender and level screens.
    #[default]
    Setup,
    InCall,
    Ended,
}

/// The single record behind a `SessionClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub participant: ParticipantId,
    pub session_id: Option<SessionId>,
    pub level: Option<Level>,
    pub gender: Option<Gender>,
    pub stage: SessionStage,
    pub elapsed_secs: u64,
    pub stats: StatsDisplay,

    // Bumped by reset; responses from an older epoch are dropped.
    pub epoch: u64,
}

impl SessionState {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            session_id: None,
            level: None,
            gender: None,
            stage: SessionStage::Setup,
            elapsed_secs: 0,
            stats: StatsDisplay::default(),
            epoch: 0,
        }
    }

    pub fn clear(&mut self) {
        self.session_id = None;
        self.level = None;
        self.gender = None;
        self.stage = SessionStage::Setup;
        self.elapsed_secs = 0;
        self.stats = StatsDisplay::default();
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Voice,
    Text,
}

impl TurnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnKind::Voice => "voice",
            TurnKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnRequest {
    Voice(AudioClip),
    Text(String),
}

impl TurnRequest {
    pub fn kind(&self) -> TurnKind {
        match self {
            TurnRequest::Voice(_) => TurnKind::Voice,
            TurnRequest::Text(_) => TurnKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(SessionId),
    // Backend unreachable: greeting shown, no session id.
    StartedLocally,
    Ignored,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed,
    Ignored,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    Summarized(String),
    // Backend failed or there was no remote session.
    FallbackSummary,
    Ignored,
    Stale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_fields_and_bumps_epoch() {
        let mut st = SessionState::new(ParticipantId::placeholder());
        st.session_id = Some(SessionId::new("abc"));
        st.level = Some(Level::Advanced);
        st.gender = Some(Gender::Male);
        st.stage = SessionStage::InCall;
        st.elapsed_secs = 93;
        st.stats.exchanges = "5".into();

        st.clear();

        let mut fresh = SessionState::new(ParticipantId::placeholder());
        fresh.epoch = 1;
        assert_eq!(st, fresh);
    }

    #[test]
    fn turn_kind_follows_payload() {
        assert_eq!(TurnRequest::Text("hi".into()).kind(), TurnKind::Text);
        assert_eq!(
            TurnRequest::Voice(AudioClip::wav(vec![0])).kind().as_str(),
            "voice"
        );
    }
}
