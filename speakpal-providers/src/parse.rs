use anyhow::{Context, anyhow};
use serde::Deserialize;
use speakpal_core::stats::SessionStats;
use speakpal_core::types::SessionId;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: SessionId,
    pub message: String,
    #[serde(default)]
    pub audio_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TurnResponse {
    #[serde(default)]
    pub user_text: Option<String>,
    #[serde(default)]
    pub ai_response: Option<String>,
    #[serde(default)]
    pub audio_hex: Option<String>,
    #[serde(default)]
    pub stats: Option<SessionStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndSessionResponse {
    pub summary: String,
}

pub fn parse_start_session(body: &[u8]) -> anyhow::Result<StartSessionResponse> {
    serde_json::from_slice(body).context("decode session start JSON")
}

/// Voice replies may legitimately carry only a transcription.
pub fn parse_voice_turn(body: &[u8]) -> anyhow::Result<TurnResponse> {
    serde_json::from_slice(body).context("decode voice turn JSON")
}

pub fn parse_text_turn(body: &[u8]) -> anyhow::Result<TurnResponse> {
    let resp: TurnResponse = serde_json::from_slice(body).context("decode text turn JSON")?;
    if resp.ai_response.is_none() {
        return Err(anyhow!("no ai_response in text turn response"));
    }
    Ok(resp)
}

pub fn parse_end_session(body: &[u8]) -> anyhow::Result<EndSessionResponse> {
    serde_json::from_slice(body).context("decode session end JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_with_optional_audio() {
        let body = br#"{"session_id":"abc","message":"Hi there!"}"#;
        let resp = parse_start_session(body).unwrap();
        assert_eq!(resp.session_id.as_str(), "abc");
        assert_eq!(resp.message, "Hi there!");
        assert_eq!(resp.audio_hex, None);
    }

    #[test]
    fn start_without_session_id_errors() {
        assert!(parse_start_session(br#"{"message":"Hi"}"#).is_err());
    }

    #[test]
    fn parses_voice_turn_with_stats() {
        let body = br#"{
            "user_text": "I goed home",
            "ai_response": "Nice!FEEDBACK_STARTwent, not goed.FEEDBACK_END",
            "audio_hex": "52494646",
            "stats": {"exchanges": 3, "total_words": 42, "avg_score": 7.5}
        }"#;
        let resp = parse_voice_turn(body).unwrap();
        assert_eq!(resp.user_text.as_deref(), Some("I goed home"));
        let stats = resp.stats.unwrap();
        assert_eq!(stats.exchanges, Some(3));
        assert_eq!(stats.avg_score, Some(7.5));
    }

    #[test]
    fn text_turn_requires_reply() {
        assert!(parse_text_turn(br#"{"stats":{"exchanges":1}}"#).is_err());
        assert!(parse_text_turn(br#"{"ai_response":"ok"}"#).is_ok());
    }

    #[test]
    fn malformed_body_errors() {
        assert!(parse_voice_turn(b"<html>502</html>").is_err());
        assert!(parse_end_session(br#"{"nope":1}"#).is_err());
    }
}
