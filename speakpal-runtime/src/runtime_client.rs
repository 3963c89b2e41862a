use std::sync::Arc;
use std::time::Duration;

use speakpal_core::config::ClientConfig;
use speakpal_core::types::ParticipantId;
use speakpal_engine::client::{ClientSettings, SessionClient};
use speakpal_engine::traits::{AudioPlayer, SessionView};
use speakpal_providers::runtime::HttpTimeouts;

use crate::backend::HttpPracticeBackend;
use crate::player::default_player;

pub fn client_settings(cfg: &ClientConfig) -> ClientSettings {
    ClientSettings {
        feedback_display: Duration::from_millis(cfg.feedback_display_ms),
        timer_tick: Duration::from_millis(cfg.timer_tick_ms),
    }
}

pub fn http_timeouts(cfg: &ClientConfig) -> HttpTimeouts {
    HttpTimeouts {
        connect: Duration::from_secs(cfg.connect_timeout_secs),
        request: Duration::from_secs(cfg.request_timeout_secs),
    }
}

/// Build a runnable client from config and a view, playing audio on the default output.
pub fn build_client_from_config(
    cfg: &ClientConfig,
    view: Arc<dyn SessionView>,
    participant: ParticipantId,
) -> anyhow::Result<SessionClient> {
    build_client_with_player(cfg, view, default_player(), participant)
}

pub fn build_client_with_player(
    cfg: &ClientConfig,
    view: Arc<dyn SessionView>,
    player: Arc<dyn AudioPlayer>,
    participant: ParticipantId,
) -> anyhow::Result<SessionClient> {
    let backend = HttpPracticeBackend::new(cfg.api_base_url.clone(), http_timeouts(cfg))?;
    log::info!(
        "client for {} as {}",
        backend.base_url(),
        participant.as_str()
    );
    Ok(SessionClient::new(
        Arc::new(backend),
        player,
        view,
        participant,
        client_settings(cfg),
    ))
}
