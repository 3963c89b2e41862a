use serde::{Deserialize, Serialize};

/// Backend base URL baked in at build time (`SPEAKPAL_API_BASE`), overridable by config.
pub const DEFAULT_API_BASE: &str = match option_env!("SPEAKPAL_API_BASE") {
    Some(v) => v,
    None => "https://speaking-bot-frontend.vercel.app/",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    // How long a feedback notice stays visible.
    #[serde(default = "default_feedback_display_ms")]
    pub feedback_display_ms: u64,

    #[serde(default = "default_timer_tick_ms")]
    pub timer_tick_ms: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub microphone_device: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            feedback_display_ms: default_feedback_display_ms(),
            timer_tick_ms: default_timer_tick_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            microphone_device: None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_feedback_display_ms() -> u64 {
    8_000
}

fn default_timer_tick_ms() -> u64 {
    1_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}
