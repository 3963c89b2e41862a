use serde::Deserialize;
use speakpal_core::types::ParticipantId;

/// Environment variable holding the host's init data when running outside a mini-app host.
pub const INIT_DATA_ENV: &str = "SPEAKPAL_INIT_DATA";

#[derive(Debug, thiserror::Error)]
pub enum InitDataError {
    #[error("init data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("user id must be a number or a string, got {0}")]
    UnsupportedId(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub id: String,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// Launch parameters handed over by the embedding messaging host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitData {
    pub user: Option<HostUser>,
    pub auth_date: Option<String>,
}

#[derive(Deserialize)]
struct RawUser {
    id: serde_json::Value,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct RawInit {
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    auth_date: Option<serde_json::Value>,
}

impl InitData {
    /// Parse either a JSON object (`{"user":{"id":42}}`) or the URL-encoded
    /// query form mini-app hosts pass (`user=%7B%22id%22%3A42%7D&auth_date=...`).
    pub fn parse(raw: &str) -> Result<Self, InitDataError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }

        if raw.starts_with('{') {
            let init: RawInit = serde_json::from_str(raw)?;
            return Ok(Self {
                user: init.user.map(HostUser::try_from).transpose()?,
                auth_date: init.auth_date.map(|v| scalar_to_string(&v).unwrap_or_default()),
            });
        }

        let mut out = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "user" => {
                    let user: RawUser = serde_json::from_str(&value)?;
                    out.user = Some(HostUser::try_from(user)?);
                }
                "auth_date" => out.auth_date = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn participant(&self) -> Option<ParticipantId> {
        self.user
            .as_ref()
            .map(|u| u.id.trim())
            .filter(|id| !id.is_empty())
            .map(ParticipantId::new)
    }
}

impl TryFrom<RawUser> for HostUser {
    type Error = InitDataError;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        let id = scalar_to_string(&raw.id).ok_or(InitDataError::UnsupportedId(raw.id))?;
        Ok(Self {
            id,
            first_name: raw.first_name,
            username: raw.username,
        })
    }
}

fn scalar_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Participant id from the host, or the shared placeholder when there is none.
pub fn participant_or_placeholder(init: Option<&InitData>) -> ParticipantId {
    init.and_then(InitData::participant)
        .unwrap_or_else(ParticipantId::placeholder)
}

/// The messaging app that embeds the practice client.
pub trait HostBridge: Send + Sync {
    /// Tell the host the client has rendered.
    fn ready(&self);

    /// Ask the host for the full viewport.
    fn expand(&self);

    /// Raw init data, if the host provided any.
    fn init_data(&self) -> Option<String>;

    /// Resolve the participant. Unparseable init data falls back to the placeholder.
    fn participant(&self) -> ParticipantId {
        let parsed = self.init_data().and_then(|raw| match InitData::parse(&raw) {
            Ok(init) => Some(init),
            Err(e) => {
                log::warn!("ignoring host init data: {e}");
                None
            }
        });
        participant_or_placeholder(parsed.as_ref())
    }
}

/// Startup handshake: signal readiness, take the full viewport, then resolve who is practising.
pub fn start_host(host: &dyn HostBridge) -> ParticipantId {
    host.ready();
    host.expand();
    let participant = host.participant();
    log::info!("participant: {}", participant.as_str());
    participant
}

/// Stand-in host for terminal runs: init data comes from `SPEAKPAL_INIT_DATA`.
#[derive(Debug, Clone, Default)]
pub struct EnvHost {
    raw: Option<String>,
}

impl EnvHost {
    pub fn new(raw: Option<String>) -> Self {
        Self { raw }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(INIT_DATA_ENV).ok())
    }
}

impl HostBridge for EnvHost {
    fn ready(&self) {
        log::info!("host: ready");
    }

    fn expand(&self) {
        log::info!("host: expand");
    }

    fn init_data(&self) -> Option<String> {
        self.raw.clone().filter(|s| !s.trim().is_empty())
    }
}
