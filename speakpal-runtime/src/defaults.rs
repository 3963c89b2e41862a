use speakpal_core::config::ClientConfig;
use std::path::PathBuf;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SPEAKPAL_CONFIG";

/// Overrides the backend base URL at run time.
pub const API_BASE_ENV: &str = "SPEAKPAL_API_BASE";

const APP_DIR: &str = "speakpal";
const CONFIG_FILE: &str = "config.json";

/// Where the client config lives when no path is given.
pub fn default_config_path() -> PathBuf {
    if let Some(p) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }

    let base = if cfg!(windows) {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    };

    base.unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Apply a run-time base URL override, if one is set and non-blank.
pub fn apply_api_base_override(cfg: &mut ClientConfig, value: Option<&str>) {
    if let Some(url) = value.map(str::trim).filter(|v| !v.is_empty()) {
        log::info!("api base overridden: {url}");
        cfg.api_base_url = url.to_string();
    }
}

pub fn apply_env_overrides(cfg: &mut ClientConfig) {
    let value = std::env::var(API_BASE_ENV).ok();
    apply_api_base_override(cfg, value.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_keeps_config() {
        let mut cfg = ClientConfig::default();
        let before = cfg.api_base_url.clone();
        apply_api_base_override(&mut cfg, Some("   "));
        apply_api_base_override(&mut cfg, None);
        assert_eq!(cfg.api_base_url, before);

        apply_api_base_override(&mut cfg, Some(" http://localhost:9000 "));
        assert_eq!(cfg.api_base_url, "http://localhost:9000");
    }

    #[test]
    fn default_path_ends_with_app_file() {
        let p = default_config_path();
        if std::env::var_os(CONFIG_PATH_ENV).is_none() {
            assert!(p.ends_with("speakpal/config.json"));
        }
    }
}
