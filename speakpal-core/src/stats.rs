use serde::{Deserialize, Serialize};

/// Server-owned running aggregates. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub exchanges: Option<u64>,
    #[serde(default)]
    pub total_words: Option<u64>,
    // `null` and a missing field both mean "no score yet".
    #[serde(default)]
    pub avg_score: Option<f64>,
}

/// The stats texts currently shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDisplay {
    pub exchanges: String,
    pub words: String,
    pub score: String,
    pub duration: String,
}

impl Default for StatsDisplay {
    fn default() -> Self {
        Self {
            exchanges: "0".into(),
            words: "0".into(),
            score: "-".into(),
            duration: format_elapsed(0),
        }
    }
}

impl StatsDisplay {
    /// Mirror the latest server stats; absent values keep their current text.
    pub fn mirror(&mut self, stats: &SessionStats) {
        if let Some(n) = stats.exchanges {
            self.exchanges = n.to_string();
        }
        if let Some(n) = stats.total_words {
            self.words = n.to_string();
        }
        if let Some(score) = stats.avg_score {
            self.score = format_score(score);
        }
    }
}

pub fn format_score(score: f64) -> String {
    format!("{score}/10")
}

/// `m:ss` display for the call timer.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
