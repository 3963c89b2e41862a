use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use speakpal_core::stats::StatsDisplay;
use speakpal_core::types::{Gender, Level, Screen};
use speakpal_engine::traits::{CallStatus, SessionView, SummaryContent};

/// Line-oriented view for a terminal. Write errors are logged and otherwise ignored.
pub struct TerminalView<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
    elapsed: Mutex<String>,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            elapsed: Mutex::new(String::from("0:00")),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last call duration pushed by the timer.
    pub fn elapsed(&self) -> String {
        self.elapsed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            log::warn!("terminal write failed: {e}");
        }
    }
}

fn stats_line(stats: &StatsDisplay) -> String {
    format!(
        "exchanges {} | words {} | score {} | time {}",
        stats.exchanges, stats.words, stats.score, stats.duration
    )
}

impl<W: Write + Send> SessionView for TerminalView<W> {
    fn show_screen(&self, screen: Screen) {
        match screen {
            Screen::Gender => self.line("Choose your partner: male | female"),
            Screen::Level => self.line("Choose a level: beginner | intermediate | advanced"),
            Screen::Call => self.line(
                "In call. Type to chat, /rec to talk, /end to finish, /restart, /quit.",
            ),
            Screen::Summary => self.line("--- Session summary ---"),
        }
    }

    fn set_persona(&self, gender: Gender) {
        self.line(&format!("Partner: {}", gender.avatar()));
    }

    fn set_level_badge(&self, level: Level) {
        self.line(&format!("Level: {} [{}]", level.badge_label(), level.badge_color()));
    }

    fn add_ai_message(&self, text: &str) {
        self.line(&format!("AI: {text}"));
    }

    fn add_user_message(&self, text: &str) {
        self.line(&format!("You: {text}"));
    }

    // A terminal line cannot be withdrawn, so the display duration is not used.
    fn add_feedback(&self, text: &str, _display_for: Duration) {
        self.line(&format!("Feedback: {text}"));
    }

    fn clear_transcript(&self) {
        self.line("");
    }

    fn show_thinking(&self) {
        self.line("...");
    }

    fn hide_thinking(&self) {}

    fn set_inputs_enabled(&self, _enabled: bool) {}

    fn set_stats(&self, stats: &StatsDisplay) {
        self.line(&format!("[{}]", stats_line(stats)));
    }

    fn set_elapsed(&self, text: &str) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
    }

    fn set_call_status(&self, status: CallStatus) {
        self.line(status.label());
    }

    fn set_recording(&self, _recording: bool) {}

    fn set_voice_hint(&self, hint: &str) {
        self.line(&format!("({hint})"));
    }

    fn alert(&self, message: &str) {
        self.line(&format!("!! {message}"));
    }

    fn set_final_stats(&self, stats: &StatsDisplay) {
        self.line(&stats_line(stats));
    }

    fn show_summary(&self, content: &SummaryContent) {
        match content {
            SummaryContent::Loading => self.line("Loading summary..."),
            SummaryContent::Text(text) => self.line(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_transcript_lines() {
        let view = TerminalView::new(Vec::new());
        view.set_level_badge(Level::Intermediate);
        view.add_ai_message("Hi there");
        view.add_feedback("Use articles.", Duration::from_secs(8));
        view.set_call_status(CallStatus::Speaking);
        view.set_elapsed("0:07");

        assert_eq!(view.elapsed(), "0:07");
        let out = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(
            out,
            "Level: Intermediate [#7c6af7]\nAI: Hi there\nFeedback: Use articles.\n● Speaking...\n"
        );
    }

    #[test]
    fn final_stats_use_display_texts() {
        let view = TerminalView::new(Vec::new());
        view.set_final_stats(&StatsDisplay::default());
        let out = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(out, "exchanges 0 | words 0 | score - | time 0:00\n");
    }
}
