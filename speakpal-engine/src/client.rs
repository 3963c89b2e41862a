use crate::session::{
    EndOutcome, SessionStage, SessionState, StartOutcome, TurnKind, TurnOutcome, TurnRequest,
};
use crate::timer::ElapsedTimer;
use crate::traits::{
    AudioPlayer, CallStatus, PracticeBackend, SessionView, SummaryContent, TurnResponse,
};
use speakpal_core::audio_hex::decode_audio_hex;
use speakpal_core::stats::{StatsDisplay, format_elapsed};
use speakpal_core::text::split_feedback;
use speakpal_core::types::{Gender, Level, ParticipantId, Screen};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub const FALLBACK_GREETING: &str =
    "Hello! I am your speaking partner. Let us practice English together!";
pub const FALLBACK_VOICE_REPLY: &str = "Sorry, I could not process that. Please try again.";
pub const FALLBACK_TEXT_REPLY: &str = "Sorry, something went wrong. Please try again.";
pub const FALLBACK_SUMMARY: &str = "Could not load summary. Great session though!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub feedback_display: Duration,
    pub timer_tick: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            feedback_display: Duration::from_secs(8),
            timer_tick: Duration::from_secs(1),
        }
    }
}

/// Drives one practice conversation at a time against a `PracticeBackend`.
///
/// At most one backend call (start, voice, text or end) is outstanding. Actions that arrive
/// while one is pending, or before a session exists, are ignored rather than queued.
pub struct SessionClient {
    backend: Arc<dyn PracticeBackend>,
    player: Arc<dyn AudioPlayer>,
    view: Arc<dyn SessionView>,
    settings: ClientSettings,
    state: Arc<Mutex<SessionState>>,
    in_flight: Arc<AtomicBool>,
    timer: Mutex<Option<ElapsedTimer>>,
}

/// Held for the duration of one backend call; releasing it re-enables input.
struct InFlight {
    flag: Arc<AtomicBool>,
    view: Arc<dyn SessionView>,
}

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>, view: &Arc<dyn SessionView>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            flag: flag.clone(),
            view: view.clone(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.view.set_inputs_enabled(true);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionClient {
    pub fn new(
        backend: Arc<dyn PracticeBackend>,
        player: Arc<dyn AudioPlayer>,
        view: Arc<dyn SessionView>,
        participant: ParticipantId,
        settings: ClientSettings,
    ) -> Self {
        Self {
            backend,
            player,
            view,
            settings,
            state: Arc::new(Mutex::new(SessionState::new(participant))),
            in_flight: Arc::new(AtomicBool::new(false)),
            timer: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_session(&self) -> bool {
        lock(&self.state).session_id.is_some()
    }

    pub fn view(&self) -> &Arc<dyn SessionView> {
        &self.view
    }

    /// Record the persona and move on to level selection.
    pub fn select_gender(&self, gender: Gender) -> bool {
        {
            let mut st = lock(&self.state);
            if st.stage != SessionStage::Setup {
                return false;
            }
            st.gender = Some(gender);
        }
        self.view.set_persona(gender);
        self.view.show_screen(Screen::Level);
        true
    }

    /// Leave level selection for the gender screen. Only valid before a call starts.
    pub fn back_to_gender(&self) -> bool {
        {
            let mut st = lock(&self.state);
            if st.stage != SessionStage::Setup {
                return false;
            }
            st.gender = None;
        }
        self.view.show_screen(Screen::Gender);
        true
    }

    pub async fn start(&self, level: Level, gender: Gender) -> StartOutcome {
        let (_guard, epoch, participant) = {
            let mut st = lock(&self.state);
            if st.stage != SessionStage::Setup {
                log::debug!("start ignored: stage is {:?}", st.stage);
                return StartOutcome::Ignored;
            }
            let Some(guard) = InFlight::acquire(&self.in_flight, &self.view) else {
                log::debug!("start ignored: request in flight");
                return StartOutcome::Ignored;
            };
            st.level = Some(level);
            st.gender = Some(gender);
            st.stage = SessionStage::InCall;
            st.elapsed_secs = 0;
            (guard, st.epoch, st.participant.clone())
        };

        self.view.set_inputs_enabled(false);
        self.view.set_persona(gender);
        self.view.set_level_badge(level);
        self.view.show_screen(Screen::Call);
        self.start_timer(epoch);

        log::info!(
            "starting session: participant={} level={} gender={}",
            participant.as_str(),
            level.as_str(),
            gender.as_str()
        );
        let res = self.backend.start_session(&participant, level, gender).await;

        if !self.is_current(epoch) {
            log::debug!("start response dropped: session was reset");
            return StartOutcome::Stale;
        }

        match res {
            Ok(resp) => {
                lock(&self.state).session_id = Some(resp.session_id.clone());
                log::info!("session started: {}", resp.session_id);
                self.render_ai_reply(&resp.message);
                self.play_audio_hex(resp.audio_hex.as_deref());
                StartOutcome::Started(resp.session_id)
            }
            Err(e) => {
                log::warn!("session start failed, continuing locally: {e:#}");
                self.view.add_ai_message(FALLBACK_GREETING);
                StartOutcome::StartedLocally
            }
        }
    }

    pub async fn submit_turn(&self, turn: TurnRequest) -> TurnOutcome {
        let turn = match turn {
            TurnRequest::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return TurnOutcome::Ignored;
                }
                TurnRequest::Text(text.to_string())
            }
            voice => voice,
        };
        let kind = turn.kind();

        let (_guard, epoch, session_id) = {
            let st = lock(&self.state);
            let Some(session_id) = st.session_id.clone() else {
                log::debug!("{} turn ignored: no active session", kind.as_str());
                return TurnOutcome::Ignored;
            };
            let Some(guard) = InFlight::acquire(&self.in_flight, &self.view) else {
                log::debug!("{} turn ignored: request in flight", kind.as_str());
                return TurnOutcome::Ignored;
            };
            (guard, st.epoch, session_id)
        };

        self.view.set_inputs_enabled(false);
        if let TurnRequest::Text(text) = &turn {
            self.view.add_user_message(text);
        }
        self.view.show_thinking();

        let res = match &turn {
            TurnRequest::Voice(clip) => self.backend.voice_turn(&session_id, clip).await,
            TurnRequest::Text(text) => self.backend.text_turn(&session_id, text).await,
        };

        self.view.hide_thinking();

        if !self.is_current(epoch) {
            log::debug!("{} turn response dropped: session was reset", kind.as_str());
            return TurnOutcome::Stale;
        }

        match res {
            Ok(resp) => {
                self.render_turn(resp);
                TurnOutcome::Completed
            }
            Err(e) => {
                log::warn!("{} turn failed: {e:#}", kind.as_str());
                self.view.add_ai_message(match kind {
                    TurnKind::Voice => FALLBACK_VOICE_REPLY,
                    TurnKind::Text => FALLBACK_TEXT_REPLY,
                });
                TurnOutcome::Failed
            }
        }
    }

    pub async fn end_session(&self) -> EndOutcome {
        let (_guard, epoch, session_id, final_stats) = {
            let mut st = lock(&self.state);
            if st.stage != SessionStage::InCall {
                log::debug!("end ignored: stage is {:?}", st.stage);
                return EndOutcome::Ignored;
            }
            let Some(guard) = InFlight::acquire(&self.in_flight, &self.view) else {
                log::debug!("end ignored: request in flight");
                return EndOutcome::Ignored;
            };
            st.stage = SessionStage::Ended;
            (guard, st.epoch, st.session_id.clone(), st.stats.clone())
        };

        self.stop_timer();
        self.view.set_final_stats(&final_stats);
        self.view.show_summary(&SummaryContent::Loading);
        self.view.show_screen(Screen::Summary);

        let Some(session_id) = session_id else {
            log::info!("ending local-only session");
            self.view
                .show_summary(&SummaryContent::Text(FALLBACK_SUMMARY.into()));
            return EndOutcome::FallbackSummary;
        };

        log::info!("ending session {session_id}");
        let res = self.backend.end_session(&session_id).await;

        if !self.is_current(epoch) {
            return EndOutcome::Stale;
        }
        lock(&self.state).session_id = None;

        match res {
            Ok(resp) => {
                self.view
                    .show_summary(&SummaryContent::Text(resp.summary.clone()));
                EndOutcome::Summarized(resp.summary)
            }
            Err(e) => {
                log::warn!("session end failed: {e:#}");
                self.view
                    .show_summary(&SummaryContent::Text(FALLBACK_SUMMARY.into()));
                EndOutcome::FallbackSummary
            }
        }
    }

    /// Back to the gender screen with a blank slate. Safe to call repeatedly.
    pub fn reset(&self) {
        self.stop_timer();
        lock(&self.state).clear();

        let stats = StatsDisplay::default();
        self.view.clear_transcript();
        self.view.show_summary(&SummaryContent::Loading);
        self.view.set_stats(&stats);
        self.view.set_elapsed(&stats.duration);
        self.view.show_screen(Screen::Gender);
    }

    fn is_current(&self, epoch: u64) -> bool {
        lock(&self.state).epoch == epoch
    }

    fn start_timer(&self, epoch: u64) {
        let state = self.state.clone();
        let view = self.view.clone();
        let timer = ElapsedTimer::spawn(self.settings.timer_tick, move |elapsed| {
            let text = {
                let mut st = lock(&state);
                if st.epoch != epoch {
                    return;
                }
                st.elapsed_secs = elapsed.as_secs();
                st.stats.duration = format_elapsed(st.elapsed_secs);
                st.stats.duration.clone()
            };
            view.set_elapsed(&text);
        });

        // Replacing the handle drops (and aborts) any previous ticker.
        *lock(&self.timer) = Some(timer);
    }

    fn stop_timer(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.stop();
        }
    }

    fn render_turn(&self, resp: TurnResponse) {
        if let Some(user_text) = resp.user_text.as_deref().filter(|t| !t.is_empty()) {
            self.view.add_user_message(user_text);
        }
        if let Some(reply) = resp.ai_response.as_deref().filter(|t| !t.is_empty()) {
            self.render_ai_reply(reply);
        }
        self.play_audio_hex(resp.audio_hex.as_deref());

        if let Some(stats) = resp.stats {
            let display = {
                let mut st = lock(&self.state);
                st.stats.mirror(&stats);
                st.stats.clone()
            };
            self.view.set_stats(&display);
        }
    }

    fn render_ai_reply(&self, text: &str) {
        let reply = split_feedback(text);
        self.view.add_ai_message(&reply.main_text);
        if let Some(feedback) = reply.feedback {
            self.view
                .add_feedback(&feedback, self.settings.feedback_display);
        }
    }

    fn play_audio_hex(&self, hex: Option<&str>) {
        let Some(hex) = hex.filter(|h| !h.trim().is_empty()) else {
            return;
        };

        let audio = match decode_audio_hex(hex) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("skipping reply audio: {e}");
                return;
            }
        };

        self.view.set_call_status(CallStatus::Speaking);
        let view = self.view.clone();
        let finished = Box::new(move || view.set_call_status(CallStatus::Active));
        if let Err(e) = self.player.play(audio, finished) {
            log::warn!("audio playback failed: {e:#}");
            self.view.set_call_status(CallStatus::Active);
        }
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.stop_timer();
        self.player.stop();
    }
}
