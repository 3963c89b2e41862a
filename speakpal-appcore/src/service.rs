use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use speakpal_core::config::ClientConfig;
use speakpal_core::types::ParticipantId;
use speakpal_engine::client::SessionClient;
use speakpal_engine::session::{EndOutcome, TurnOutcome, TurnRequest};
use speakpal_engine::traits::{AudioClip, SessionView};
use speakpal_runtime::runtime_client::build_client_from_config;

use crate::capture::{VoiceCapture, default_capture};

pub const HINT_IDLE: &str = "Tap mic to record your message";
pub const HINT_RECORDING: &str = "Recording... tap to stop";
pub const HINT_PROCESSING: &str = "Processing...";
pub const MIC_DENIED_ALERT: &str =
    "Microphone access denied. Please allow microphone and try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingOutcome {
    Started,
    Submitted(TurnOutcome),
    /// Nothing usable was captured; no request was sent.
    Discarded,
    /// A request is in flight.
    Rejected,
    MicUnavailable,
}

/// The call screen's controls: mic toggle, text box, end and restart buttons.
pub struct PracticeService {
    client: Arc<SessionClient>,
    capture: Arc<dyn VoiceCapture>,
    recording: AtomicBool,
}

impl PracticeService {
    pub fn new(client: Arc<SessionClient>, capture: Arc<dyn VoiceCapture>) -> Self {
        Self {
            client,
            capture,
            recording: AtomicBool::new(false),
        }
    }

    pub fn from_config(
        cfg: &ClientConfig,
        view: Arc<dyn SessionView>,
        participant: ParticipantId,
    ) -> anyhow::Result<Self> {
        let client = build_client_from_config(cfg, view, participant)?;
        Ok(Self::new(
            Arc::new(client),
            default_capture(cfg.microphone_device.clone()),
        ))
    }

    pub fn client(&self) -> &Arc<SessionClient> {
        &self.client
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    pub async fn toggle_recording(&self) -> RecordingOutcome {
        if self.client.is_busy() {
            log::debug!("recording toggle ignored: request in flight");
            return RecordingOutcome::Rejected;
        }

        let view = self.client.view();

        if self
            .recording
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            if let Err(e) = self.capture.begin() {
                log::warn!("microphone unavailable: {e:#}");
                self.capture.release();
                view.alert(MIC_DENIED_ALERT);
                return RecordingOutcome::MicUnavailable;
            }
            self.recording.store(true, Ordering::Release);
            view.set_recording(true);
            view.set_voice_hint(HINT_RECORDING);
            return RecordingOutcome::Started;
        }

        view.set_recording(false);
        view.set_voice_hint(HINT_PROCESSING);

        let wav = self
            .capture
            .finish()
            .and_then(|captured| {
                if captured.is_empty() {
                    return Ok(None);
                }
                captured.to_upload_wav().map(Some)
            });

        let wav = match wav {
            Ok(Some(wav)) => wav,
            Ok(None) => {
                log::debug!("empty recording discarded");
                view.set_voice_hint(HINT_IDLE);
                return RecordingOutcome::Discarded;
            }
            Err(e) => {
                log::warn!("recording failed: {e:#}");
                view.set_voice_hint(HINT_IDLE);
                return RecordingOutcome::Discarded;
            }
        };

        let outcome = self
            .client
            .submit_turn(TurnRequest::Voice(AudioClip::wav(wav)))
            .await;
        view.set_voice_hint(HINT_IDLE);
        RecordingOutcome::Submitted(outcome)
    }

    pub async fn send_text(&self, text: &str) -> TurnOutcome {
        self.client
            .submit_turn(TurnRequest::Text(text.to_string()))
            .await
    }

    pub async fn end(&self) -> EndOutcome {
        self.abandon_recording();
        self.client.end_session().await
    }

    pub fn restart(&self) {
        self.abandon_recording();
        self.client.reset();
        self.client.view().set_voice_hint(HINT_IDLE);
    }

    fn abandon_recording(&self) {
        if self.recording.swap(false, Ordering::AcqRel) {
            log::debug!("discarding in-progress recording");
            self.capture.release();
            self.client.view().set_recording(false);
        }
    }
}

impl Drop for PracticeService {
    fn drop(&mut self) {
        self.capture.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakpal_audio::capture::CapturedAudio;
    use speakpal_core::types::{Gender, Level, Screen};
    use speakpal_engine::client::ClientSettings;
    use speakpal_engine::traits::PracticeBackend;
    use speakpal_platform::test::{MemoryPlayer, MemoryView, TranscriptLine};
    use speakpal_runtime::backend::HttpPracticeBackend;
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct FakeCapture {
        fail_open: bool,
        samples: Vec<f32>,
        open: AtomicBool,
        begins: AtomicUsize,
        releases: AtomicUsize,
    }

    impl VoiceCapture for FakeCapture {
        fn begin(&self) -> anyhow::Result<()> {
            self.begins.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                anyhow::bail!("permission denied");
            }
            self.open.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn finish(&self) -> anyhow::Result<CapturedAudio> {
            if self.open.swap(false, Ordering::SeqCst) {
                self.releases.fetch_add(1, Ordering::SeqCst);
            }
            Ok(CapturedAudio {
                sample_rate_hz: 16_000,
                samples: self.samples.clone(),
            })
        }

        fn release(&self) {
            if self.open.swap(false, Ordering::SeqCst) {
                self.releases.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    async fn backend() -> (MockServer, Arc<dyn PracticeBackend>) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "session_id": "mic-1",
                "message": "Tell me about your weekend."
            })))
            .mount(&server)
            .await;
        let backend =
            HttpPracticeBackend::new(server.uri(), Default::default()).unwrap();
        (server, Arc::new(backend))
    }

    async fn started_service(
        backend: Arc<dyn PracticeBackend>,
        capture: Arc<FakeCapture>,
    ) -> (PracticeService, Arc<MemoryView>) {
        let view = MemoryView::new();
        let client = SessionClient::new(
            backend,
            Arc::new(MemoryPlayer::default()),
            view.clone(),
            ParticipantId::placeholder(),
            ClientSettings::default(),
        );
        client.start(Level::Beginner, Gender::Female).await;
        (PracticeService::new(Arc::new(client), capture), view)
    }

    #[tokio::test]
    async fn recording_round_trip_submits_voice_turn() {
        let (server, backend) = backend().await;
        Mock::given(method("POST"))
            .and(path("/session/voice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user_text": "I went hiking",
                "ai_response": "Sounds fun!",
                "stats": {"exchanges": 1, "total_words": 3, "avg_score": 8}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let capture = Arc::new(FakeCapture {
            samples: vec![0.1; 1_600],
            ..Default::default()
        });
        let (svc, view) = started_service(backend, capture.clone()).await;

        assert_eq!(svc.toggle_recording().await, RecordingOutcome::Started);
        assert!(svc.is_recording());
        let v = view.snapshot();
        assert!(v.recording);
        assert_eq!(v.voice_hint, HINT_RECORDING);

        assert_eq!(
            svc.toggle_recording().await,
            RecordingOutcome::Submitted(TurnOutcome::Completed)
        );
        assert!(!svc.is_recording());
        assert_eq!(capture.releases.load(Ordering::SeqCst), 1);

        let v = view.snapshot();
        assert!(!v.recording);
        assert_eq!(v.voice_hint, HINT_IDLE);
        assert_eq!(
            &v.transcript[1..],
            &[
                TranscriptLine::User("I went hiking".into()),
                TranscriptLine::Ai("Sounds fun!".into()),
            ]
        );
        assert_eq!(v.stats.unwrap().score, "8/10");

        let requests = server.received_requests().await.unwrap();
        let upload = requests
            .iter()
            .find(|r| r.url.path() == "/session/voice")
            .unwrap();
        let body = String::from_utf8_lossy(&upload.body);
        assert!(body.contains("name=\"session_id\"\r\n\r\nmic-1"));
        assert!(body.contains("filename=\"audio.wav\""));
    }

    #[tokio::test]
    async fn mic_failure_alerts_and_aborts() {
        let (server, backend) = backend().await;
        Mock::given(method("POST"))
            .and(path("/session/voice"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let capture = Arc::new(FakeCapture {
            fail_open: true,
            ..Default::default()
        });
        let (svc, view) = started_service(backend, capture.clone()).await;

        assert_eq!(svc.toggle_recording().await, RecordingOutcome::MicUnavailable);
        assert!(!svc.is_recording());
        let v = view.snapshot();
        assert_eq!(v.alerts, vec![MIC_DENIED_ALERT.to_string()]);
        assert!(!v.recording);

        // The next tap tries the microphone again.
        assert_eq!(svc.toggle_recording().await, RecordingOutcome::MicUnavailable);
        assert_eq!(capture.begins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_recording_sends_nothing() {
        let (server, backend) = backend().await;
        Mock::given(method("POST"))
            .and(path("/session/voice"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let capture = Arc::new(FakeCapture::default());
        let (svc, view) = started_service(backend, capture.clone()).await;

        svc.toggle_recording().await;
        assert_eq!(svc.toggle_recording().await, RecordingOutcome::Discarded);
        assert_eq!(capture.releases.load(Ordering::SeqCst), 1);
        assert_eq!(view.snapshot().voice_hint, HINT_IDLE);
    }

    #[tokio::test]
    async fn restart_mid_recording_releases_microphone() {
        let (_server, backend) = backend().await;
        let capture = Arc::new(FakeCapture {
            samples: vec![0.2; 10],
            ..Default::default()
        });
        let (svc, view) = started_service(backend, capture.clone()).await;

        svc.toggle_recording().await;
        svc.restart();

        assert!(!svc.is_recording());
        assert_eq!(capture.releases.load(Ordering::SeqCst), 1);
        let v = view.snapshot();
        assert_eq!(v.screen, Some(Screen::Gender));
        assert!(v.transcript.is_empty());
        assert_eq!(v.voice_hint, HINT_IDLE);
        assert!(!svc.client().has_session());
    }

    #[tokio::test]
    async fn text_and_end_delegate_to_client() {
        let (server, backend) = backend().await;
        Mock::given(method("POST"))
            .and(path("/session/text"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ai_response": "Nice!"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/end"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let (svc, view) = started_service(backend, Arc::new(FakeCapture::default())).await;

        assert_eq!(svc.send_text("  ").await, TurnOutcome::Ignored);
        assert_eq!(svc.send_text("Hi").await, TurnOutcome::Completed);
        assert_eq!(svc.end().await, EndOutcome::FallbackSummary);
        assert_eq!(view.snapshot().screen, Some(Screen::Summary));
    }
}
