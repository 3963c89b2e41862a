use anyhow::Context;
use speakpal_appcore::service::PracticeService;
use speakpal_core::types::{Gender, Level, Screen};
use speakpal_engine::session::SessionStage;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Record,
    Back,
    End,
    Restart,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Empty,
            "/rec" => Command::Record,
            "/back" => Command::Back,
            "/end" => Command::End,
            "/restart" => Command::Restart,
            "/quit" | "/exit" => Command::Quit,
            other if other.starts_with('/') => Command::Unknown(other.to_string()),
            other => Command::Say(other.to_string()),
        }
    }
}

/// Choices given on the command line, replayed after every restart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presets {
    pub gender: Option<Gender>,
    pub level: Option<Level>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub async fn run(svc: &PracticeService, presets: Presets) -> anyhow::Result<()> {
    svc.client().view().show_screen(Screen::Gender);
    apply_presets(svc, presets).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        if handle_line(svc, presets, &line).await == Flow::Quit {
            break;
        }
    }
    Ok(())
}

pub async fn apply_presets(svc: &PracticeService, presets: Presets) {
    let client = svc.client();
    if let Some(gender) = presets.gender {
        client.select_gender(gender);
        if let Some(level) = presets.level {
            client.start(level, gender).await;
        }
    }
}

pub async fn handle_line(svc: &PracticeService, presets: Presets, line: &str) -> Flow {
    let client = svc.client();
    let view = client.view();

    let cmd = match Command::parse(line) {
        Command::Empty => return Flow::Continue,
        Command::Quit => return Flow::Quit,
        Command::Restart => {
            svc.restart();
            apply_presets(svc, presets).await;
            return Flow::Continue;
        }
        cmd => cmd,
    };

    let state = client.snapshot();
    match (state.stage, state.gender, cmd) {
        (SessionStage::Setup, None, Command::Say(choice)) => match choice.parse::<Gender>() {
            Ok(gender) => {
                client.select_gender(gender);
            }
            Err(e) => view.alert(&e.to_string()),
        },
        (SessionStage::Setup, Some(gender), Command::Say(choice)) => {
            match choice.parse::<Level>() {
                Ok(level) => {
                    let outcome = client.start(level, gender).await;
                    log::debug!("start: {outcome:?}");
                }
                Err(e) => view.alert(&e.to_string()),
            }
        }
        (SessionStage::Setup, Some(_), Command::Back) => {
            client.back_to_gender();
        }
        (SessionStage::InCall, _, Command::Say(text)) => {
            let outcome = svc.send_text(&text).await;
            log::debug!("text turn: {outcome:?}");
        }
        (SessionStage::InCall, _, Command::Record) => {
            let outcome = svc.toggle_recording().await;
            log::debug!("recording: {outcome:?}");
        }
        (SessionStage::InCall, _, Command::End) => {
            let outcome = svc.end().await;
            log::debug!("end: {outcome:?}");
        }
        (SessionStage::Ended, _, _) => {
            view.alert("Type /restart for a new session or /quit to exit.");
        }
        (_, _, Command::Unknown(cmd)) => view.alert(&format!("unknown command: {cmd}")),
        (stage, _, cmd) => log::debug!("{cmd:?} ignored at {stage:?}"),
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakpal_appcore::capture::UnavailableCapture;
    use speakpal_appcore::service::MIC_DENIED_ALERT;
    use speakpal_core::config::ClientConfig;
    use speakpal_core::types::ParticipantId;
    use speakpal_engine::traits::SummaryContent;
    use speakpal_platform::test::{MemoryPlayer, MemoryView, TranscriptLine};
    use speakpal_runtime::runtime_client::build_client_with_player;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("/rec"), Command::Record);
        assert_eq!(Command::parse("/back"), Command::Back);
        assert_eq!(Command::parse(" /end "), Command::End);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/dance"), Command::Unknown("/dance".into()));
        assert_eq!(
            Command::parse(" I like tea "),
            Command::Say("I like tea".into())
        );
    }

    async fn service(server: &MockServer) -> (PracticeService, Arc<MemoryView>) {
        let view = MemoryView::new();
        let cfg = ClientConfig {
            api_base_url: server.uri(),
            ..ClientConfig::default()
        };
        let client = build_client_with_player(
            &cfg,
            view.clone(),
            Arc::new(MemoryPlayer::default()),
            ParticipantId::placeholder(),
        )
        .unwrap();
        let svc = PracticeService::new(Arc::new(client), Arc::new(UnavailableCapture));
        (svc, view)
    }

    async fn mock(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn walks_setup_call_and_summary() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/session/start",
            serde_json::json!({"session_id": "r1", "message": "Hello!"}),
        )
        .await;
        mock(
            &server,
            "/session/text",
            serde_json::json!({"ai_response": "Tea is lovely."}),
        )
        .await;
        mock(
            &server,
            "/session/end",
            serde_json::json!({"summary": "Short but sweet."}),
        )
        .await;

        let (svc, view) = service(&server).await;
        let p = Presets::default();

        handle_line(&svc, p, "robot").await;
        assert_eq!(view.snapshot().alerts.len(), 1);

        handle_line(&svc, p, "male").await;
        assert_eq!(view.snapshot().screen, Some(Screen::Level));
        handle_line(&svc, p, "/back").await;
        assert_eq!(view.snapshot().screen, Some(Screen::Gender));
        assert_eq!(svc.client().snapshot().gender, None);

        handle_line(&svc, p, "female").await;
        assert_eq!(view.snapshot().screen, Some(Screen::Level));
        handle_line(&svc, p, "intermediate").await;
        assert_eq!(view.snapshot().persona, Some(Gender::Female));
        assert_eq!(view.snapshot().screen, Some(Screen::Call));

        handle_line(&svc, p, "I like tea").await;
        handle_line(&svc, p, "/rec").await;
        let v = view.snapshot();
        assert_eq!(
            v.transcript,
            vec![
                TranscriptLine::Ai("Hello!".into()),
                TranscriptLine::User("I like tea".into()),
                TranscriptLine::Ai("Tea is lovely.".into()),
            ]
        );
        assert_eq!(v.alerts.last().map(String::as_str), Some(MIC_DENIED_ALERT));

        handle_line(&svc, p, "/end").await;
        let v = view.snapshot();
        assert_eq!(v.screen, Some(Screen::Summary));
        assert_eq!(v.summary, Some(SummaryContent::Text("Short but sweet.".into())));

        handle_line(&svc, p, "/restart").await;
        assert_eq!(view.snapshot().screen, Some(Screen::Gender));
        assert_eq!(handle_line(&svc, p, "/quit").await, Flow::Quit);
    }

    #[tokio::test]
    async fn presets_skip_setup_screens() {
        let server = MockServer::start().await;
        mock(
            &server,
            "/session/start",
            serde_json::json!({"session_id": "r2", "message": "Ready?"}),
        )
        .await;

        let (svc, view) = service(&server).await;
        let presets = Presets {
            gender: Some(Gender::Male),
            level: Some(Level::Advanced),
        };
        apply_presets(&svc, presets).await;

        let v = view.snapshot();
        assert_eq!(v.screen, Some(Screen::Call));
        assert_eq!(v.persona, Some(Gender::Male));
        assert_eq!(v.badge, Some(Level::Advanced));
        assert!(svc.client().has_session());
    }
}
