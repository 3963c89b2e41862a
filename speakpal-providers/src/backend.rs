use crate::request::{Body, HttpRequest};
use serde::Serialize;
use speakpal_core::types::{Gender, Level, ParticipantId, SessionId};

pub const PATH_START: &str = "/session/start";
pub const PATH_VOICE: &str = "/session/voice";
pub const PATH_TEXT: &str = "/session/text";
pub const PATH_END: &str = "/session/end";

/// One recorded utterance, uploaded as a single binary part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            filename: "audio.wav".into(),
            mime_type: "audio/wav".into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSessionPayload<'a> {
    pub user_id: &'a str,
    pub level: Level,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct TextTurnPayload<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct EndSessionPayload<'a> {
    session_id: &'a str,
}

pub fn build_start_request(
    base_url: &str,
    participant: &ParticipantId,
    level: Level,
    gender: Gender,
) -> anyhow::Result<HttpRequest> {
    let payload = StartSessionPayload {
        user_id: participant.as_str(),
        level,
        gender,
    };
    HttpRequest::post_json(join_url(base_url, PATH_START), &payload)
}

pub fn build_text_request(
    base_url: &str,
    session_id: &SessionId,
    message: &str,
) -> anyhow::Result<HttpRequest> {
    let payload = TextTurnPayload {
        session_id: session_id.as_str(),
        message,
    };
    HttpRequest::post_json(join_url(base_url, PATH_TEXT), &payload)
}

pub fn build_end_request(base_url: &str, session_id: &SessionId) -> anyhow::Result<HttpRequest> {
    let payload = EndSessionPayload {
        session_id: session_id.as_str(),
    };
    HttpRequest::post_json(join_url(base_url, PATH_END), &payload)
}

pub fn build_voice_request(base_url: &str, session_id: &SessionId, audio: &AudioClip) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_field(&mut body, &boundary, "session_id", session_id.as_str());
    append_file(
        &mut body,
        &boundary,
        "audio",
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: join_url(base_url, PATH_VOICE),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_body(req: &HttpRequest) -> serde_json::Value {
        match &req.body {
            Body::Json(s) => serde_json::from_str(s).unwrap(),
            other => panic!("expected json, got {other:?}"),
        }
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("https://api.example.com/", "/session/start"),
            "https://api.example.com/session/start"
        );
        assert_eq!(
            join_url("https://api.example.com", "session/start"),
            "https://api.example.com/session/start"
        );
    }

    #[test]
    fn start_request_sends_lowercase_choices() {
        let req = build_start_request(
            "https://api.example.com/",
            &ParticipantId::new("42"),
            Level::Intermediate,
            Gender::Female,
        )
        .unwrap();

        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "https://api.example.com/session/start");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(
            json_body(&req),
            serde_json::json!({"user_id": "42", "level": "intermediate", "gender": "female"})
        );
    }

    #[test]
    fn text_and_end_requests_carry_session_id() {
        let sid = SessionId::new("s-1");

        let text = build_text_request("http://x", &sid, "I goed to the park").unwrap();
        assert!(text.url.ends_with("/session/text"));
        assert_eq!(
            json_body(&text),
            serde_json::json!({"session_id": "s-1", "message": "I goed to the park"})
        );

        let end = build_end_request("http://x", &sid).unwrap();
        assert!(end.url.ends_with("/session/end"));
        assert_eq!(json_body(&end), serde_json::json!({"session_id": "s-1"}));
    }

    #[test]
    fn voice_request_is_multipart_with_audio_part() {
        let clip = AudioClip {
            filename: "audio.webm".into(),
            mime_type: "audio/webm".into(),
            bytes: vec![1, 2, 3],
        };
        let req = build_voice_request("http://x/", &SessionId::new("s-9"), &clip);
        assert_eq!(req.url, "http://x/session/voice");

        let content_type = req.header("content-type").unwrap().to_string();
        match req.body {
            Body::MultipartFormData { boundary, bytes } => {
                assert!(content_type.ends_with(&boundary));
                let s = String::from_utf8_lossy(&bytes);
                assert!(s.contains("name=\"session_id\"\r\n\r\ns-9\r\n"));
                assert!(s.contains("name=\"audio\"; filename=\"audio.webm\""));
                assert!(s.contains("Content-Type: audio/webm"));
                assert!(s.ends_with(&format!("--{}--\r\n", boundary)));
            }
            _ => panic!("expected multipart"),
        }
    }
}
