//! Bridge wire protocol
//!
//! The host UI toolkit talks to the player over a request/reply channel
//! carrying these JSON shapes, plus an asynchronous notification stream.
//! Everything is camelCase on the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vela_core::ExternalSubtitle;

/// Commands accepted from the host UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// Open a playback session for the given media
    #[serde(rename_all = "camelCase")]
    Initialize {
        url: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        http_headers: HashMap<String, String>,
        #[serde(default)]
        subtitles: Vec<ExternalSubtitle>,
    },
    Play,
    Pause,
    #[serde(rename_all = "camelCase")]
    Seek { position_ms: i64 },
    GetPosition,
    GetDuration,
    SetVolume { volume: f64 },
    SetSpeed { speed: f64 },
    LoadSubtitle { url: String },
    SetSubtitle { index: i64 },
    /// Close the session; replies with the final playback figures
    Dispose,
}

/// Replies returned for each request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BridgeReply {
    Ok,
    #[serde(rename_all = "camelCase")]
    Position { position_ms: i64 },
    #[serde(rename_all = "camelCase")]
    Duration { duration_ms: i64 },
    #[serde(rename_all = "camelCase")]
    Summary { position_ms: i64, duration_ms: i64 },
    Error { code: String, message: String },
}

/// Asynchronous notifications pushed to the host UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeNotification {
    /// The playback session opened successfully
    Ready,
    /// A fatal player error; the screen should close
    Error { message: String },
}

impl BridgeRequest {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl BridgeReply {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("reply serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_wire_shape() {
        let raw = r#"{
            "method": "initialize",
            "args": {
                "url": "https://example.com/a.mkv",
                "title": "A",
                "httpHeaders": {"Authorization": "Bearer x"},
                "subtitles": [{"url": "https://example.com/a.srt", "title": "en"}]
            }
        }"#;
        let request = BridgeRequest::from_json(raw).unwrap();
        match request {
            BridgeRequest::Initialize {
                url,
                title,
                http_headers,
                subtitles,
            } => {
                assert_eq!(url, "https://example.com/a.mkv");
                assert_eq!(title, "A");
                assert_eq!(http_headers.get("Authorization").unwrap(), "Bearer x");
                assert_eq!(subtitles.len(), 1);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_seek_uses_camel_case() {
        let request = BridgeRequest::Seek { position_ms: 1500 };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""method":"seek""#));
        assert!(json.contains(r#""positionMs":1500"#));
        assert_eq!(BridgeRequest::from_json(&json).unwrap(), request);
    }

    #[test]
    fn test_unit_requests_round_trip() {
        for request in [
            BridgeRequest::Play,
            BridgeRequest::Pause,
            BridgeRequest::GetPosition,
            BridgeRequest::GetDuration,
            BridgeRequest::Dispose,
        ] {
            let json = serde_json::to_string(&request).unwrap();
            assert_eq!(BridgeRequest::from_json(&json).unwrap(), request);
        }
    }

    #[test]
    fn test_summary_reply_shape() {
        let reply = BridgeReply::Summary {
            position_ms: 42500,
            duration_ms: 120000,
        };
        let json = reply.to_json();
        assert!(json.contains(r#""status":"summary""#));
        assert!(json.contains(r#""positionMs":42500"#));
        assert!(json.contains(r#""durationMs":120000"#));
    }

    #[test]
    fn test_error_reply_carries_code() {
        let reply = BridgeReply::Error {
            code: "ENGINE_UNAVAILABLE".into(),
            message: "playback engine is not available".into(),
        };
        let json = reply.to_json();
        assert!(json.contains(r#""code":"ENGINE_UNAVAILABLE""#));
    }

    #[test]
    fn test_notification_shapes() {
        assert_eq!(
            serde_json::to_string(&BridgeNotification::Ready).unwrap(),
            r#"{"event":"ready"}"#
        );
        let error = serde_json::to_string(&BridgeNotification::Error {
            message: "engine missing".into(),
        })
        .unwrap();
        assert!(error.contains(r#""event":"error""#));
    }
}
