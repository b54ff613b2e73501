//! JSON text-frame protocol between widgets/dashboards and the server.

use livecount_common::{PageId, ProtocolError};
use serde::{Deserialize, Serialize};

use crate::engine::CountUpdate;

/// Messages received from clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Be counted on a page.
    #[serde(rename = "join-page")]
    JoinPage {
        #[serde(rename = "pagePath")]
        page_path: PageId,
    },

    /// Watch a page's count without being counted.
    #[serde(rename = "monitor-page")]
    MonitorPage {
        #[serde(rename = "pagePath")]
        page_path: PageId,
    },

    #[serde(rename = "leave-page")]
    LeavePage,

    #[serde(rename = "ping")]
    Ping,
}

/// Messages sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "update-count")]
    UpdateCount {
        #[serde(rename = "pagePath")]
        page_path: PageId,
        count: usize,
    },

    #[serde(rename = "pong")]
    Pong,

    #[serde(rename = "error")]
    Error { message: String },
}

impl From<&CountUpdate> for ServerMessage {
    fn from(update: &CountUpdate) -> Self {
        ServerMessage::UpdateCount {
            page_path: update.page.clone(),
            count: update.count,
        }
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        // Every variant is a flat map of strings and integers.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"type\":\"error\"}"))
    }
}

/// Decode one inbound text frame, refusing frames longer than `max_bytes`.
pub fn decode(text: &str, max_bytes: usize) -> Result<ClientMessage, ProtocolError> {
    if text.len() > max_bytes {
        return Err(ProtocolError::TooLarge {
            size: text.len(),
            max: max_bytes,
        });
    }
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join_and_monitor() {
        let msg = decode(r#"{"type":"join-page","pagePath":"/home"}"#, 4096).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinPage {
                page_path: PageId::from("/home")
            }
        );

        let msg = decode(r#"{"type":"monitor-page","pagePath":"/blog/"}"#, 4096).unwrap();
        assert_eq!(
            msg,
            ClientMessage::MonitorPage {
                page_path: PageId::from("/blog/")
            }
        );
    }

    #[test]
    fn decodes_unit_messages() {
        assert_eq!(
            decode(r#"{"type":"leave-page"}"#, 4096).unwrap(),
            ClientMessage::LeavePage
        );
        assert_eq!(decode(r#"{"type":"ping"}"#, 4096).unwrap(), ClientMessage::Ping);
    }

    #[test]
    fn empty_page_path_is_accepted() {
        let msg = decode(r#"{"type":"join-page","pagePath":""}"#, 4096).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinPage {
                page_path: PageId::from("")
            }
        );
    }

    #[test]
    fn rejects_unknown_type_and_missing_path() {
        let err = decode(r#"{"type":"explode"}"#, 4096).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));

        let err = decode(r#"{"type":"join-page"}"#, 4096).unwrap_err();
        assert!(err.to_string().contains("pagePath"));

        assert!(decode("not json", 4096).is_err());
    }

    #[test]
    fn rejects_oversized_frames() {
        let path = "x".repeat(200);
        let text = format!(r#"{{"type":"join-page","pagePath":"{path}"}}"#);
        let err = decode(&text, 64).unwrap_err();
        assert!(matches!(err, ProtocolError::TooLarge { max: 64, .. }));
    }

    #[test]
    fn update_count_wire_format() {
        let update = CountUpdate {
            page: PageId::from("/home"),
            count: 2,
        };
        let json = ServerMessage::from(&update).to_json();
        assert_eq!(json, r#"{"type":"update-count","pagePath":"/home","count":2}"#);
    }

    #[test]
    fn pong_and_error_wire_format() {
        assert_eq!(ServerMessage::Pong.to_json(), r#"{"type":"pong"}"#);
        let err = ServerMessage::Error {
            message: "bad".into(),
        };
        assert_eq!(err.to_json(), r#"{"type":"error","message":"bad"}"#);
    }
}
