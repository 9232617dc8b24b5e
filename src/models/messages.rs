use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ColabError, ColabResult};
use crate::models::{Comment, Snapshot};

/// Envelope every frame must match before its payload gets a type.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    sender_id: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeMessage {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentAddMessage {
    pub line: u32,
    pub text: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentResolveMessage {
    pub comment_id: String,
}

/// Either a pixel position or a caret position, depending on the editor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CursorPosition {
    Caret { line: u32, column: u32 },
    Point { x: f64, y: f64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingMessage {
    #[serde(default = "default_typing")]
    pub typing: bool,
}

fn default_typing() -> bool {
    true
}

/// Events a client may send over its socket.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    ContentChange(ContentChangeMessage),
    CommentAdd(CommentAddMessage),
    CommentResolve(CommentResolveMessage),
    CursorMove(CursorPosition),
    UserTyping(UserTypingMessage),
    Ping,
}

impl ClientEvent {
    /// Parse a text frame. Unknown kinds and missing payload fields are `Malformed`.
    ///
    /// Any `senderId` in the frame is ignored; the hub stamps the connection's user.
    pub fn parse(text: &str) -> ColabResult<Self> {
        let raw: RawEnvelope = serde_json::from_str(text)?;
        if let Some(claimed) = &raw.sender_id {
            tracing::trace!(claimed = %claimed, kind = %raw.kind, "ignoring client supplied senderId");
        }
        let payload = raw.payload;
        let event = match raw.kind.as_str() {
            "content_change" => ClientEvent::ContentChange(typed_payload(&raw.kind, payload)?),
            "comment_add" => ClientEvent::CommentAdd(typed_payload(&raw.kind, payload)?),
            "comment_resolve" => ClientEvent::CommentResolve(typed_payload(&raw.kind, payload)?),
            "cursor_move" => ClientEvent::CursorMove(typed_payload(&raw.kind, payload)?),
            "user_typing" => {
                if payload.is_null() {
                    ClientEvent::UserTyping(UserTypingMessage { typing: true })
                } else {
                    ClientEvent::UserTyping(typed_payload(&raw.kind, payload)?)
                }
            }
            "ping" => ClientEvent::Ping,
            other => return Err(ColabError::Malformed(format!("unknown event type '{}'", other))),
        };
        Ok(event)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::ContentChange(_) => "content_change",
            ClientEvent::CommentAdd(_) => "comment_add",
            ClientEvent::CommentResolve(_) => "comment_resolve",
            ClientEvent::CursorMove(_) => "cursor_move",
            ClientEvent::UserTyping(_) => "user_typing",
            ClientEvent::Ping => "ping",
        }
    }
}

fn typed_payload<T: serde::de::DeserializeOwned>(kind: &str, payload: Value) -> ColabResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| ColabError::Malformed(format!("invalid '{}' payload: {}", kind, e)))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangedMessage {
    pub content: String,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentAddedMessage {
    pub comment: Comment,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorMovedMessage {
    pub position: CursorPosition,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedMessage {
    pub user_id: String,
    pub collaborators: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftMessage {
    pub user_id: String,
    pub remaining_collaborators: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClosedMessage {
    pub session_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub kind: String,
    pub message: String,
}

/// Events the server pushes to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    Snapshot(Snapshot),
    ContentChange(ContentChangedMessage),
    CommentAdd(CommentAddedMessage),
    CommentResolve(CommentResolveMessage),
    CursorMove(CursorMovedMessage),
    UserTyping(UserTypingMessage),
    UserJoined(UserJoinedMessage),
    UserLeft(UserLeftMessage),
    SessionDeleted(SessionClosedMessage),
    SessionReplaced(SessionClosedMessage),
    Pong(PongMessage),
    Error(ErrorMessage),
}

impl From<&ColabError> for ServerEvent {
    fn from(e: &ColabError) -> Self {
        ServerEvent::Error(ErrorMessage {
            kind: e.kind().to_string(),
            message: e.to_string(),
        })
    }
}

/// A server event plus the user that caused it, as written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub sender_id: Option<String>,
    pub event: ServerEvent,
}

impl OutboundMessage {
    pub fn new(sender_id: Option<String>, event: ServerEvent) -> Self {
        Self { sender_id, event }
    }

    pub fn system(event: ServerEvent) -> Self {
        Self { sender_id: None, event }
    }

    pub fn to_text(&self) -> ColabResult<String> {
        let mut value = serde_json::to_value(&self.event)
            .map_err(|e| ColabError::Internal(format!("failed to encode event: {}", e)))?;
        if let (Some(sender), Some(obj)) = (&self.sender_id, value.as_object_mut()) {
            obj.insert("senderId".to_string(), Value::String(sender.clone()));
        }
        Ok(value.to_string())
    }

    pub fn from_text(text: &str) -> ColabResult<Self> {
        let mut value: Value = serde_json::from_str(text)?;
        let sender_id = value
            .as_object_mut()
            .and_then(|obj| obj.remove("senderId"))
            .and_then(|v| v.as_str().map(str::to_string));
        let event = serde_json::from_value(value)?;
        Ok(Self { sender_id, event })
    }
}
