use chrono::Utc;
use tracing::debug;

use crate::error::{ColabError, ColabResult};
use crate::models::{
    ClientEvent, Comment, CommentAddedMessage, CommentResolveMessage, ContentChangedMessage,
    CursorMovedMessage, OutboundMessage, PongMessage, ServerEvent,
};
use crate::services::document::ContentUpdate;
use crate::ws::registry::SessionRegistry;
use crate::ws::room::{ConnId, RoomState};

/// What applying one client event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Updated(ContentUpdate),
    Commented(Comment),
    Resolved,
    Relayed,
    /// Goes back to the sender only.
    Pong(PongMessage),
}

impl SessionRegistry {
    /// Apply an event on behalf of `user_id` and fan it out to everyone else in the session.
    pub async fn apply_event(&self, session_id: &str, user_id: &str, event: ClientEvent) -> ColabResult<EventOutcome> {
        let kind = event.kind();
        let outcome = self
            .mutate(session_id, Some(user_id), |state| dispatch(state, user_id, event))
            .await;
        if let Err(e) = &outcome {
            debug!(session_id, user_id, kind, "event rejected: {}", e);
        }
        outcome
    }

    /// Like `apply_event`, but only while `conn_id` is still attached to the session.
    pub(crate) async fn apply_connection_event(
        &self,
        session_id: &str,
        conn_id: ConnId,
        user_id: &str,
        event: ClientEvent,
    ) -> ColabResult<EventOutcome> {
        self.mutate(session_id, Some(user_id), |state| {
            if !state.has_connection(conn_id) {
                return Err(ColabError::Forbidden(format!(
                    "connection {} is no longer part of session '{}'",
                    conn_id, session_id
                )));
            }
            dispatch(state, user_id, event)
        })
        .await
    }

    pub async fn update_content(&self, session_id: &str, user_id: &str, content: &str) -> ColabResult<ContentUpdate> {
        self.mutate(session_id, None, |state| {
            let update = state.doc.update(content, user_id);
            let msg = content_changed(state, user_id, update.version, None);
            Ok((update, Some(msg)))
        })
        .await
    }

    /// Copy `version` into a new version. Returns the new version number.
    pub async fn restore_version(&self, session_id: &str, version: u64, user_id: &str) -> ColabResult<u64> {
        self.mutate(session_id, None, |state| {
            let restored = state.doc.restore(version, user_id)?;
            let msg = content_changed(state, user_id, restored, Some(version));
            Ok((restored, Some(msg)))
        })
        .await
    }

    pub async fn add_comment(
        &self,
        session_id: &str,
        user_id: &str,
        line: u32,
        text: &str,
        username: Option<&str>,
    ) -> ColabResult<Comment> {
        self.mutate(session_id, None, |state| {
            let comment = state.comments.add(line, text, user_id, username.unwrap_or(user_id));
            let msg = comment_added(user_id, &comment);
            Ok((comment, Some(msg)))
        })
        .await
    }

    /// Resolve a comment; `user_id` only names the sender of the broadcast.
    pub async fn resolve_comment(&self, session_id: &str, comment_id: &str, user_id: Option<&str>) -> ColabResult<()> {
        self.mutate(session_id, None, |state| {
            state.comments.resolve(comment_id)?;
            let msg = comment_resolved(user_id, comment_id);
            Ok(((), Some(msg)))
        })
        .await
    }
}

fn dispatch(state: &mut RoomState, user_id: &str, event: ClientEvent) -> ColabResult<(EventOutcome, Option<OutboundMessage>)> {
    let sender = Some(user_id.to_string());
    match event {
        ClientEvent::ContentChange(m) => {
            let update = state.doc.update(&m.content, user_id);
            let msg = content_changed(state, user_id, update.version, None);
            Ok((EventOutcome::Updated(update), Some(msg)))
        }
        ClientEvent::CommentAdd(m) => {
            let username = m.username.as_deref().unwrap_or(user_id);
            let comment = state.comments.add(m.line, &m.text, user_id, username);
            let msg = comment_added(user_id, &comment);
            Ok((EventOutcome::Commented(comment), Some(msg)))
        }
        ClientEvent::CommentResolve(m) => {
            state.comments.resolve(&m.comment_id)?;
            Ok((EventOutcome::Resolved, Some(comment_resolved(Some(user_id), &m.comment_id))))
        }
        ClientEvent::CursorMove(position) => {
            let msg = OutboundMessage::new(sender, ServerEvent::CursorMove(CursorMovedMessage { position }));
            Ok((EventOutcome::Relayed, Some(msg)))
        }
        ClientEvent::UserTyping(m) => {
            Ok((EventOutcome::Relayed, Some(OutboundMessage::new(sender, ServerEvent::UserTyping(m)))))
        }
        ClientEvent::Ping => {
            let pong = PongMessage { date: Utc::now().to_rfc3339() };
            Ok((EventOutcome::Pong(pong), None))
        }
    }
}

fn content_changed(state: &RoomState, user_id: &str, version: u64, restored_from: Option<u64>) -> OutboundMessage {
    OutboundMessage::new(
        Some(user_id.to_string()),
        ServerEvent::ContentChange(ContentChangedMessage {
            content: state.doc.content().to_string(),
            version,
            restored_from,
        }),
    )
}

fn comment_added(user_id: &str, comment: &Comment) -> OutboundMessage {
    OutboundMessage::new(
        Some(user_id.to_string()),
        ServerEvent::CommentAdd(CommentAddedMessage { comment: comment.clone() }),
    )
}

fn comment_resolved(user_id: Option<&str>, comment_id: &str) -> OutboundMessage {
    OutboundMessage::new(
        user_id.map(str::to_string),
        ServerEvent::CommentResolve(CommentResolveMessage { comment_id: comment_id.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::config::Config;
    use crate::models::{CommentAddMessage, ContentChangeMessage, CursorPosition, UserTypingMessage};
    use crate::ws::hub::JoinPolicy;

    fn registry() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(&Config::default()))
    }

    fn change(content: &str) -> ClientEvent {
        ClientEvent::ContentChange(ContentChangeMessage { content: content.to_string() })
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn demo_scenario() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx1, _rx1) = mpsc::channel(32);
        let (tx2, mut rx2) = mpsc::channel(32);
        reg.join(&id, "u1", tx1, JoinPolicy::Existing).await.unwrap();
        reg.join(&id, "u2", tx2, JoinPolicy::Existing).await.unwrap();

        let EventOutcome::Updated(update) = reg.apply_event(&id, "u1", change("hello")).await.unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(update.version, 2);
        let added: Vec<&str> = update.diff.lines().filter(|l| l.starts_with('+') && !l.starts_with("+++")).collect();
        assert_eq!(added, vec!["+hello"]);

        let comment = reg.add_comment(&id, "u2", 0, "typo?", None).await.unwrap();
        assert!(!comment.resolved);
        assert_eq!(comment.username, "u2");
        assert_eq!(reg.comments(&id).await.unwrap().len(), 1);

        let (tx3, mut rx3) = mpsc::channel(32);
        let joined = reg.join(&id, "u3", tx3, JoinPolicy::Existing).await.unwrap();
        assert_eq!(joined.snapshot.content, "hello");
        assert_eq!(joined.snapshot.version, 2);

        drain(&mut rx2);
        drain(&mut rx3);
        assert!(reg.leave("u1").await);

        for rx in [&mut rx2, &mut rx3] {
            let left: Vec<OutboundMessage> = drain(rx)
                .into_iter()
                .filter(|m| matches!(&m.event, ServerEvent::UserLeft(l) if l.user_id == "u1"))
                .collect();
            assert_eq!(left.len(), 1);
        }
    }

    #[tokio::test]
    async fn events_are_not_echoed_to_sender() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx1, mut rx1) = mpsc::channel(32);
        let (tx2, mut rx2) = mpsc::channel(32);
        reg.join(&id, "u1", tx1, JoinPolicy::Existing).await.unwrap();
        reg.join(&id, "u2", tx2, JoinPolicy::Existing).await.unwrap();
        drain(&mut rx1);
        drain(&mut rx2);

        let cursor = ClientEvent::CursorMove(CursorPosition::Caret { line: 3, column: 7 });
        assert_eq!(reg.apply_event(&id, "u1", cursor).await.unwrap(), EventOutcome::Relayed);
        let typing = ClientEvent::UserTyping(UserTypingMessage { typing: true });
        reg.apply_event(&id, "u1", typing).await.unwrap();

        assert!(drain(&mut rx1).is_empty());
        let seen = drain(&mut rx2);
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|m| m.sender_id.as_deref() == Some("u1")));
        assert!(matches!(&seen[0].event, ServerEvent::CursorMove(m)
            if m.position == CursorPosition::Caret { line: 3, column: 7 }));
        assert!(matches!(&seen[1].event, ServerEvent::UserTyping(m) if m.typing));
        assert_eq!(reg.get(&id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn ping_answers_sender_only() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx2, mut rx2) = mpsc::channel(32);
        reg.join(&id, "u2", tx2, JoinPolicy::Existing).await.unwrap();
        drain(&mut rx2);

        let outcome = reg.apply_event(&id, "u1", ClientEvent::Ping).await.unwrap();
        assert!(matches!(outcome, EventOutcome::Pong(_)));
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn failing_events_leave_state_untouched() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx2, mut rx2) = mpsc::channel(32);
        reg.join(&id, "u2", tx2, JoinPolicy::Existing).await.unwrap();
        drain(&mut rx2);

        let resolve = ClientEvent::CommentResolve(CommentResolveMessage { comment_id: "nope".to_string() });
        assert!(matches!(reg.apply_event(&id, "u1", resolve).await, Err(ColabError::NotFound(_))));
        assert!(matches!(reg.apply_event("missing", "u1", change("x")).await, Err(ColabError::NotFound(_))));
        assert!(matches!(reg.restore_version(&id, 9, "u1").await, Err(ColabError::NotFound(_))));
        assert!(drain(&mut rx2).is_empty());

        // Later events still go through.
        let update = reg.update_content(&id, "u1", "after").await.unwrap();
        assert_eq!(update.version, 2);
    }

    #[tokio::test]
    async fn rest_mutations_reach_every_connection() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx1, mut rx1) = mpsc::channel(32);
        reg.join(&id, "u1", tx1, JoinPolicy::Existing).await.unwrap();
        drain(&mut rx1);

        reg.update_content(&id, "u1", "one").await.unwrap();
        let restored = reg.restore_version(&id, 1, "u1").await.unwrap();
        assert_eq!(restored, 3);
        let comment = reg.add_comment(&id, "u1", 2, "note", Some("Ann")).await.unwrap();
        reg.resolve_comment(&id, &comment.id, None).await.unwrap();

        let events: Vec<ServerEvent> = drain(&mut rx1).into_iter().map(|m| m.event).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[1], ServerEvent::ContentChange(m)
            if m.version == 3 && m.restored_from == Some(1) && m.content == "// Start coding here..."));
        assert!(matches!(&events[2], ServerEvent::CommentAdd(m) if m.comment.username == "Ann"));
        assert!(matches!(&events[3], ServerEvent::CommentResolve(m) if m.comment_id == comment.id));
        assert!(reg.comments(&id).await.unwrap()[0].resolved);
    }

    #[tokio::test]
    async fn stale_connection_cannot_mutate() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx_old, _rx_old) = mpsc::channel(32);
        let (tx_new, _rx_new) = mpsc::channel(32);
        let old = reg.join(&id, "u1", tx_old, JoinPolicy::Existing).await.unwrap();
        let new = reg.join(&id, "u1", tx_new, JoinPolicy::Existing).await.unwrap();

        let stale = reg.apply_connection_event(&id, old.conn_id, "u1", change("stale")).await;
        assert!(matches!(stale, Err(ColabError::Forbidden(_))));
        let fresh = reg.apply_connection_event(&id, new.conn_id, "u1", change("fresh")).await.unwrap();
        assert!(matches!(fresh, EventOutcome::Updated(ref u) if u.version == 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_changes_get_gap_free_versions_in_one_order() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx_obs, mut rx_obs) = mpsc::channel(256);
        reg.join(&id, "observer", tx_obs, JoinPolicy::Existing).await.unwrap();

        let mut tasks = Vec::new();
        for writer in 0..8 {
            let reg = reg.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..10 {
                    let event = change(&format!("writer {} edit {}", writer, n));
                    reg.apply_event(&id, &format!("w{}", writer), event).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let versions: Vec<u64> = reg.versions(&id).await.unwrap().iter().map(|v| v.version).collect();
        assert_eq!(versions, (1..=81).collect::<Vec<u64>>());

        let seen: Vec<u64> = drain(&mut rx_obs)
            .into_iter()
            .filter_map(|m| match m.event {
                ServerEvent::ContentChange(c) => Some(c.version),
                _ => None,
            })
            .collect();
        assert_eq!(seen, (2..=81).collect::<Vec<u64>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn late_joiner_sees_exactly_the_changes_after_its_snapshot() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let (tx_early, mut rx_early) = mpsc::channel(512);
        reg.join(&id, "early", tx_early, JoinPolicy::Existing).await.unwrap();

        let mut tasks = Vec::new();
        for writer in 0..4 {
            let reg = reg.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..50 {
                    let event = change(&format!("writer {} edit {}", writer, n));
                    reg.apply_event(&id, &format!("w{}", writer), event).await.unwrap();
                    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                }
            }));
        }

        while reg.get(&id).await.unwrap().version < 20 {
            tokio::task::yield_now().await;
        }
        let (tx_late, mut rx_late) = mpsc::channel(512);
        let joined = reg.join(&id, "late", tx_late, JoinPolicy::Existing).await.unwrap();

        for task in tasks {
            task.await.unwrap();
        }

        let changes = |msgs: Vec<OutboundMessage>| -> Vec<(u64, String)> {
            msgs.into_iter()
                .filter_map(|m| match m.event {
                    ServerEvent::ContentChange(c) => Some((c.version, c.content)),
                    _ => None,
                })
                .collect()
        };
        let late_msgs = drain(&mut rx_late);
        assert!(matches!(&late_msgs[0].event, ServerEvent::Snapshot(s) if *s == joined.snapshot));
        let late = changes(late_msgs);
        let early = changes(drain(&mut rx_early));

        let late_versions: Vec<u64> = late.iter().map(|(v, _)| *v).collect();
        assert_eq!(late_versions, (joined.snapshot.version + 1..=201).collect::<Vec<u64>>());
        let early_versions: Vec<u64> = early.iter().map(|(v, _)| *v).collect();
        assert_eq!(early_versions, (2..=201).collect::<Vec<u64>>());

        // Both observers saw one ordering, matching the committed history.
        let history = reg.versions(&id).await.unwrap();
        assert_eq!(history[(joined.snapshot.version - 1) as usize].content, joined.snapshot.content);
        let tail: Vec<(u64, String)> = early
            .into_iter()
            .filter(|(v, _)| *v > joined.snapshot.version)
            .collect();
        assert_eq!(late, tail);
        for (version, content) in &late {
            assert_eq!(&history[(*version - 1) as usize].content, content);
        }
    }

    #[tokio::test]
    async fn comment_add_event_defaults_username() {
        let reg = registry();
        let id = reg.create("Demo", "text", "u1").await.id;
        let event = ClientEvent::CommentAdd(CommentAddMessage {
            line: 4,
            text: "why?".to_string(),
            username: None,
        });
        let EventOutcome::Commented(comment) = reg.apply_event(&id, "u9", event).await.unwrap() else {
            panic!("expected a comment");
        };
        assert_eq!(comment.username, "u9");
        assert_eq!(comment.line, 4);
    }
}
