use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::error::{ColabError, ColabResult};
use crate::models::{OutboundMessage, SessionKind, SessionSummary, SessionView, Snapshot};
use crate::services::{comments::CommentThread, document::DocumentStore};

pub type ConnId = u64;

/// Outbound half of a live client connection.
///
/// Delivery never waits on the socket: messages go into a bounded queue that a
/// writer task drains. A full or closed queue is a transport failure.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnId,
    pub user_id: String,
    tx: mpsc::Sender<OutboundMessage>,
}

impl Connection {
    pub fn new(id: ConnId, user_id: &str, tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            tx,
        }
    }

    pub fn try_deliver(&self, msg: OutboundMessage) -> ColabResult<()> {
        self.tx
            .try_send(msg)
            .map_err(|_| ColabError::TransportFailure(self.id))
    }
}

/// Everything guarded by a session's lock.
#[derive(Debug)]
pub struct RoomState {
    pub kind: SessionKind,
    pub doc: DocumentStore,
    pub comments: CommentThread,
    conns: Vec<Connection>,
    closed: bool,
}

impl RoomState {
    pub fn new(kind: SessionKind, doc: DocumentStore) -> Self {
        let comments = CommentThread::new(&doc.id);
        Self {
            kind,
            doc,
            comments,
            conns: Vec::new(),
            closed: false,
        }
    }

    /// A closed room has been deleted or pruned and must not be touched again.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) -> Vec<Connection> {
        self.closed = true;
        std::mem::take(&mut self.conns)
    }

    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }

    pub fn has_connection(&self, conn_id: ConnId) -> bool {
        self.conns.iter().any(|c| c.id == conn_id)
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.conns.iter().any(|c| c.user_id == user_id)
    }

    /// Live users, in join order.
    pub fn participants(&self) -> Vec<String> {
        let mut users: Vec<String> = Vec::with_capacity(self.conns.len());
        for conn in &self.conns {
            if !users.contains(&conn.user_id) {
                users.push(conn.user_id.clone());
            }
        }
        users
    }

    pub fn attach(&mut self, conn: Connection) {
        self.conns.push(conn);
    }

    pub fn detach(&mut self, conn_id: ConnId) -> Option<Connection> {
        let idx = self.conns.iter().position(|c| c.id == conn_id)?;
        Some(self.conns.remove(idx))
    }

    /// Deliver `msg` to a single connection.
    pub fn deliver_to(&self, conn_id: ConnId, msg: OutboundMessage) -> ColabResult<()> {
        match self.conns.iter().find(|c| c.id == conn_id) {
            Some(conn) => conn.try_deliver(msg),
            None => Err(ColabError::TransportFailure(conn_id)),
        }
    }

    /// Deliver `msg` to every connection except those of `exclude_user`.
    ///
    /// Connections that fail are removed after the loop and returned.
    pub fn fan_out(&mut self, msg: &OutboundMessage, exclude_user: Option<&str>) -> Vec<Connection> {
        let mut failed: Vec<ConnId> = Vec::new();
        for conn in self.conns.iter() {
            if exclude_user == Some(conn.user_id.as_str()) {
                continue;
            }
            if let Err(e) = conn.try_deliver(msg.clone()) {
                debug!(doc_id = %self.doc.id, conn_id = conn.id, user_id = %conn.user_id, "{}", e);
                failed.push(conn.id);
            }
        }
        failed
            .into_iter()
            .filter_map(|id| self.detach(id))
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_id: self.doc.id.clone(),
            title: self.doc.title.clone(),
            language: self.doc.language.clone(),
            content: self.doc.content().to_string(),
            version: self.doc.version(),
            collaborators: self.doc.collaborators().to_vec(),
            participants: self.participants(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.doc.id.clone(),
            kind: self.kind,
            title: self.doc.title.clone(),
            language: self.doc.language.clone(),
            created_by: self.doc.created_by.clone(),
            created_at: self.doc.created_at,
            updated_at: self.doc.updated_at,
            content: self.doc.content().to_string(),
            version: self.doc.version(),
            collaborators: self.doc.collaborators().to_vec(),
            participants: self.participants(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.doc.id.clone(),
            kind: self.kind,
            title: self.doc.title.clone(),
            language: self.doc.language.clone(),
            created_by: self.doc.created_by.clone(),
            created_at: self.doc.created_at,
            updated_at: self.doc.updated_at,
            version: self.doc.version(),
            collaborators_count: self.doc.collaborators().len(),
            participants_count: self.participants().len(),
        }
    }
}

/// One session: the single authority through which all of its mutations pass.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub(crate) seq: u64,
    pub(crate) state: Mutex<RoomState>,
}

impl Room {
    pub fn new(seq: u64, kind: SessionKind, doc: DocumentStore) -> Self {
        Self {
            id: doc.id.clone(),
            seq,
            state: Mutex::new(RoomState::new(kind, doc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PongMessage, ServerEvent};

    fn state() -> RoomState {
        RoomState::new(
            SessionKind::Document,
            DocumentStore::new("d1", "Demo", "text", "u1", ""),
        )
    }

    fn pong() -> OutboundMessage {
        OutboundMessage::system(ServerEvent::Pong(PongMessage { date: "now".to_string() }))
    }

    #[test]
    fn fan_out_skips_excluded_user() {
        let mut s = state();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        s.attach(Connection::new(1, "u1", tx1));
        s.attach(Connection::new(2, "u2", tx2));

        let dropped = s.fan_out(&pong(), Some("u1"));
        assert!(dropped.is_empty());
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), pong());
    }

    #[test]
    fn fan_out_prunes_dead_and_full_queues_after_delivering_to_the_rest() {
        let mut s = state();
        let (dead_tx, dead_rx) = mpsc::channel(4);
        drop(dead_rx);
        let (full_tx, _full_rx) = mpsc::channel(1);
        full_tx.try_send(pong()).unwrap();
        let (ok_tx, mut ok_rx) = mpsc::channel(4);
        s.attach(Connection::new(1, "dead", dead_tx));
        s.attach(Connection::new(2, "slow", full_tx));
        s.attach(Connection::new(3, "ok", ok_tx));

        let dropped = s.fan_out(&pong(), None);
        let ids: Vec<ConnId> = dropped.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(s.participants(), vec!["ok".to_string()]);
        assert_eq!(ok_rx.try_recv().unwrap(), pong());
    }

    #[test]
    fn close_takes_all_connections() {
        let mut s = state();
        let (tx, _rx) = mpsc::channel(1);
        s.attach(Connection::new(1, "u1", tx));
        assert_eq!(s.close().len(), 1);
        assert!(s.is_closed());
        assert_eq!(s.connection_count(), 0);
    }
}
