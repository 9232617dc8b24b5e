use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{ColabError, ColabResult};
use crate::models::{OutboundMessage, ServerEvent, SessionClosedMessage, Snapshot, UserJoinedMessage};
use crate::ws::registry::{user_left, SessionRegistry};
use crate::ws::room::{ConnId, Connection};

/// What to do when a client joins an id that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Fail with `NotFound`; used for document sessions.
    Existing,
    /// Create an ephemeral room owned by the joining user.
    CreateRoom,
}

/// The single live connection a user may hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSlot {
    pub session_id: String,
    pub conn_id: ConnId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub conn_id: ConnId,
    pub snapshot: Snapshot,
}

impl SessionRegistry {
    /// Attach a connection to a session.
    ///
    /// The snapshot is taken and the connection subscribed under the session's
    /// lock, so it sees every mutation committed after the snapshot exactly once.
    /// The snapshot is also queued as the first message on `tx`.
    pub async fn join(
        &self,
        session_id: &str,
        user_id: &str,
        tx: mpsc::Sender<OutboundMessage>,
        policy: JoinPolicy,
    ) -> ColabResult<Joined> {
        loop {
            let room = match policy {
                JoinPolicy::Existing => self.room(session_id).await?,
                JoinPolicy::CreateRoom => self.room_or_create(session_id, user_id).await,
            };

            let conn_id = self.next_conn_id();
            let previous = self.claim_slot(user_id, UserSlot {
                session_id: session_id.to_string(),
                conn_id,
            });
            if let Some(previous) = previous {
                self.evict(previous, user_id, session_id).await;
            }

            let mut state = room.state.lock().await;
            if state.is_closed() {
                drop(state);
                self.release_slot(user_id, conn_id);
                match policy {
                    JoinPolicy::Existing => return Err(ColabError::session_not_found(session_id)),
                    JoinPolicy::CreateRoom => {
                        // Pruned between lookup and lock; start over with a fresh room.
                        self.unlink(&room).await;
                        continue;
                    }
                }
            }
            if !self.holds_slot(user_id, conn_id) {
                return Err(ColabError::Forbidden(format!(
                    "join of '{}' was superseded by a newer connection",
                    user_id
                )));
            }

            state.attach(Connection::new(conn_id, user_id, tx));
            state.doc.add_collaborator(user_id);
            let snapshot = state.snapshot();

            let first = OutboundMessage::system(ServerEvent::Snapshot(snapshot.clone()));
            if let Err(e) = state.deliver_to(conn_id, first) {
                state.detach(conn_id);
                self.release_slot(user_id, conn_id);
                let prune = self.close_if_idle(&mut state);
                drop(state);
                if prune {
                    self.unlink(&room).await;
                }
                return Err(e);
            }

            let joined = OutboundMessage::new(
                Some(user_id.to_string()),
                ServerEvent::UserJoined(UserJoinedMessage {
                    user_id: user_id.to_string(),
                    collaborators: state.doc.collaborators().to_vec(),
                }),
            );
            self.broadcast_locked(&mut state, joined, Some(user_id));
            info!(session_id, user_id, conn_id, version = snapshot.version, "user joined");
            return Ok(Joined { conn_id, snapshot });
        }
    }

    /// Disconnect whatever connection `user_id` currently holds.
    pub async fn leave(&self, user_id: &str) -> bool {
        let slot = self.lock_users().get(user_id).cloned();
        match slot {
            Some(slot) => self.leave_connection(&slot.session_id, slot.conn_id).await,
            None => false,
        }
    }

    /// Remove one connection; a no-op when it was already evicted or pruned.
    pub async fn leave_connection(&self, session_id: &str, conn_id: ConnId) -> bool {
        let room = match self.lookup(session_id).await {
            Some(room) => room,
            None => return false,
        };
        let mut state = room.state.lock().await;
        let conn = match state.detach(conn_id) {
            Some(conn) => conn,
            None => return false,
        };
        self.release_slot(&conn.user_id, conn_id);
        info!(session_id, user_id = %conn.user_id, conn_id, "user left");

        if !state.has_user(&conn.user_id) {
            let msg = user_left(&state, &conn.user_id);
            self.broadcast_locked(&mut state, msg, None);
        }
        let prune = self.close_if_idle(&mut state);
        drop(state);
        if prune {
            self.unlink(&room).await;
        }
        true
    }

    /// Fan a message out to a session, skipping `exclude_user`.
    pub async fn send(&self, session_id: &str, msg: OutboundMessage, exclude_user: Option<&str>) -> ColabResult<()> {
        self.mutate(session_id, exclude_user, |_| Ok(((), Some(msg)))).await
    }

    /// Session the user is currently connected to, if any.
    pub fn active_session(&self, user_id: &str) -> Option<String> {
        self.lock_users().get(user_id).map(|slot| slot.session_id.clone())
    }

    /// Forget the user's slot if it still points at `conn_id`.
    pub(crate) fn release_slot(&self, user_id: &str, conn_id: ConnId) -> bool {
        let mut users = self.lock_users();
        if users.get(user_id).is_some_and(|slot| slot.conn_id == conn_id) {
            users.remove(user_id);
            return true;
        }
        false
    }

    fn claim_slot(&self, user_id: &str, slot: UserSlot) -> Option<UserSlot> {
        self.lock_users().insert(user_id.to_string(), slot)
    }

    fn holds_slot(&self, user_id: &str, conn_id: ConnId) -> bool {
        self.lock_users()
            .get(user_id)
            .is_some_and(|slot| slot.conn_id == conn_id)
    }

    /// Close the user's previous connection after they joined again.
    async fn evict(&self, previous: UserSlot, user_id: &str, joining_session: &str) {
        let room = match self.lookup(&previous.session_id).await {
            Some(room) => room,
            None => return,
        };
        let moved = previous.session_id != joining_session;
        let mut state = room.state.lock().await;
        let conn = match state.detach(previous.conn_id) {
            Some(conn) => conn,
            None => return,
        };
        let notice = OutboundMessage::system(ServerEvent::SessionReplaced(SessionClosedMessage {
            session_id: joining_session.to_string(),
        }));
        if conn.try_deliver(notice).is_err() {
            debug!(conn_id = conn.id, "replaced connection was already gone");
        }
        drop(conn);
        warn!(session_id = %previous.session_id, user_id, conn_id = previous.conn_id, "previous connection replaced");

        if !moved {
            return;
        }
        if !state.has_user(user_id) {
            let msg = user_left(&state, user_id);
            self.broadcast_locked(&mut state, msg, None);
        }
        let prune = self.close_if_idle(&mut state);
        drop(state);
        if prune {
            self.unlink(&room).await;
        }
    }
}
