use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::auth;
use crate::config::Config;
use crate::error::{ColabError, ColabResult};
use crate::models::{
    Comment, OutboundMessage, ServerEvent, SessionClosedMessage, SessionKind, SessionSummary,
    SessionView, UserLeftMessage, VersionRecord,
};
use crate::services::document::DocumentStore;
use crate::ws::hub::UserSlot;
use crate::ws::room::{Room, RoomState};

const ROOM_LANGUAGE: &str = "python";

/// Counts reported by the diagnostics endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub sessions: usize,
    pub documents: usize,
    pub rooms: usize,
    pub connections: usize,
    pub users: usize,
}

/// Owns every live session and the user -> connection index.
///
/// Built once at startup and shared through `AppState`. The `rooms` map and a
/// room's state are never held at the same time; `users` is a short sync lock
/// that may be taken while a room is held, never the other way around.
#[derive(Debug)]
pub struct SessionRegistry {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
    pub(crate) users: Mutex<HashMap<String, UserSlot>>,
    next_seq: AtomicU64,
    next_conn: AtomicU64,
    placeholder_content: String,
    prune_empty_rooms: bool,
}

impl SessionRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            next_conn: AtomicU64::new(1),
            placeholder_content: config.placeholder_content.clone(),
            prune_empty_rooms: config.prune_empty_rooms,
        }
    }

    /// Create a durable document session seeded with the placeholder content.
    pub async fn create(&self, title: &str, language: &str, creator_id: &str) -> SessionView {
        let id = Uuid::new_v4().to_string();
        let doc = DocumentStore::new(&id, title, language, creator_id, &self.placeholder_content);
        let room = Arc::new(Room::new(self.next_seq(), SessionKind::Document, doc));
        let view = room.state.lock().await.view();
        self.rooms.write().await.insert(id.clone(), room);
        info!(session_id = %id, creator_id, title, "document session created");
        view
    }

    pub async fn get(&self, session_id: &str) -> ColabResult<SessionView> {
        self.read(session_id, |state| state.view()).await
    }

    /// Summaries of all sessions, oldest first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let rooms: Vec<Arc<Room>> = self.rooms.read().await.values().cloned().collect();
        let mut summaries: Vec<(u64, SessionSummary)> = Vec::with_capacity(rooms.len());
        for room in rooms {
            let state = room.state.lock().await;
            if !state.is_closed() {
                summaries.push((room.seq, state.summary()));
            }
        }
        summaries.sort_by_key(|(seq, _)| *seq);
        summaries.into_iter().map(|(_, s)| s).collect()
    }

    /// View and comments read under one lock, so both reflect the same commit.
    pub async fn detail(&self, session_id: &str) -> ColabResult<(SessionView, Vec<Comment>)> {
        self.read(session_id, |state| (state.view(), state.comments.list().to_vec())).await
    }

    pub async fn versions(&self, session_id: &str) -> ColabResult<Vec<VersionRecord>> {
        self.read(session_id, |state| state.doc.versions().to_vec()).await
    }

    pub async fn comments(&self, session_id: &str) -> ColabResult<Vec<Comment>> {
        self.read(session_id, |state| state.comments.list().to_vec()).await
    }

    /// Remove a session and evict its connections. Returns how many were evicted.
    pub async fn delete(&self, session_id: &str, requester_id: &str) -> ColabResult<usize> {
        let room = self.room(session_id).await?;
        let mut state = room.state.lock().await;
        if state.is_closed() {
            return Err(ColabError::session_not_found(session_id));
        }
        auth::ensure_creator(&state.doc.created_by, requester_id)?;

        let conns = state.close();
        let notice = OutboundMessage::system(ServerEvent::SessionDeleted(SessionClosedMessage {
            session_id: session_id.to_string(),
        }));
        for conn in &conns {
            if let Err(e) = conn.try_deliver(notice.clone()) {
                warn!(session_id, conn_id = conn.id, "could not notify evicted connection: {}", e);
            }
            self.release_slot(&conn.user_id, conn.id);
        }
        let evicted = conns.len();
        // Dropping the senders lets each writer drain the notice and close its socket.
        drop(conns);
        drop(state);

        self.unlink(&room).await;
        info!(session_id, requester_id, evicted, "session deleted");
        Ok(evicted)
    }

    /// Close every session and connection. Used on shutdown.
    pub async fn shutdown(&self) {
        let rooms: Vec<Arc<Room>> = self.rooms.write().await.drain().map(|(_, r)| r).collect();
        for room in rooms {
            let conns = room.state.lock().await.close();
            for conn in conns {
                self.release_slot(&conn.user_id, conn.id);
            }
        }
        info!("session registry shut down");
    }

    pub async fn stats(&self) -> RegistryStats {
        let rooms: Vec<Arc<Room>> = self.rooms.read().await.values().cloned().collect();
        let mut stats = RegistryStats::default();
        for room in rooms {
            let state = room.state.lock().await;
            if state.is_closed() {
                continue;
            }
            stats.sessions += 1;
            match state.kind {
                SessionKind::Document => stats.documents += 1,
                SessionKind::Room => stats.rooms += 1,
            }
            stats.connections += state.connection_count();
        }
        stats.users = self.lock_users().len();
        stats
    }

    pub(crate) async fn room(&self, session_id: &str) -> ColabResult<Arc<Room>> {
        self.lookup(session_id)
            .await
            .ok_or_else(|| ColabError::session_not_found(session_id))
    }

    pub(crate) async fn lookup(&self, session_id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(session_id).cloned()
    }

    /// Existing session, or a fresh ephemeral room owned by `creator_id`.
    pub(crate) async fn room_or_create(&self, session_id: &str, creator_id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get(session_id) {
            return room.clone();
        }
        let doc = DocumentStore::new(session_id, session_id, ROOM_LANGUAGE, creator_id, "");
        let room = Arc::new(Room::new(self.next_seq(), SessionKind::Room, doc));
        rooms.insert(session_id.to_string(), room.clone());
        info!(session_id, creator_id, "ephemeral room created");
        room
    }

    /// Drop `room` from the map unless it has already been replaced.
    pub(crate) async fn unlink(&self, room: &Arc<Room>) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(&room.id).is_some_and(|r| Arc::ptr_eq(r, room)) {
            rooms.remove(&room.id);
            info!(session_id = %room.id, "session removed from registry");
        }
    }

    async fn read<T>(&self, session_id: &str, f: impl FnOnce(&RoomState) -> T) -> ColabResult<T> {
        let room = self.room(session_id).await?;
        let state = room.state.lock().await;
        if state.is_closed() {
            return Err(ColabError::session_not_found(session_id));
        }
        Ok(f(&state))
    }

    /// Run one mutation under the session's lock, then fan out its event.
    ///
    /// A panic inside `op` is reported as `Internal`; the event is dropped and the
    /// session keeps serving later events.
    pub(crate) async fn mutate<T, F>(&self, session_id: &str, exclude_user: Option<&str>, op: F) -> ColabResult<T>
    where
        F: FnOnce(&mut RoomState) -> ColabResult<(T, Option<OutboundMessage>)>,
    {
        let room = self.room(session_id).await?;
        let mut state = room.state.lock().await;
        if state.is_closed() {
            return Err(ColabError::session_not_found(session_id));
        }

        let (value, msg) = match catch_unwind(AssertUnwindSafe(|| op(&mut *state))) {
            Ok(result) => result?,
            Err(panic) => {
                let reason = panic_reason(panic.as_ref());
                error!(session_id, %reason, "event processing panicked; event dropped");
                return Err(ColabError::Internal(reason));
            }
        };
        if let Some(msg) = msg {
            self.broadcast_locked(&mut state, msg, exclude_user);
        }

        let prune = self.close_if_idle(&mut state);
        drop(state);
        if prune {
            self.unlink(&room).await;
        }
        Ok(value)
    }

    /// Fan `msg` out, turning every transport failure into an implicit leave.
    pub(crate) fn broadcast_locked(&self, state: &mut RoomState, msg: OutboundMessage, exclude_user: Option<&str>) {
        let mut pending: VecDeque<(OutboundMessage, Option<String>)> = VecDeque::new();
        pending.push_back((msg, exclude_user.map(str::to_string)));

        while let Some((msg, exclude)) = pending.pop_front() {
            for conn in state.fan_out(&msg, exclude.as_deref()) {
                warn!(session_id = %state.doc.id, conn_id = conn.id, user_id = %conn.user_id, "dropping unreachable connection");
                self.release_slot(&conn.user_id, conn.id);
                if !state.has_user(&conn.user_id) {
                    pending.push_back((user_left(state, &conn.user_id), None));
                }
            }
        }
    }

    /// Close an ephemeral room with no connections left. True when the caller must unlink it.
    pub(crate) fn close_if_idle(&self, state: &mut RoomState) -> bool {
        if !self.prune_empty_rooms || state.kind != SessionKind::Room {
            return false;
        }
        if state.is_closed() || state.connection_count() > 0 {
            return false;
        }
        state.close();
        true
    }

    pub(crate) fn lock_users(&self) -> MutexGuard<'_, HashMap<String, UserSlot>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn next_conn_id(&self) -> u64 {
        self.next_conn.fetch_add(1, Ordering::Relaxed)
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

pub(crate) fn user_left(state: &RoomState, user_id: &str) -> OutboundMessage {
    OutboundMessage::new(
        Some(user_id.to_string()),
        ServerEvent::UserLeft(UserLeftMessage {
            user_id: user_id.to_string(),
            remaining_collaborators: state.participants(),
        }),
    )
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
