use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use tracing::{debug, info};
use uuid::Uuid;

use super::message::Message;
use crate::utils::config::AppConfig;

const MAX_SESSION_ID_LEN: usize = 128;

/// Per-session chat history kept in process memory.
///
/// Sessions idle for longer than `ttl` are dropped and each session keeps at most
/// `max_messages` messages, oldest first out.
#[derive(Clone)]
pub struct ConversationMemory {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
    max_messages: usize,
}

#[derive(Clone)]
struct SessionEntry {
    messages: Vec<Message>,
    last_seen: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.last_seen) > ttl
    }
}

impl ConversationMemory {
    /// `max_messages` is rounded down to whole question/answer pairs.
    pub fn new(ttl: Duration, max_messages: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_messages: (max_messages.max(2) / 2) * 2,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_secs(config.session_ttl_secs),
            config.session_max_messages,
        )
    }

    /// Returns the id to use for this request, opening a session when needed.
    ///
    /// A usable client id is kept even when unknown (e.g. after a restart); a
    /// missing or malformed one gets a fresh id.
    pub async fn open_session(&self, requested: Option<&str>) -> String {
        let session_id = requested
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_SESSION_ID_LEN)
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.clone())
            .or_insert_with(SessionEntry::new);
        if entry.is_expired(self.ttl, now) {
            debug!(%session_id, "session expired; starting over");
            *entry = SessionEntry::new();
        }
        entry.last_seen = now;

        session_id
    }

    /// Snapshot of the session's messages, oldest first.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|entry| !entry.is_expired(self.ttl, Instant::now()))
            .map(|entry| entry.messages.clone())
            .unwrap_or_default()
    }

    /// Records one question/answer exchange.
    pub async fn append_turn(&self, session_id: &str, question: &str, answer: &str) {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.to_owned())
            .or_insert_with(SessionEntry::new);

        entry.messages.push(Message::user(question));
        entry.messages.push(Message::ai(answer));
        if entry.messages.len() > self.max_messages {
            let overflow = entry.messages.len().saturating_sub(self.max_messages);
            entry.messages.drain(..overflow);
        }
        entry.last_seen = Instant::now();
    }

    /// Drops idle sessions and returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.ttl, now));
        before.saturating_sub(sessions.len())
    }

    /// Runs `evict_expired` every `every` until the handle is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let memory = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = memory.evict_expired().await;
                if evicted > 0 {
                    info!(evicted, "evicted idle chat sessions");
                }
            }
        })
    }
}
