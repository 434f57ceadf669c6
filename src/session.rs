//! Per-browser session state: login status and chat history.
//!
//! Sessions idle for longer than the store's timeout are dropped, either when
//! next looked up or on the next `create`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{Gatekeeper, LoginOutcome, LoginState};
use crate::bot::Exchange;
use crate::constants::SESSION_IDLE_TIMEOUT;

#[derive(Debug)]
pub struct Session {
    pub login: LoginState,
    pub history: Vec<Exchange>,
    last_seen: Instant,
    turn: Arc<Mutex<()>>,
}

impl Session {
    fn new() -> Self {
        Self {
            login: LoginState::default(),
            history: Vec::new(),
            last_seen: Instant::now(),
            turn: Arc::new(Mutex::new(())),
        }
    }

    fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.duration_since(self.last_seen) >= idle_timeout
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.idle_timeout));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "Dropped idle sessions");
        }

        sessions.insert(id, Session::new());
        debug!(session = %id, "Session created");
        id
    }

    /// `None` when the session id is unknown.
    pub async fn login(
        &self,
        id: Uuid,
        gatekeeper: &Gatekeeper,
        username: &str,
        password: &str,
    ) -> Option<LoginOutcome> {
        let mut sessions = self.sessions.lock().await;
        let session = live(&mut sessions, id, self.idle_timeout)?;
        Some(gatekeeper.login(&mut session.login, username, password))
    }

    pub async fn login_state(&self, id: Uuid) -> Option<LoginState> {
        let mut sessions = self.sessions.lock().await;
        live(&mut sessions, id, self.idle_timeout).map(|s| s.login)
    }

    pub async fn history(&self, id: Uuid) -> Option<Vec<Exchange>> {
        let mut sessions = self.sessions.lock().await;
        live(&mut sessions, id, self.idle_timeout).map(|s| s.history.clone())
    }

    /// Waits until no other chat turn is running in this session. Hold the
    /// guard from the history snapshot until the exchange is recorded.
    pub async fn begin_turn(&self, id: Uuid) -> Option<OwnedMutexGuard<()>> {
        let turn = {
            let mut sessions = self.sessions.lock().await;
            live(&mut sessions, id, self.idle_timeout)?.turn.clone()
        };
        Some(turn.lock_owned().await)
    }

    /// Appends an exchange and returns the updated history.
    pub async fn record(&self, id: Uuid, exchange: Exchange) -> Option<Vec<Exchange>> {
        let mut sessions = self.sessions.lock().await;
        let session = live(&mut sessions, id, self.idle_timeout)?;
        session.history.push(exchange);
        Some(session.history.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Looks up a session and marks it as seen; an idle one is removed instead.
fn live(
    sessions: &mut HashMap<Uuid, Session>,
    id: Uuid,
    idle_timeout: Duration,
) -> Option<&mut Session> {
    let now = Instant::now();
    if sessions.get(&id)?.is_expired(now, idle_timeout) {
        sessions.remove(&id);
        debug!(session = %id, "Session expired");
        return None;
    }
    let session = sessions.get_mut(&id)?;
    session.last_seen = now;
    Some(session)
}
