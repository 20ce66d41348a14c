//! Process-wide session table.
//!
//! Each entry is owned by exactly one scheduling loop, which is the only
//! writer of the session value. The cancellation flag is the single field
//! any caller may set: an `AtomicBool` that only ever goes false → true.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use negolab_core::TournamentConfig;

use crate::session::{SessionId, TournamentSession};

/// Shared handle to one session.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    cancel: AtomicBool,
    /// Set once a scheduling loop has claimed the session.
    claimed: AtomicBool,
    state: RwLock<TournamentSession>,
}

impl SessionHandle {
    fn new(id: SessionId, config: TournamentConfig) -> Self {
        Self {
            cancel: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
            state: RwLock::new(TournamentSession::new(id.clone(), config)),
            id,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Request cooperative cancellation. Idempotent.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Consistent copy of the current session state.
    pub fn snapshot(&self) -> TournamentSession {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Claim the right to drive this session. Succeeds once.
    pub(crate) fn claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mutate the session. Only the owning scheduling loop calls this.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut TournamentSession) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<SessionHandle>>>,
    /// Creation order, for stable listing.
    order: Mutex<Vec<SessionId>>,
    next_seq: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new PENDING session for `config`.
    pub fn create(&self, config: TournamentConfig) -> Arc<SessionHandle> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let fingerprint = config.fingerprint();
        let short = &fingerprint[..fingerprint.len().min(12)];
        let id = SessionId(format!("tournament-{seq}-{short}"));
        let handle = Arc::new(SessionHandle::new(id.clone(), config));

        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), handle.clone());
        self.order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
        handle
    }

    pub fn handle(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn get(&self, id: &SessionId) -> Option<TournamentSession> {
        self.handle(id).map(|h| h.snapshot())
    }

    /// Set the session's cancellation flag. `false` if the id is unknown.
    pub fn cancel(&self, id: &SessionId) -> bool {
        match self.handle(id) {
            Some(h) => {
                h.request_cancel();
                true
            }
            None => false,
        }
    }

    /// Snapshots of every session, oldest first.
    pub fn list(&self) -> Vec<TournamentSession> {
        let ids = self.order.lock().unwrap_or_else(PoisonError::into_inner).clone();
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Drop a session from the table. Running loops keep their own handle.
    pub fn evict(&self, id: &SessionId) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            self.order
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|x| x != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
