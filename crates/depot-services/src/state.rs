//! Shared server state — slot table and session registry under one lock.
//!
//! Both structures mutate together (a slot release and its registry stamp
//! must never be observed half-done), so one mutex guards the pair. Every
//! critical section is a handful of instructions and is never held across
//! network I/O: a stalled client cannot block admission or status queries.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};

use crate::registry::{self, SessionRecord, SessionRegistry};
use crate::slot::SlotTable;

/// Returned by [`ServerState::try_acquire`] when every slot is occupied.
/// The caller must reject the connection.
#[derive(Debug, thiserror::Error)]
#[error("no free connection slots")]
pub struct ServerFull;

struct StateInner {
    slots: SlotTable,
    sessions: SessionRegistry,
}

/// Process-wide shared state. Lives from startup to shutdown; process exit
/// reclaims everything.
pub struct ServerState {
    inner: Mutex<StateInner>,
}

impl ServerState {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(StateInner {
                slots: SlotTable::new(capacity),
                sessions: SessionRegistry::new(),
            }),
        })
    }

    // A handler that panicked mid-update poisons the lock; recover the guard
    // so one crashed connection cannot wedge admission for the others.
    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.lock().slots.capacity()
    }

    pub fn occupied(&self) -> usize {
        self.lock().slots.occupied()
    }

    /// Atomically claim a free slot. Non-blocking: a full table reports
    /// [`ServerFull`] immediately.
    pub fn try_acquire(self: &Arc<Self>) -> Result<SlotHandle, ServerFull> {
        let index = self.lock().slots.acquire().ok_or(ServerFull)?;
        Ok(SlotHandle {
            state: Arc::clone(self),
            index,
        })
    }

    /// Register a session, overwriting any prior record of the same name.
    pub fn upsert_session(&self, name: &str, addr: SocketAddr) -> DateTime<Local> {
        self.lock().sessions.upsert(name, addr)
    }

    pub fn mark_disconnected(&self, name: &str) {
        self.lock().sessions.mark_disconnected(name);
    }

    /// Consistent point-in-time view of every session, insertion order.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        self.lock().sessions.snapshot()
    }

    /// The `status` reply text for the current snapshot.
    pub fn render_status(&self) -> String {
        registry::render_status(&self.snapshot())
    }
}

/// Exclusive claim on one slot, owned by a single connection handler.
///
/// `release` consumes the handle, so a double release is unrepresentable.
pub struct SlotHandle {
    state: Arc<ServerState>,
    index: usize,
}

impl SlotHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based slot number, as sent to the peer on connect.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Reserved → Active, once the peer has declared its name.
    pub fn mark_active(&self) {
        self.state.lock().slots.mark_active(self.index);
    }

    /// Return the slot to the pool.
    pub fn release(self) {
        let mut inner = self.state.lock();
        inner.slots.release(self.index);
        tracing::debug!(
            slot = self.number(),
            occupied = inner.slots.occupied(),
            "slot released"
        );
    }
}
