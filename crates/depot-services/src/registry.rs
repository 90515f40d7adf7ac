//! Session registry — who connected, from where, and when.
//!
//! Records are keyed by the client's display name and kept in insertion
//! order. Names recycle: a client occupying a freed slot announces the same
//! derived name as its predecessor, and the new session overwrites the old
//! record in place. Records are never deleted, only stamped disconnected.

use std::net::SocketAddr;

use chrono::{DateTime, Local};

use depot_core::wire;

/// One session's metadata, as rendered by the `status` command.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub name: String,
    pub addr: SocketAddr,
    pub connected_at: DateTime<Local>,
    /// Absent while the session is live.
    pub disconnected_at: Option<DateTime<Local>>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<SessionRecord>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, overwriting any prior record of the same name.
    /// Returns the connection timestamp.
    pub fn upsert(&mut self, name: &str, addr: SocketAddr) -> DateTime<Local> {
        let connected_at = Local::now();
        let record = SessionRecord {
            name: name.to_string(),
            addr,
            connected_at,
            disconnected_at: None,
        };
        match self.sessions.iter_mut().find(|s| s.name == name) {
            Some(existing) => *existing = record,
            None => self.sessions.push(record),
        }
        connected_at
    }

    /// Stamp the disconnection time. A name that was never registered is a
    /// no-op (the peer vanished before announcing itself).
    pub fn mark_disconnected(&mut self, name: &str) {
        if let Some(record) = self.sessions.iter_mut().find(|s| s.name == name) {
            record.disconnected_at = Some(Local::now());
        }
    }

    /// Point-in-time copy of every record, insertion order.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        self.sessions.clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Render a snapshot as the `status` reply text.
pub fn render_status(records: &[SessionRecord]) -> String {
    let mut status = format!("{}\n", wire::STATUS_HEADER);
    for record in records {
        status.push_str(&format!("\nClient: {}\n", record.name));
        status.push_str(&format!("Address: {}\n", record.addr));
        status.push_str(&format!("Connected: {}\n", fmt_time(&record.connected_at)));
        status.push_str(&format!(
            "Disconnected: {}\n",
            match &record.disconnected_at {
                Some(t) => fmt_time(t),
                None => "Still connected".to_string(),
            }
        ));
    }
    status
}

fn fmt_time(t: &DateTime<Local>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
