//! field change notifications
//!
//! a change bus delivers one `FieldChange` per write to every subscriber
//! whose watched paths overlap the written path. subscribers receive on
//! unbounded channels, so emitting never blocks and needs no runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::conditions::FieldPath;

// ============================================================================
// Change
// ============================================================================

/// what caused a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// a single value was written
    Set,
    /// a value was removed (e.g. an unregistered field)
    Removed,
    /// the whole value tree was replaced
    Reset,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Set => "set",
            ChangeKind::Removed => "removed",
            ChangeKind::Reset => "reset",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// a single change notification
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub kind: ChangeKind,
    /// written path; `None` for resets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<FieldPath>,
    /// timestamp (ISO 8601)
    pub ts: DateTime<Utc>,
}

impl FieldChange {
    pub fn set(path: FieldPath) -> Self {
        Self {
            kind: ChangeKind::Set,
            path: Some(path),
            ts: Utc::now(),
        }
    }

    pub fn removed(path: FieldPath) -> Self {
        Self {
            kind: ChangeKind::Removed,
            path: Some(path),
            ts: Utc::now(),
        }
    }

    pub fn reset() -> Self {
        Self {
            kind: ChangeKind::Reset,
            path: None,
            ts: Utc::now(),
        }
    }

    /// check if this change can affect the value read at any of `paths`
    pub fn affects(&self, paths: &[FieldPath]) -> bool {
        match &self.path {
            None => !paths.is_empty(),
            Some(changed) => paths.iter().any(|p| p.overlaps(changed)),
        }
    }
}

// ============================================================================
// Subscriber
// ============================================================================

struct Subscriber {
    /// watched paths (empty = nothing)
    paths: Vec<FieldPath>,
    sender: mpsc::UnboundedSender<FieldChange>,
}

// ============================================================================
// ChangeBus
// ============================================================================

/// manages change subscribers and broadcasts field changes
pub struct ChangeBus {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// subscribe to changes of `paths`
    /// returns (subscription_id, receiver)
    pub fn subscribe(
        &self,
        paths: Vec<FieldPath>,
    ) -> (u64, mpsc::UnboundedReceiver<FieldChange>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = mpsc::unbounded_channel();

        if let Ok(mut subs) = self.subscribers.write() {
            subs.insert(id, Subscriber { paths, sender });
        }

        (id, receiver)
    }

    pub fn unsubscribe(&self, id: u64) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.remove(&id);
        }
    }

    /// send a change to every subscriber it affects
    /// returns the number of subscribers notified
    pub fn emit(&self, change: FieldChange) -> usize {
        let mut delivered = 0;
        if let Ok(subs) = self.subscribers.read() {
            for subscriber in subs.values() {
                if change.affects(&subscriber.paths) {
                    // ignore send errors (receiver dropped before unsubscribing)
                    if subscriber.sender.send(change.clone()).is_ok() {
                        delivered += 1;
                    }
                }
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
