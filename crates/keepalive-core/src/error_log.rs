//! Error log — terminal probe failures accumulated between digests.
//!
//! The log is a cheap cloneable handle. The sweep task appends to it and
//! the digest task drains it; both go through the same mutex, so a drain
//! never loses or duplicates an entry appended concurrently.

use std::sync::Arc;

use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure description, preserving insertion order.
    pub async fn append(&self, entry: impl Into<String>) {
        self.entries.lock().await.push(entry.into());
    }

    /// Take every accumulated entry and leave the log empty.
    pub async fn drain_all(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
