use std::sync::Arc;

use shared::domain::StanzaEntry;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// In-memory, append-only poem. Cloning yields another handle to the same
/// sequence, so one store built at startup is shared by every handler.
#[derive(Clone, Default)]
pub struct PoemStore {
    entries: Arc<RwLock<Vec<StanzaEntry>>>,
}

impl PoemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<StanzaEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Snapshot of the whole poem in narrative order.
    pub async fn get(&self) -> Vec<StanzaEntry> {
        self.entries.read().await.clone()
    }

    pub async fn append(&self, entry: StanzaEntry) -> usize {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        let len = entries.len();
        debug!(len, "stanza appended");
        len
    }

    /// Empties the poem and returns how many entries were dropped.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        info!(removed, "poem cleared");
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stanza_texts(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.stanza.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
