//! Progress persistence: the set of completed levels, stored as JSON.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Default, Serialize, Deserialize)]
struct SaveDoc {
    complete: BTreeSet<String>,
}

/// Completed-level record. Writes through to disk on every mark so a crash
/// never loses progress; a missing or corrupt file just starts empty.
pub struct SaveState {
    path: Option<PathBuf>,
    complete: BTreeSet<String>,
}

impl SaveState {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let complete = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<SaveDoc>(&text) {
                Ok(doc) => doc.complete,
                Err(err) => {
                    warn!(path = %path.display(), %err, "save file corrupt, starting fresh");
                    BTreeSet::new()
                }
            },
            Err(_) => BTreeSet::new(),
        };
        Self {
            path: Some(path),
            complete,
        }
    }

    /// A save that never touches disk; tests and one-off sessions.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            complete: BTreeSet::new(),
        }
    }

    pub fn is_complete(&self, level: &str) -> bool {
        self.complete.contains(level)
    }

    pub fn mark_complete(&mut self, level: &str) {
        if self.complete.insert(level.to_string()) {
            self.store();
        }
    }

    fn store(&self) {
        let Some(path) = &self.path else { return };
        let doc = SaveDoc {
            complete: self.complete.clone(),
        };
        let text = match serde_json::to_string_pretty(&doc) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "could not serialize save state");
                return;
            }
        };
        if let Err(err) = fs::write(path, text) {
            warn!(path = %path.display(), %err, "could not write save state");
        }
    }
}
