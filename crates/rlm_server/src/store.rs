//! In-memory document store: id → extracted text. Ingestion and text
//! extraction happen upstream; this map is their interface boundary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// One stored document (extracted text only).
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
}

/// Process-wide document map, shared by all sessions.
#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: RwLock<HashMap<String, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document stored under `id`.
    pub fn insert(&self, id: impl Into<String>, text: impl Into<String>) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(id.into(), Document { text: text.into() });
    }

    /// Look up a document by id.
    pub fn get(&self, id: &str) -> Option<Document> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed the store from the `.md` and `.txt` files of `dir`; the file
    /// stem becomes the document id. Returns how many documents were loaded.
    pub fn load_dir(&self, dir: &Path) -> std::io::Result<usize> {
        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_doc = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            );
            if !path.is_file() || !is_doc {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path)?;
            self.insert(stem, text);
            loaded += 1;
        }
        tracing::info!(dir = %dir.display(), loaded, "seeded document store");
        Ok(loaded)
    }
}
