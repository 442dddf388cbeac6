//! Durable per-learner, per-set progress records.
//!
//! Records are stored as a versioned JSON envelope under a key derived from
//! the learner and set ids. Reading never fails: anything that cannot be
//! understood is treated as "no progress yet".

use crate::db::{KvStore, StoreError};
use crate::logger;
use crate::models::{CardId, CardStats, Progress};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    progress: &'a Progress,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    progress: Progress,
}

/// Storage key for one learner and set. `%` and `:` are percent-encoded in
/// both parts so distinct pairs never share a key.
pub fn progress_key(learner_id: &str, set_id: &str) -> String {
    format!(
        "progress:v{}:{}:{}",
        SCHEMA_VERSION,
        escape_key_part(learner_id),
        escape_key_part(set_id)
    )
}

fn escape_key_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn encode(progress: &Progress) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        progress,
    })?)
}

/// Decodes a stored record; `None` for anything malformed or from another schema version.
pub fn decode(raw: &str) -> Option<Progress> {
    match serde_json::from_str::<Envelope>(raw) {
        Ok(envelope) if envelope.version == SCHEMA_VERSION => Some(envelope.progress),
        Ok(envelope) => {
            logger::warn(&format!(
                "Ignoring progress with unsupported schema version {}",
                envelope.version
            ));
            None
        }
        Err(e) => {
            logger::warn(&format!("Ignoring unreadable progress record: {}", e));
            None
        }
    }
}

pub struct ProgressStore<S: KvStore> {
    backend: S,
}

impl<S: KvStore> ProgressStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    pub fn load(&self, learner_id: &str, set_id: &str) -> Progress {
        let key = progress_key(learner_id, set_id);
        match self.backend.get(&key) {
            Ok(Some(raw)) => decode(&raw).unwrap_or_else(|| Progress::empty(Utc::now())),
            Ok(None) => Progress::empty(Utc::now()),
            Err(e) => {
                logger::error(&format!("Failed to read progress {}: {}", key, e));
                Progress::empty(Utc::now())
            }
        }
    }

    pub fn save(
        &mut self,
        learner_id: &str,
        set_id: &str,
        progress: &Progress,
    ) -> Result<(), StoreError> {
        let raw = encode(progress)?;
        self.backend.set(&progress_key(learner_id, set_id), &raw)
    }

    pub fn reset(&mut self, learner_id: &str, set_id: &str) -> Result<(), StoreError> {
        self.backend.remove(&progress_key(learner_id, set_id))
    }
}

/// Copy of `progress.stats` with a default entry for every id in `card_ids`
/// that has none yet. Existing entries are returned unchanged.
pub fn ensure_stats<'a, I>(progress: &Progress, card_ids: I) -> BTreeMap<CardId, CardStats>
where
    I: IntoIterator<Item = &'a CardId>,
{
    let mut stats = progress.stats.clone();
    for id in card_ids {
        stats.entry(id.clone()).or_default();
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryKv, SqliteKv};
    use std::time::Duration;

    fn sample_progress() -> Progress {
        let mut progress = Progress::empty(Utc::now());
        progress.mark_correct(&CardId::from("a"), Utc::now());
        progress.mark_correct(&CardId::from("a"), Utc::now());
        progress.mark_wrong(&CardId::from("b"), Utc::now());
        progress.record_time(Duration::from_millis(12_345), Utc::now());
        progress
    }

    #[test]
    fn test_load_missing_returns_empty() {
        let store = ProgressStore::new(MemoryKv::new());
        let progress = store.load("alice", "animals");
        assert!(progress.completed.is_empty());
        assert!(progress.stats.is_empty());
        assert!(progress.best_time_ms.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = ProgressStore::new(MemoryKv::new());
        let progress = sample_progress();
        store.save("alice", "animals", &progress).unwrap();

        let loaded = store.load("alice", "animals");
        assert_eq!(loaded, progress);
        // Other learners and sets are independent.
        assert!(store.load("bob", "animals").stats.is_empty());
        assert!(store.load("alice", "plants").stats.is_empty());
    }

    #[test]
    fn test_colons_in_ids_do_not_share_records() {
        let mut store = ProgressStore::new(MemoryKv::new());
        let progress = sample_progress();
        store.save("team:a", "decks", &progress).unwrap();

        assert_ne!(progress_key("team:a", "decks"), progress_key("team", "a:decks"));
        assert!(store.load("team", "a:decks").stats.is_empty());
        assert_eq!(store.load("team:a", "decks"), progress);
    }

    #[test]
    fn test_key_escaping() {
        assert_eq!(progress_key("alice", "animals"), "progress:v1:alice:animals");
        assert_eq!(progress_key("a:b", "50%"), "progress:v1:a%3Ab:50%25");
        // An escaped colon typed literally stays distinct from a real one.
        assert_ne!(progress_key("a%3Ab", "x"), progress_key("a:b", "x"));
    }

    #[test]
    fn test_reset_removes_record() {
        let mut store = ProgressStore::new(MemoryKv::new());
        store.save("alice", "animals", &sample_progress()).unwrap();
        store.reset("alice", "animals").unwrap();
        assert!(store.backend().is_empty());
        assert!(store.load("alice", "animals").completed.is_empty());
    }

    #[test]
    fn test_corrupt_record_degrades_to_empty() {
        let mut kv = MemoryKv::new();
        kv.set(&progress_key("alice", "animals"), "{not json").unwrap();
        let store = ProgressStore::new(kv);
        let progress = store.load("alice", "animals");
        assert!(progress.stats.is_empty());
    }

    #[test]
    fn test_wrong_shape_degrades_to_empty() {
        let mut kv = MemoryKv::new();
        kv.set(&progress_key("alice", "animals"), r#"{"version":1,"progress":[1,2]}"#)
            .unwrap();
        let store = ProgressStore::new(kv);
        assert!(store.load("alice", "animals").stats.is_empty());
    }

    #[test]
    fn test_unknown_version_degrades_to_empty() {
        let raw = encode(&sample_progress())
            .unwrap()
            .replace("\"version\":1", "\"version\":99");
        assert!(decode(&raw).is_none());
    }

    #[test]
    fn test_partial_stats_are_normalized() {
        let raw = r#"{"version":1,"progress":{
            "completed":["a"],
            "stats":{"a":{"seen":true,"correct":2,"streak":2},"b":{"wrong":"x"}},
            "updated_at":"2024-05-01T10:00:00Z"}}"#;
        let progress = decode(raw).unwrap();
        let a = &progress.stats[&CardId::from("a")];
        assert_eq!(a.wrong, 0);
        assert_eq!(a.correct, 2);
        let b = &progress.stats[&CardId::from("b")];
        assert!(!b.seen);
        assert_eq!(b.wrong, 0);
        assert!(progress.is_completed(&CardId::from("a")));
    }

    #[test]
    fn test_ensure_stats_fills_missing_only() {
        let progress = sample_progress();
        let ids = vec![CardId::from("a"), CardId::from("c")];
        let stats = ensure_stats(&progress, &ids);

        assert_eq!(stats[&CardId::from("a")].correct, 2);
        assert_eq!(stats[&CardId::from("b")].wrong, 1);
        assert_eq!(stats[&CardId::from("c")], CardStats::default());
        // The input is untouched.
        assert!(!progress.stats.contains_key(&CardId::from("c")));
    }

    #[test]
    fn test_sqlite_backed_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = ProgressStore::new(SqliteKv::open(temp_dir.path()).unwrap());
        let progress = sample_progress();
        store.save("alice", "animals", &progress).unwrap();
        drop(store);

        let store = ProgressStore::new(SqliteKv::open(temp_dir.path()).unwrap());
        assert_eq!(store.load("alice", "animals"), progress);
    }
}
