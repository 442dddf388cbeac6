use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Consecutive correct matches needed before a card counts as learned.
pub const MASTERY_STREAK: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub term: String,
    pub explanation: String,
}

impl Card {
    pub fn new(id: impl Into<String>, term: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            id: CardId::new(id),
            term: term.into(),
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Term,
    Definition,
}

/// One face of a card laid out on the board for a single batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub card_id: CardId,
    pub side: Side,
    pub text: String,
    pub solved: bool,
}

impl Tile {
    /// Two tiles form a pair only when they show opposite faces of the same card.
    pub fn pairs_with(&self, other: &Tile) -> bool {
        self.card_id == other.card_id && self.side != other.side
    }
}

/// Per-learner statistics for a single card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub seen: bool,
    #[serde(default, deserialize_with = "lenient_count")]
    pub wrong: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub correct: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub streak: u32,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

// Stored counters come from older or hand-edited records; anything that is
// not a non-negative integer reads back as zero instead of failing the record.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(0))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(false))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

/// Learning progress of one learner over one flashcard set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub completed: BTreeSet<CardId>,
    #[serde(default)]
    pub stats: BTreeMap<CardId, CardStats>,
    #[serde(default)]
    pub best_time_ms: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            completed: BTreeSet::new(),
            stats: BTreeMap::new(),
            best_time_ms: None,
            updated_at: now,
        }
    }

    pub fn is_completed(&self, id: &CardId) -> bool {
        self.completed.contains(id)
    }

    pub fn stats_for(&self, id: &CardId) -> CardStats {
        self.stats.get(id).cloned().unwrap_or_default()
    }

    /// Records a successful match. Returns true when this call made the card learned.
    ///
    /// Learned cards stay learned: a later `mark_wrong` resets the streak but
    /// leaves `completed` untouched.
    pub fn mark_correct(&mut self, id: &CardId, now: DateTime<Utc>) -> bool {
        let stats = self.stats.entry(id.clone()).or_default();
        stats.correct = stats.correct.saturating_add(1);
        stats.streak = stats.streak.saturating_add(1);
        let reached = stats.streak >= MASTERY_STREAK;
        self.updated_at = now;

        reached && self.completed.insert(id.clone())
    }

    pub fn mark_wrong(&mut self, id: &CardId, now: DateTime<Utc>) {
        let stats = self.stats.entry(id.clone()).or_default();
        stats.wrong = stats.wrong.saturating_add(1);
        stats.streak = 0;
        self.updated_at = now;
    }

    /// Keeps the fastest batch time. Returns true when `elapsed` is a new record.
    pub fn record_time(&mut self, elapsed: Duration, now: DateTime<Utc>) -> bool {
        let ms = elapsed.as_millis().min(u64::MAX as u128) as u64;
        self.updated_at = now;
        match self.best_time_ms {
            Some(best) if best <= ms => false,
            _ => {
                self.best_time_ms = Some(ms);
                true
            }
        }
    }
}
