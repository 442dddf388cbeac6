//! Match game session: deals a batch of cards as shuffled term/definition
//! tiles and resolves picked pairs against the learner's progress.
//!
//! The session is driven by two kinds of events: tile picks and clock ticks.
//! Picking a second tile locks the board until `resolve_delay` has passed; the
//! next `tick` after the deadline classifies the pair, updates progress and
//! writes it back to the store before returning.

use crate::batch::{DEFAULT_ROUND_SIZE, commit_batch, select_batch};
use crate::db::KvStore;
use crate::logger;
use crate::models::{Card, CardId, Progress, Side, Tile};
use crate::progress::{ProgressStore, ensure_stats};
use crate::timer::Stopwatch;
use chrono::Utc;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};

pub const DEFAULT_RESOLVE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub round_size: usize,
    pub resolve_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_size: DEFAULT_ROUND_SIZE,
            resolve_delay: DEFAULT_RESOLVE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No batch dealt yet, or the session was ended.
    Idle,
    /// Fresh board, nothing picked.
    Dealt,
    Picking { pending: Option<usize> },
    /// Two tiles picked; input is locked until `resolve_at`.
    Resolving {
        first: usize,
        second: usize,
        resolve_at: Instant,
    },
    Completed { elapsed: Duration },
    /// The card pool is empty; nothing can be dealt.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Ignored,
    Selected,
    Locked { resolve_at: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub elapsed: Duration,
    pub best_time: Duration,
    pub new_record: bool,
    pub pairs: usize,
    pub mismatches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched { card_id: CardId, learned: bool },
    Mismatched { first: CardId, second: CardId },
    /// The final pair of the batch was matched.
    BatchCompleted {
        card_id: CardId,
        learned: bool,
        summary: BatchSummary,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoreboard {
    pub learned: usize,
    pub remaining: usize,
    pub mistakes: usize,
    pub batch_mismatches: usize,
    pub solved_pairs: usize,
    pub total_pairs: usize,
}

/// Lays out one term tile and one definition tile per card, shuffled.
pub fn deal_tiles<R: Rng + ?Sized>(batch: &[Card], rng: &mut R) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = batch
        .iter()
        .flat_map(|card| {
            [
                Tile {
                    card_id: card.id.clone(),
                    side: Side::Term,
                    text: card.term.clone(),
                    solved: false,
                },
                Tile {
                    card_id: card.id.clone(),
                    side: Side::Definition,
                    text: card.explanation.clone(),
                    solved: false,
                },
            ]
        })
        .collect();
    tiles.shuffle(rng);
    tiles
}

pub struct MatchSession<S: KvStore> {
    store: ProgressStore<S>,
    learner_id: String,
    set_id: String,
    cards: Vec<Card>,
    progress: Progress,
    tiles: Vec<Tile>,
    phase: Phase,
    stopwatch: Stopwatch,
    config: SessionConfig,
    rng: StdRng,
    batch_mismatches: usize,
    batches_completed: usize,
    last_warning: Option<String>,
}

impl<S: KvStore> MatchSession<S> {
    pub fn new(
        store: ProgressStore<S>,
        learner_id: impl Into<String>,
        set_id: impl Into<String>,
        cards: Vec<Card>,
        config: SessionConfig,
    ) -> Self {
        Self::with_rng(store, learner_id, set_id, cards, config, StdRng::from_entropy())
    }

    pub fn with_rng(
        store: ProgressStore<S>,
        learner_id: impl Into<String>,
        set_id: impl Into<String>,
        cards: Vec<Card>,
        mut config: SessionConfig,
        rng: StdRng,
    ) -> Self {
        config.round_size = config.round_size.max(1);
        let learner_id = learner_id.into();
        let set_id = set_id.into();
        let mut progress = store.load(&learner_id, &set_id);
        progress.stats = ensure_stats(&progress, cards.iter().map(|c| &c.id));
        logger::info(&format!(
            "Loaded progress for {}/{}: {} learned of {} cards",
            learner_id,
            set_id,
            progress.completed.len(),
            cards.len()
        ));

        Self {
            store,
            learner_id,
            set_id,
            cards,
            progress,
            tiles: Vec::new(),
            phase: Phase::Idle,
            stopwatch: Stopwatch::new(),
            config,
            rng,
            batch_mismatches: 0,
            batches_completed: 0,
            last_warning: None,
        }
    }

    /// Deals a new batch, abandoning any batch in play.
    pub fn start_batch(&mut self, now: Instant) {
        let batch = select_batch(&self.cards, &self.progress, self.config.round_size, &mut self.rng);
        self.batch_mismatches = 0;

        if batch.is_empty() {
            logger::warn(&format!("No cards to study in set {}", self.set_id));
            self.tiles.clear();
            self.stopwatch.stop();
            self.phase = Phase::Empty;
            return;
        }

        commit_batch(&mut self.progress, &batch, Utc::now());
        self.persist();

        self.tiles = deal_tiles(&batch, &mut self.rng);
        self.stopwatch.restart(now);
        self.phase = Phase::Dealt;
        logger::info(&format!(
            "Dealt batch of {} cards for {}/{}",
            batch.len(),
            self.learner_id,
            self.set_id
        ));
    }

    pub fn pick(&mut self, index: usize, now: Instant) -> PickOutcome {
        if !self.tiles.get(index).is_some_and(|t| !t.solved) {
            return PickOutcome::Ignored;
        }

        match self.phase {
            Phase::Dealt | Phase::Picking { pending: None } => {
                self.phase = Phase::Picking {
                    pending: Some(index),
                };
                PickOutcome::Selected
            }
            Phase::Picking {
                pending: Some(first),
            } if first != index => {
                let resolve_at = now + self.config.resolve_delay;
                self.phase = Phase::Resolving {
                    first,
                    second: index,
                    resolve_at,
                };
                PickOutcome::Locked { resolve_at }
            }
            _ => PickOutcome::Ignored,
        }
    }

    /// Resolves a pending pair once its delay has passed.
    pub fn tick(&mut self, now: Instant) -> Option<Resolution> {
        match self.phase {
            Phase::Resolving {
                first,
                second,
                resolve_at,
            } if now >= resolve_at => Some(self.resolve(first, second, resolve_at)),
            _ => None,
        }
    }

    /// `resolved_at` is the pair's deadline, not the tick that noticed it.
    fn resolve(&mut self, first: usize, second: usize, resolved_at: Instant) -> Resolution {
        let first_id = self.tiles[first].card_id.clone();
        let second_id = self.tiles[second].card_id.clone();

        if !self.tiles[first].pairs_with(&self.tiles[second]) {
            self.progress.mark_wrong(&first_id, Utc::now());
            if second_id != first_id {
                self.progress.mark_wrong(&second_id, Utc::now());
            }
            self.batch_mismatches += 1;
            self.persist();
            self.phase = Phase::Picking { pending: None };
            return Resolution::Mismatched {
                first: first_id,
                second: second_id,
            };
        }

        self.tiles[first].solved = true;
        self.tiles[second].solved = true;
        let learned = self.progress.mark_correct(&first_id, Utc::now());
        if learned {
            logger::info(&format!("Card {} learned in set {}", first_id, self.set_id));
        }

        if self.tiles.iter().all(|t| t.solved) {
            let elapsed = self.stopwatch.pause(resolved_at);
            let new_record = self.progress.record_time(elapsed, Utc::now());
            self.persist();
            self.phase = Phase::Completed { elapsed };
            self.batches_completed += 1;

            let summary = BatchSummary {
                elapsed,
                best_time: self.best_time().unwrap_or(elapsed),
                new_record,
                pairs: self.tiles.len() / 2,
                mismatches: self.batch_mismatches,
            };
            logger::info(&format!(
                "Batch cleared in {} ms ({} mismatches, record: {})",
                elapsed.as_millis(),
                summary.mismatches,
                new_record
            ));
            return Resolution::BatchCompleted {
                card_id: first_id,
                learned,
                summary,
            };
        }

        self.persist();
        self.phase = Phase::Picking { pending: None };
        Resolution::Matched {
            card_id: first_id,
            learned,
        }
    }

    /// Wipes all stored progress for this learner and set, then deals a fresh batch.
    pub fn reset_progress(&mut self, now: Instant) {
        if let Err(e) = self.store.reset(&self.learner_id, &self.set_id) {
            self.warn(format!("Progress could not be reset: {}", e));
        }
        self.progress = Progress::empty(Utc::now());
        self.progress.stats = ensure_stats(&self.progress, self.cards.iter().map(|c| &c.id));
        logger::info(&format!("Progress reset for {}/{}", self.learner_id, self.set_id));
        self.start_batch(now);
    }

    /// Stops the session; ticks and picks are ignored until the next batch.
    pub fn end(&mut self) {
        self.tiles.clear();
        self.stopwatch.stop();
        self.phase = Phase::Idle;
    }

    /// Replaces the card pool, keeping progress for cards that remain.
    pub fn update_cards(&mut self, cards: Vec<Card>) {
        self.progress.stats = ensure_stats(&self.progress, cards.iter().map(|c| &c.id));
        self.cards = cards;
    }

    /// Ends the session and hands back its store.
    pub fn into_store(self) -> ProgressStore<S> {
        self.store
    }

    fn persist(&mut self) {
        match self.store.save(&self.learner_id, &self.set_id, &self.progress) {
            Ok(()) => self.last_warning = None,
            Err(e) => self.warn(format!("Progress not saved: {}", e)),
        }
    }

    fn warn(&mut self, message: String) {
        logger::error(&message);
        self.last_warning = Some(message);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.phase, Phase::Resolving { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.phase, Phase::Completed { .. })
    }

    pub fn is_picked(&self, index: usize) -> bool {
        match self.phase {
            Phase::Picking { pending } => pending == Some(index),
            Phase::Resolving { first, second, .. } => first == index || second == index,
            _ => false,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.stopwatch.elapsed(now)
    }

    pub fn best_time(&self) -> Option<Duration> {
        self.progress.best_time_ms.map(Duration::from_millis)
    }

    pub fn batches_completed(&self) -> usize {
        self.batches_completed
    }

    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    pub fn scoreboard(&self) -> Scoreboard {
        let learned = self
            .cards
            .iter()
            .filter(|c| self.progress.is_completed(&c.id))
            .count();
        let mistakes = self
            .cards
            .iter()
            .filter(|c| !self.progress.is_completed(&c.id) && self.progress.stats_for(&c.id).wrong > 0)
            .count();
        let solved_tiles = self.tiles.iter().filter(|t| t.solved).count();

        Scoreboard {
            learned,
            remaining: self.cards.len() - learned,
            mistakes,
            batch_mismatches: self.batch_mismatches,
            solved_pairs: solved_tiles / 2,
            total_pairs: self.tiles.len() / 2,
        }
    }
}
