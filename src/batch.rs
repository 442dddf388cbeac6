//! Picks the cards for the next round.
//!
//! Cards the learner has not mastered are split into three tiers (cards with
//! recorded mistakes, unseen cards, everything else) and drawn in that order,
//! each tier shuffled. When too few unmastered cards remain the round is
//! topped up with a random sample of the whole pool so there is always
//! something to play.

use crate::models::{Card, CardId, Progress};
use crate::progress::ensure_stats;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::{IteratorRandom, SliceRandom};
use std::collections::HashSet;

pub const DEFAULT_ROUND_SIZE: usize = 6;

pub fn select_batch<R: Rng + ?Sized>(
    cards: &[Card],
    progress: &Progress,
    round_size: usize,
    rng: &mut R,
) -> Vec<Card> {
    let target = round_size.min(cards.len());
    let stats = ensure_stats(progress, cards.iter().map(|c| &c.id));

    let mut mistakes = Vec::new();
    let mut unseen = Vec::new();
    let mut rest = Vec::new();
    for card in cards.iter().filter(|c| !progress.is_completed(&c.id)) {
        let card_stats = &stats[&card.id];
        if card_stats.wrong > 0 {
            mistakes.push(card);
        } else if !card_stats.seen {
            unseen.push(card);
        } else {
            rest.push(card);
        }
    }

    let mut picked: Vec<Card> = Vec::with_capacity(target);
    let mut picked_ids: HashSet<&CardId> = HashSet::with_capacity(target);
    for mut tier in [mistakes, unseen, rest] {
        tier.shuffle(rng);
        for card in tier {
            if picked.len() >= target {
                break;
            }
            // Pools may repeat an id; a card is never dealt twice in one round.
            if picked_ids.insert(&card.id) {
                picked.push(card.clone());
            }
        }
    }

    if picked.len() < target {
        let missing = target - picked.len();
        let padding = cards
            .iter()
            .filter(|c| !picked_ids.contains(&c.id))
            .choose_multiple(rng, missing);
        for card in padding {
            if picked_ids.insert(&card.id) {
                picked.push(card.clone());
            }
        }
    }

    picked
}

/// Marks every card of a freshly dealt batch as seen.
pub fn commit_batch(progress: &mut Progress, batch: &[Card], now: DateTime<Utc>) {
    for card in batch {
        let stats = progress.stats.entry(card.id.clone()).or_default();
        stats.seen = true;
        stats.last_seen_at = Some(now);
    }
    progress.updated_at = now;
}
