//! Practice queue construction
//!
//! Queues are rebuilt from the deck and the learner's card states each time a
//! session starts. They are never persisted.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::algorithm::NEW_DAILY_CAP;
use super::models::{CardId, CardState, DailyCounter, DeckMode};

/// Limits applied while building a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOptions {
    /// Maximum new cards introduced per calendar day
    #[serde(default = "default_new_daily_cap")]
    pub new_daily_cap: u32,
}

fn default_new_daily_cap() -> u32 {
    NEW_DAILY_CAP
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            new_daily_cap: default_new_daily_cap(),
        }
    }
}

/// Build a practice queue using the thread-local RNG
pub fn build_queue(
    deck: &[CardId],
    per_card: &HashMap<CardId, CardState>,
    daily: &DailyCounter,
    mode: DeckMode,
    options: &QueueOptions,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Vec<CardId> {
    let mut rng = rand::thread_rng();
    build_queue_with_rng(deck, per_card, daily, mode, options, now, today, &mut rng)
}

/// Build a practice queue with a provided RNG
///
/// In spaced repetition mode due cards always come first, then new cards up
/// to the remaining daily allowance. Due cards are never capped. Cards that
/// have state but are not yet due are left out. A `daily` counter from an
/// earlier date counts as zero introductions.
#[allow(clippy::too_many_arguments)]
pub fn build_queue_with_rng<R: Rng + ?Sized>(
    deck: &[CardId],
    per_card: &HashMap<CardId, CardState>,
    daily: &DailyCounter,
    mode: DeckMode,
    options: &QueueOptions,
    now: DateTime<Utc>,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<CardId> {
    match mode {
        DeckMode::Linear => deck.to_vec(),
        DeckMode::Random => {
            let mut queue = deck.to_vec();
            queue.shuffle(rng);
            queue
        }
        DeckMode::SpacedRepetition => {
            let mut due = Vec::new();
            let mut fresh = Vec::new();
            for id in deck {
                match per_card.get(id) {
                    Some(state) if state.is_due(now) => due.push(*id),
                    Some(_) => {}
                    None => fresh.push(*id),
                }
            }

            due.shuffle(rng);
            fresh.shuffle(rng);
            fresh.truncate(remaining_new(daily, options, today) as usize);

            log::debug!(
                "Built spaced repetition queue: {} due, {} new ({} introduced today)",
                due.len(),
                fresh.len(),
                daily.for_day(today).new_introduced
            );

            due.extend(fresh);
            due
        }
    }
}

/// New cards still allowed on `today`
pub fn remaining_new(daily: &DailyCounter, options: &QueueOptions, today: NaiveDate) -> u32 {
    options
        .new_daily_cap
        .saturating_sub(daily.for_day(today).new_introduced)
}

/// Ordered card ids for the current practice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQueue {
    pub cards: Vec<CardId>,
    /// True when nothing was due and the whole deck was substituted
    pub fallback: bool,
}

impl SessionQueue {
    /// Build the session queue, falling back to the whole deck in deck order
    /// when nothing is due and no new cards are allowed
    ///
    /// `deck` is the set being practiced. Callers filtering by category or
    /// lesson pass the filtered ids, so the fallback stays within them.
    #[allow(clippy::too_many_arguments)]
    pub fn build_with_rng<R: Rng + ?Sized>(
        deck: &[CardId],
        per_card: &HashMap<CardId, CardState>,
        daily: &DailyCounter,
        mode: DeckMode,
        options: &QueueOptions,
        now: DateTime<Utc>,
        today: NaiveDate,
        rng: &mut R,
    ) -> Self {
        let cards = build_queue_with_rng(deck, per_card, daily, mode, options, now, today, rng);
        if cards.is_empty() && !deck.is_empty() {
            log::info!(
                "Nothing due and no new cards left today; practicing all {} cards",
                deck.len()
            );
            return Self {
                cards: deck.to_vec(),
                fallback: true,
            };
        }
        Self {
            cards,
            fallback: false,
        }
    }

    pub fn build(
        deck: &[CardId],
        per_card: &HashMap<CardId, CardState>,
        daily: &DailyCounter,
        mode: DeckMode,
        options: &QueueOptions,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Self {
        let mut rng = rand::thread_rng();
        Self::build_with_rng(deck, per_card, daily, mode, options, now, today, &mut rng)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::algorithm::schedule_next;
    use crate::flashcards::models::{Deck, Grade, Word, WordFilter};
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn deck(n: usize) -> Vec<CardId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn due_state() -> CardState {
        let mut state = schedule_next(None, Grade::Good, now() - Duration::days(3));
        state.due_at = now() - Duration::hours(1);
        state
    }

    fn future_state() -> CardState {
        schedule_next(None, Grade::Good, now())
    }

    fn counter(new_introduced: u32) -> DailyCounter {
        DailyCounter {
            date: today(),
            new_introduced,
        }
    }

    fn srs_queue(
        cards: &[CardId],
        states: &HashMap<CardId, CardState>,
        daily: &DailyCounter,
        rng: &mut StdRng,
    ) -> Vec<CardId> {
        build_queue_with_rng(
            cards,
            states,
            daily,
            DeckMode::SpacedRepetition,
            &QueueOptions::default(),
            now(),
            today(),
            rng,
        )
    }

    fn srs_session(
        cards: &[CardId],
        states: &HashMap<CardId, CardState>,
        daily: &DailyCounter,
    ) -> SessionQueue {
        SessionQueue::build(
            cards,
            states,
            daily,
            DeckMode::SpacedRepetition,
            &QueueOptions::default(),
            now(),
            today(),
        )
    }

    #[test]
    fn test_empty_deck_yields_empty_queue_in_every_mode() {
        let states = HashMap::new();
        let daily = DailyCounter::new(today());
        let options = QueueOptions::default();
        let mut rng = StdRng::seed_from_u64(1);

        for mode in [DeckMode::Linear, DeckMode::Random, DeckMode::SpacedRepetition] {
            let queue = build_queue_with_rng(
                &[],
                &states,
                &daily,
                mode,
                &options,
                now(),
                today(),
                &mut rng,
            );
            assert!(queue.is_empty());

            let session = SessionQueue::build_with_rng(
                &[],
                &states,
                &daily,
                mode,
                &options,
                now(),
                today(),
                &mut rng,
            );
            assert!(session.is_empty());
            assert!(!session.fallback);
        }
    }

    #[test]
    fn test_linear_ignores_state() {
        let cards = deck(5);
        let mut states = HashMap::new();
        states.insert(cards[1], future_state());
        states.insert(cards[3], due_state());
        let daily = DailyCounter::new(today());
        let options = QueueOptions::default();

        let linear = |states: &HashMap<CardId, CardState>| {
            build_queue(
                &cards,
                states,
                &daily,
                DeckMode::Linear,
                &options,
                now(),
                today(),
            )
        };

        let first = linear(&states);
        let second = linear(&HashMap::new());

        assert_eq!(first, cards);
        assert_eq!(second, cards);
    }

    #[test]
    fn test_random_is_a_permutation() {
        let cards = deck(20);
        let mut states = HashMap::new();
        states.insert(cards[0], future_state());
        let daily = DailyCounter::new(today());
        let mut rng = StdRng::seed_from_u64(42);

        let queue = build_queue_with_rng(
            &cards,
            &states,
            &daily,
            DeckMode::Random,
            &QueueOptions::default(),
            now(),
            today(),
            &mut rng,
        );

        assert_eq!(queue.len(), cards.len());
        let expected: HashSet<_> = cards.iter().collect();
        let actual: HashSet<_> = queue.iter().collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_spaced_repetition_all_new() {
        let cards = deck(3);
        let daily = DailyCounter::new(today());
        let mut rng = StdRng::seed_from_u64(5);

        let queue = srs_queue(&cards, &HashMap::new(), &daily, &mut rng);

        assert_eq!(queue.len(), 3);
        for id in &cards {
            assert_eq!(queue.iter().filter(|q| *q == id).count(), 1);
        }
    }

    #[test]
    fn test_due_cards_precede_new_and_future_cards_are_skipped() {
        let cards = deck(12);
        let mut states = HashMap::new();
        let mut due_ids = HashSet::new();
        for id in &cards[0..4] {
            states.insert(*id, due_state());
            due_ids.insert(*id);
        }
        for id in &cards[4..7] {
            states.insert(*id, future_state());
        }
        let daily = DailyCounter::new(today());
        let mut rng = StdRng::seed_from_u64(9);

        let queue = srs_queue(&cards, &states, &daily, &mut rng);

        assert_eq!(queue.len(), 4 + 5);
        assert!(queue[..4].iter().all(|id| due_ids.contains(id)));
        assert!(queue[4..].iter().all(|id| !states.contains_key(id)));
    }

    #[test]
    fn test_new_cards_respect_remaining_allowance() {
        let cards = deck(80);
        let states = HashMap::new();
        let mut rng = StdRng::seed_from_u64(3);

        for introduced in [0, 10, 49, 50, 75] {
            let queue = srs_queue(&cards, &states, &counter(introduced), &mut rng);
            assert_eq!(queue.len() as u32, NEW_DAILY_CAP.saturating_sub(introduced));
        }

        let small = QueueOptions { new_daily_cap: 5 };
        let daily = DailyCounter::new(today());
        let queue = build_queue_with_rng(
            &cards,
            &states,
            &daily,
            DeckMode::SpacedRepetition,
            &small,
            now(),
            today(),
            &mut rng,
        );
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn test_counter_from_yesterday_does_not_cap_today() {
        let cards = deck(5);
        let yesterday = DailyCounter {
            date: today() - Duration::days(1),
            new_introduced: NEW_DAILY_CAP,
        };
        let mut rng = StdRng::seed_from_u64(8);

        let queue = srs_queue(&cards, &HashMap::new(), &yesterday, &mut rng);
        assert_eq!(queue.len(), 5);

        let options = QueueOptions::default();
        assert_eq!(remaining_new(&yesterday, &options, today()), NEW_DAILY_CAP);
        assert_eq!(remaining_new(&counter(NEW_DAILY_CAP), &options, today()), 0);

        let session = srs_session(&cards, &HashMap::new(), &yesterday);
        assert!(!session.fallback);
        assert_eq!(session.len(), 5);
    }

    #[test]
    fn test_due_cards_are_never_capped() {
        let cards = deck(60);
        let states: HashMap<_, _> = cards.iter().map(|id| (*id, due_state())).collect();
        let mut rng = StdRng::seed_from_u64(4);

        let queue = srs_queue(&cards, &states, &counter(NEW_DAILY_CAP), &mut rng);
        assert_eq!(queue.len(), 60);
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        let cards = deck(30);
        let daily = DailyCounter::new(today());

        let mut a = StdRng::seed_from_u64(2024);
        let mut b = StdRng::seed_from_u64(2024);
        let first = srs_queue(&cards, &HashMap::new(), &daily, &mut a);
        let second = srs_queue(&cards, &HashMap::new(), &daily, &mut b);

        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_is_uniform() {
        let cards = deck(3);
        let states = HashMap::new();
        let daily = DailyCounter::new(today());
        let options = QueueOptions::default();
        let mut rng = StdRng::seed_from_u64(12345);
        let mut counts: HashMap<Vec<CardId>, usize> = HashMap::new();

        let trials = 6000;
        for _ in 0..trials {
            let queue = build_queue_with_rng(
                &cards,
                &states,
                &daily,
                DeckMode::Random,
                &options,
                now(),
                today(),
                &mut rng,
            );
            *counts.entry(queue).or_default() += 1;
        }

        // 3! permutations, expected 1000 each
        assert_eq!(counts.len(), 6);
        for count in counts.values() {
            assert!((850..=1150).contains(count), "permutation count {} out of range", count);
        }
    }

    #[test]
    fn test_session_falls_back_to_whole_deck() {
        let cards = deck(4);
        let states: HashMap<_, _> = cards.iter().map(|id| (*id, future_state())).collect();
        let daily = DailyCounter::new(today());

        let session = srs_session(&cards, &states, &daily);

        assert!(session.fallback);
        assert_eq!(session.cards, cards);
    }

    #[test]
    fn test_session_falls_back_when_cap_exhausted() {
        let cards = deck(4);

        let session = srs_session(&cards, &HashMap::new(), &counter(NEW_DAILY_CAP + 3));

        assert!(session.fallback);
        assert_eq!(session.len(), 4);
    }

    #[test]
    fn test_fallback_stays_within_filtered_words() {
        let mut deck = Deck::new("HSK 1".to_string(), DeckMode::SpacedRepetition);
        for (i, hanzi) in ["水", "茶", "你好", "再见", "米饭"].iter().enumerate() {
            let mut word = Word::new(hanzi, "", "");
            let category = if i % 2 == 0 { "Food" } else { "Greetings" };
            word.category = Some(category.to_string());
            deck.words.push(word);
        }
        let filter = WordFilter {
            category: Some("food".to_string()),
            lesson: None,
        };
        let food = deck.filtered_ids(&filter);
        assert_eq!(food.len(), 3);

        // Every food card reviewed and not yet due
        let states: HashMap<_, _> = food.iter().map(|id| (*id, future_state())).collect();
        let session = srs_session(&food, &states, &DailyCounter::new(today()));

        assert!(session.fallback);
        assert_eq!(session.cards, food);
    }
}
