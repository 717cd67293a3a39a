//! Review sessions
//!
//! A session walks a [`SessionQueue`], applying grades to the learner's
//! [`SrsState`]. The returned [`GradeOutcome`] is what the caller persists.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::algorithm::schedule_next;
use super::models::{CardId, CardState, Grade, SrsState};
use super::queue::SessionQueue;

/// Result of grading one card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeOutcome {
    pub card_id: CardId,
    pub grade: Grade,
    pub previous: Option<CardState>,
    pub next: CardState,
    /// The card had no state before this grade
    pub was_new: bool,
    pub reviewed_at: DateTime<Utc>,
}

/// Grade a single card against the learner state
///
/// A card graded for the first time is counted against today's new-card
/// allowance before its next state is computed.
pub fn apply_grade(
    state: &mut SrsState,
    card_id: CardId,
    grade: Grade,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> GradeOutcome {
    state.daily.roll_over(today);

    let previous = state.per_card.get(&card_id).cloned();
    let was_new = previous.is_none();
    if was_new {
        state.daily.record_introduction(today);
    }

    let next = schedule_next(previous.as_ref(), grade, now);
    state.per_card.insert(card_id, next.clone());

    log::debug!(
        "Graded {} as {}: interval {}d, ease {:.2}",
        card_id,
        grade,
        next.interval_days,
        next.ease
    );

    GradeOutcome {
        card_id,
        grade,
        previous,
        next,
        was_new,
        reviewed_at: now,
    }
}

/// Progress through a session queue
#[derive(Debug, Clone)]
pub struct ReviewSession {
    queue: SessionQueue,
    index: usize,
    reviewed: usize,
    correct: usize,
}

impl ReviewSession {
    pub fn new(queue: SessionQueue) -> Self {
        Self {
            queue,
            index: 0,
            reviewed: 0,
            correct: 0,
        }
    }

    /// Start at a given position, wrapping into the queue length
    pub fn starting_at(queue: SessionQueue, index: usize) -> Self {
        let index = if queue.is_empty() { 0 } else { index % queue.len() };
        Self {
            index,
            ..Self::new(queue)
        }
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<CardId> {
        self.queue.cards.get(self.index).copied()
    }

    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Percentage of Good/Easy grades in this session
    pub fn accuracy(&self) -> u32 {
        if self.reviewed == 0 {
            return 0;
        }
        ((self.correct as f64 / self.reviewed as f64) * 100.0).round() as u32
    }

    /// Swap in a rebuilt queue after the learner state changed
    ///
    /// A whole-deck fallback queue keeps cycling from the current position;
    /// any other queue starts from its first card.
    pub fn replace_queue(&mut self, queue: SessionQueue) {
        self.index = if queue.fallback && !queue.is_empty() {
            self.index % queue.len()
        } else {
            0
        };
        self.queue = queue;
    }

    /// Grade the current card and advance to the next one
    pub fn grade_current(
        &mut self,
        state: &mut SrsState,
        grade: Grade,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Option<GradeOutcome> {
        let card_id = self.current()?;
        let outcome = apply_grade(state, card_id, grade, now, today);

        self.reviewed += 1;
        if grade.is_correct() {
            self.correct += 1;
        }

        // The session loops; single-card queues stay put
        self.index = if self.queue.len() <= 1 {
            0
        } else {
            (self.index + 1) % self.queue.len()
        };

        Some(outcome)
    }
}
