//! Review statistics

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::models::{CardId, CardState, ReviewRecord, ReviewStats};
use crate::config::DayBoundary;

/// Compute statistics for a deck from card states and the review log
///
/// `reviews_today` buckets by `boundary` so it agrees with the daily
/// new-card counter.
pub fn compute_stats(
    deck: &[CardId],
    per_card: &HashMap<CardId, CardState>,
    reviews: &[ReviewRecord],
    now: DateTime<Utc>,
    boundary: DayBoundary,
) -> ReviewStats {
    let mut stats = ReviewStats {
        total_cards: deck.len(),
        ..Default::default()
    };

    for id in deck {
        match per_card.get(id) {
            None => stats.new_cards += 1,
            Some(state) => {
                if state.repetitions >= 2 {
                    stats.review_cards += 1;
                } else {
                    stats.learning_cards += 1;
                }
                if state.is_due(now) {
                    stats.due_cards += 1;
                }
            }
        }
    }

    let today: NaiveDate = boundary.date_of(now);
    let week = Duration::days(7);
    for review in reviews {
        if review.reviewed_at > now {
            continue;
        }
        stats.by_grade[review.grade.as_u8() as usize] += 1;
        if review.is_within(now, week) {
            stats.last_7_days += 1;
        }
        if boundary.date_of(review.reviewed_at) == today {
            stats.reviews_today += 1;
            if review.grade.is_correct() {
                stats.correct_today += 1;
            }
        }
    }

    stats
}
