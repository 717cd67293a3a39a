//! Spaced repetition scheduler
//!
//! An SM-2 variant driven by four grades instead of SM-2's six quality
//! levels:
//! - Again: lapse, relearn in ten minutes
//! - Hard: keep the repetition count, grow the interval slowly
//! - Good: 1 day, then 6 days, then interval * ease
//! - Easy: 2 days, then 7 days, then interval * (ease + 0.15)
//!
//! Intervals are rounded with `f64::round` (half away from zero) and capped
//! at [`MAX_INTERVAL_DAYS`].

use chrono::{DateTime, Duration, Utc};

use super::models::{CardState, Grade};

/// Ease assigned to a card on its first grading
pub const INITIAL_EASE: f64 = 2.5;

/// Minimum ease factor allowed
pub const MIN_EASE: f64 = 1.3;

/// Maximum ease factor allowed
pub const MAX_EASE: f64 = 3.0;

/// Delay before a lapsed card comes back
pub const AGAIN_DELAY_MINUTES: i64 = 10;

/// Default number of new cards introduced per day
pub const NEW_DAILY_CAP: u32 = 50;

/// Longest interval a card can be scheduled out (about 100 years)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const HARD_EASE_PENALTY: f64 = 0.15;
const AGAIN_EASE_PENALTY: f64 = 0.2;
const GOOD_EASE_BONUS: f64 = 0.1;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_FACTOR: f64 = 1.2;

fn clamp_ease(ease: f64) -> f64 {
    ease.clamp(MIN_EASE, MAX_EASE)
}

fn grown_interval(interval: u32, factor: f64) -> u32 {
    let next = (interval as f64 * factor).round();
    next.clamp(1.0, MAX_INTERVAL_DAYS as f64) as u32
}

/// Compute the state a card moves to after being graded at `now`
///
/// A card without state starts from [`CardState::baseline`]. The first and
/// second repetition checks use the repetition count before this grade.
pub fn schedule_next(
    current: Option<&CardState>,
    grade: Grade,
    now: DateTime<Utc>,
) -> CardState {
    let base = current.cloned().unwrap_or_else(|| CardState::baseline(now));
    let repetitions = base.repetitions;
    let interval = base.interval_days;

    let (repetitions, ease, interval_days, due_at) = match grade {
        Grade::Again => {
            let ease = clamp_ease(base.ease - AGAIN_EASE_PENALTY);
            (0, ease, 0, now + Duration::minutes(AGAIN_DELAY_MINUTES))
        }
        Grade::Hard => {
            let ease = clamp_ease(base.ease - HARD_EASE_PENALTY);
            let interval = if repetitions <= 1 {
                1
            } else {
                grown_interval(interval, HARD_INTERVAL_FACTOR)
            };
            (repetitions, ease, interval, now + Duration::days(interval as i64))
        }
        Grade::Good => {
            let ease = clamp_ease(base.ease + GOOD_EASE_BONUS);
            let interval = match repetitions {
                0 => 1,
                1 => 6,
                _ => grown_interval(interval, ease),
            };
            (repetitions + 1, ease, interval, now + Duration::days(interval as i64))
        }
        Grade::Easy => {
            let ease = clamp_ease(base.ease + EASY_EASE_BONUS);
            let interval = match repetitions {
                0 => 2,
                1 => 7,
                _ => grown_interval(interval, ease + EASY_EASE_BONUS),
            };
            (repetitions + 1, ease, interval, now + Duration::days(interval as i64))
        }
    };

    CardState {
        repetitions,
        ease,
        interval_days,
        due_at,
        last_grade: Some(grade),
    }
}

/// Whether a card may be reviewed at `now`
///
/// Cards without state are new and always eligible, subject to the daily cap.
pub fn is_due(state: Option<&CardState>, now: DateTime<Utc>) -> bool {
    match state {
        Some(state) => state.is_due(now),
        None => true,
    }
}

/// Intervals (days) each grade would assign, in Again, Hard, Good, Easy order
pub fn preview_intervals(current: Option<&CardState>, now: DateTime<Utc>) -> [u32; 4] {
    Grade::ALL.map(|grade| schedule_next(current, grade, now).interval_days)
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    fn state(repetitions: u32, ease: f64, interval_days: u32) -> CardState {
        CardState {
            repetitions,
            ease,
            interval_days,
            due_at: now(),
            last_grade: Some(Grade::Good),
        }
    }

    #[test]
    fn test_first_good_on_new_card() {
        let next = schedule_next(None, Grade::Good, now());

        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease - 2.6).abs() < 1e-9);
        assert_eq!(next.due_at, now() + Duration::days(1));
        assert_eq!(next.last_grade, Some(Grade::Good));
    }

    #[test]
    fn test_first_easy_on_new_card() {
        let next = schedule_next(None, Grade::Easy, now());

        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 2);
        assert!((next.ease - 2.65).abs() < 1e-9);
    }

    #[test]
    fn test_second_good_and_easy() {
        let first_good = schedule_next(None, Grade::Good, now());
        let second_good = schedule_next(Some(&first_good), Grade::Good, now());
        assert_eq!(second_good.repetitions, 2);
        assert_eq!(second_good.interval_days, 6);

        let first_easy = schedule_next(None, Grade::Easy, now());
        let second_easy = schedule_next(Some(&first_easy), Grade::Easy, now());
        assert_eq!(second_easy.repetitions, 2);
        assert_eq!(second_easy.interval_days, 7);
    }

    #[test]
    fn test_subsequent_good_uses_updated_ease() {
        // ease 2.4 -> 2.5, 10 * 2.5 = 25
        let next = schedule_next(Some(&state(3, 2.4, 10)), Grade::Good, now());
        assert_eq!(next.interval_days, 25);
        assert_eq!(next.repetitions, 4);
    }

    #[test]
    fn test_subsequent_easy_adds_bonus_to_multiplier() {
        // ease 2.5 -> 2.65, 10 * (2.65 + 0.15) = 28
        let next = schedule_next(Some(&state(2, 2.5, 10)), Grade::Easy, now());
        assert_eq!(next.interval_days, 28);
        assert_eq!(next.repetitions, 3);
    }

    #[test]
    fn test_hard_keeps_repetitions() {
        let early = schedule_next(Some(&state(1, 2.5, 1)), Grade::Hard, now());
        assert_eq!(early.repetitions, 1);
        assert_eq!(early.interval_days, 1);
        assert!((early.ease - 2.35).abs() < 1e-9);

        // 10 * 1.2 = 12
        let later = schedule_next(Some(&state(4, 2.5, 10)), Grade::Hard, now());
        assert_eq!(later.repetitions, 4);
        assert_eq!(later.interval_days, 12);
        assert_eq!(later.due_at, now() + Duration::days(12));
    }

    #[test]
    fn test_hard_on_zero_interval_grows_to_one_day() {
        let next = schedule_next(Some(&state(3, 2.0, 0)), Grade::Hard, now());
        assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn test_interval_rounds_half_away_from_zero() {
        assert_eq!(grown_interval(5, 1.3), 7);
        assert_eq!(grown_interval(15, 1.3), 20);
        assert_eq!(grown_interval(2, 1.2), 2);
        assert_eq!(grown_interval(0, 2.5), 1);

        // 5 * 1.4 = 7
        let next = schedule_next(Some(&state(2, 1.3, 5)), Grade::Good, now());
        assert!((next.ease - 1.4).abs() < 1e-9);
        assert_eq!(next.interval_days, 7);
    }

    #[test]
    fn test_long_easy_streak_is_capped() {
        let mut current = schedule_next(None, Grade::Easy, now());
        for _ in 0..100 {
            current = schedule_next(Some(&current), Grade::Easy, now());
            assert!(current.interval_days <= MAX_INTERVAL_DAYS);
        }

        assert_eq!(current.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(current.due_at, now() + Duration::days(MAX_INTERVAL_DAYS as i64));
        assert_eq!(current.repetitions, 101);
    }

    #[test]
    fn test_oversized_stored_interval_is_capped() {
        let hard = schedule_next(Some(&state(5, 2.5, u32::MAX)), Grade::Hard, now());
        assert_eq!(hard.interval_days, MAX_INTERVAL_DAYS);

        let good = schedule_next(Some(&state(5, 2.5, u32::MAX)), Grade::Good, now());
        assert_eq!(good.interval_days, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_again_resets() {
        let next = schedule_next(Some(&state(7, 2.8, 90)), Grade::Again, now());

        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval_days, 0);
        assert!((next.ease - 2.6).abs() < 1e-9);
        assert_eq!(next.due_at, now() + Duration::minutes(AGAIN_DELAY_MINUTES));
        assert_eq!(next.last_grade, Some(Grade::Again));
    }

    #[test]
    fn test_ease_bounds() {
        let low = schedule_next(Some(&state(2, 1.35, 10)), Grade::Again, now());
        assert_eq!(low.ease, MIN_EASE);

        let high = schedule_next(Some(&state(2, 2.95, 10)), Grade::Easy, now());
        assert_eq!(high.ease, MAX_EASE);
    }

    #[test]
    fn test_ease_stays_in_bounds_for_random_sequences() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut current = CardState::baseline(now());
            current.ease = rng.gen_range(MIN_EASE..=MAX_EASE);
            for _ in 0..40 {
                let grade = Grade::ALL[rng.gen_range(0..4)];
                current = schedule_next(Some(&current), grade, now());
                assert!(current.ease >= MIN_EASE && current.ease <= MAX_EASE);
                if grade == Grade::Again {
                    assert_eq!(current.repetitions, 0);
                    assert_eq!(current.interval_days, 0);
                } else {
                    assert!(current.interval_days >= 1);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_stored_ease_is_repaired() {
        let next = schedule_next(Some(&state(3, 4.0, 10)), Grade::Hard, now());
        assert_eq!(next.ease, MAX_EASE);
    }

    #[test]
    fn test_again_card_is_not_due_until_delay_elapses() {
        let next = schedule_next(None, Grade::Again, now());

        assert!(!is_due(Some(&next), now()));
        assert!(!is_due(Some(&next), now() + Duration::minutes(9)));
        assert!(is_due(Some(&next), now() + Duration::minutes(10)));
        assert!(is_due(None, now()));
    }

    #[test]
    fn test_preview_intervals() {
        assert_eq!(preview_intervals(None, now()), [0, 1, 1, 2]);
        assert_eq!(preview_intervals(Some(&state(1, 2.5, 1)), now()), [0, 1, 6, 7]);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(5), "5d");
        assert_eq!(format_interval(7), "1w");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(30), "1mo");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(365), "1y");
        assert_eq!(format_interval(730), "2y");
    }
}
