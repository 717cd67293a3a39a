//! Data models for the flashcard system

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::INITIAL_EASE;

/// Identifier of a word card in a deck
pub type CardId = Uuid;

/// Rejected grade input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("Grade out of range: {0} (expected 0-3)")]
    OutOfRange(i64),

    #[error("Unknown grade: {0:?} (expected again, hard, good or easy)")]
    Unknown(String),
}

/// How well the learner recalled a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    Again = 0,
    Hard = 1,
    Good = 2,
    Easy = 3,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Good and Easy count as a correct answer
    pub fn is_correct(self) -> bool {
        matches!(self, Grade::Good | Grade::Easy)
    }

    /// Map a keyboard shortcut (1-4) to a grade
    pub fn from_key(key: char) -> Option<Grade> {
        match key {
            '1' => Some(Grade::Again),
            '2' => Some(Grade::Hard),
            '3' => Some(Grade::Good),
            '4' => Some(Grade::Easy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Again => "Again",
            Grade::Hard => "Hard",
            Grade::Good => "Good",
            Grade::Easy => "Easy",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<i64> for Grade {
    type Error = GradeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Grade::Again),
            1 => Ok(Grade::Hard),
            2 => Ok(Grade::Good),
            3 => Ok(Grade::Easy),
            other => Err(GradeError::OutOfRange(other)),
        }
    }
}

impl FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Grade::try_from(n);
        }
        match trimmed.to_lowercase().as_str() {
            "again" => Ok(Grade::Again),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            _ => Err(GradeError::Unknown(trimmed.to_string())),
        }
    }
}

// Persisted as the integer 0-3, matching the stored review rows.
impl Serialize for Grade {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Grade::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Spaced repetition state for a card the learner has graded at least once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    /// Consecutive Good/Easy grades since the last lapse
    #[serde(default)]
    pub repetitions: u32,
    /// Ease factor, kept within [MIN_EASE, MAX_EASE]
    #[serde(default = "default_ease")]
    pub ease: f64,
    /// Current interval in days (0 while relearning)
    #[serde(default)]
    pub interval_days: u32,
    /// When the card is next eligible for review
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub last_grade: Option<Grade>,
}

fn default_ease() -> f64 {
    INITIAL_EASE
}

impl CardState {
    /// Baseline state used for a card that has never been graded
    pub fn baseline(now: DateTime<Utc>) -> Self {
        Self {
            repetitions: 0,
            ease: INITIAL_EASE,
            interval_days: 0,
            due_at: now,
            last_grade: None,
        }
    }

    /// Check if the card is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// Number of new cards introduced on a given calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounter {
    pub date: NaiveDate,
    #[serde(default)]
    pub new_introduced: u32,
}

impl DailyCounter {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            new_introduced: 0,
        }
    }

    /// Reset the counter when the stored date is not `today`
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.date != today {
            log::debug!(
                "Daily counter rolled over from {} to {} ({} introduced)",
                self.date,
                today,
                self.new_introduced
            );
            self.date = today;
            self.new_introduced = 0;
        }
    }

    /// Counter as it applies to `today`
    pub fn for_day(&self, today: NaiveDate) -> Self {
        let mut counter = self.clone();
        counter.roll_over(today);
        counter
    }

    pub fn record_introduction(&mut self, today: NaiveDate) {
        self.roll_over(today);
        self.new_introduced += 1;
    }
}

/// A learner's complete scheduling state, passed explicitly to the queue
/// builder and the review session
#[derive(Debug, Clone, PartialEq)]
pub struct SrsState {
    pub per_card: HashMap<CardId, CardState>,
    pub daily: DailyCounter,
}

impl SrsState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            per_card: HashMap::new(),
            daily: DailyCounter::new(today),
        }
    }
}

/// How a deck's practice queue is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DeckMode {
    /// Ordered content, presented in deck order
    Linear,
    /// Vocabulary scheduled by due date with a daily new-card cap
    #[default]
    SpacedRepetition,
    /// Unordered practice, freshly shuffled each session
    Random,
}

impl FromStr for DeckMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(DeckMode::Linear),
            "srs" | "spaced" | "spacedrepetition" | "spaced-repetition" => {
                Ok(DeckMode::SpacedRepetition)
            }
            "random" => Ok(DeckMode::Random),
            other => Err(format!("Unknown deck mode: {}", other)),
        }
    }
}

/// A vocabulary word, the static content of a card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: CardId,
    pub hanzi: String,
    pub pinyin: String,
    pub english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
}

impl Word {
    pub fn new(hanzi: &str, pinyin: &str, english: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            hanzi: hanzi.to_string(),
            pinyin: pinyin.to_string(),
            english: english.to_string(),
            description: None,
            category: None,
            lesson: None,
        }
    }
}

/// Restricts practice to words of one category and/or lesson
///
/// Names are compared case-insensitively. An unset field matches every word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordFilter {
    pub category: Option<String>,
    pub lesson: Option<String>,
}

impl WordFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.lesson.is_none()
    }

    pub fn matches(&self, word: &Word) -> bool {
        fn field_matches(wanted: Option<&String>, actual: Option<&String>) -> bool {
            match wanted {
                None => true,
                Some(wanted) => {
                    actual.is_some_and(|a| a.trim().eq_ignore_ascii_case(wanted.trim()))
                }
            }
        }

        field_matches(self.category.as_ref(), word.category.as_ref())
            && field_matches(self.lesson.as_ref(), word.lesson.as_ref())
    }
}

/// An ordered collection of words
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub mode: DeckMode,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Deck {
    pub fn new(name: String, mode: DeckMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            mode,
            words: Vec::new(),
        }
    }

    /// Card ids in deck order
    pub fn card_ids(&self) -> Vec<CardId> {
        self.words.iter().map(|w| w.id).collect()
    }

    /// Card ids of the words passing `filter`, in deck order
    pub fn filtered_ids(&self, filter: &WordFilter) -> Vec<CardId> {
        self.words
            .iter()
            .filter(|w| filter.matches(w))
            .map(|w| w.id)
            .collect()
    }

    pub fn word(&self, id: CardId) -> Option<&Word> {
        self.words.iter().find(|w| w.id == id)
    }
}

/// A record of a single review attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub card_id: CardId,
    pub grade: Grade,
    /// Interval assigned by this review (days)
    pub interval_days: u32,
    /// Ease after this review
    pub ease: f64,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn new(
        card_id: CardId,
        state: &CardState,
        grade: Grade,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id,
            grade,
            interval_days: state.interval_days,
            ease: state.ease,
            reviewed_at,
        }
    }

    pub fn is_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.reviewed_at <= now && now - self.reviewed_at < window
    }
}

/// Manual marker on a word that needs extra attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Again,
    Hard,
}

impl FromStr for FlagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "again" => Ok(FlagKind::Again),
            "hard" => Ok(FlagKind::Hard),
            other => Err(format!("Unknown flag: {} (expected again or hard)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFlag {
    pub card_id: CardId,
    pub flag: FlagKind,
    pub created_at: DateTime<Utc>,
}

/// Statistics for a deck
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    /// Never graded
    pub new_cards: usize,
    /// Graded but currently relearning or on their first repetition
    pub learning_cards: usize,
    /// Two or more consecutive successful repetitions
    pub review_cards: usize,
    pub due_cards: usize,
    pub reviews_today: usize,
    pub correct_today: usize,
    pub last_7_days: usize,
    /// Review counts indexed by grade (Again, Hard, Good, Easy)
    pub by_grade: [usize; 4],
}

/// A word with its current state, used for review sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordWithState {
    pub word: Word,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CardState>,
}
