//! Storage operations for learner scheduling state
//!
//! Directory structure per learner:
//! ```text
//! learners/{learner}/
//! ├── daily.json           # New-card counter for the current day
//! ├── reviews.json         # Append-only review log
//! ├── flags.json           # Again/Hard markers
//! └── states/
//!     └── {card-id}.json   # Card spaced repetition state
//! ```
//!
//! Unreadable files are skipped so a damaged cache never blocks practice. A
//! card with a corrupt state file is treated as new. A corrupt review log or
//! flag list reads as empty, and is moved aside to `{name}.corrupt-{time}`
//! before the next write replaces it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use super::models::*;
use super::session::GradeOutcome;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid learner id: {0:?}")]
    InvalidLearner(String),

    #[error("Deck file not found: {0}")]
    DeckNotFound(PathBuf),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Load/save interface for learner scheduling state
///
/// Implemented by the local file store. A server-synced backend implements
/// the same trait and is merged over the local one at load time.
pub trait SrsStore {
    fn load_card_states(&self, learner: &str) -> Result<HashMap<CardId, CardState>>;

    /// Write the given rows. Writing the same state twice has no further effect.
    fn upsert_card_states(&self, learner: &str, states: &[(CardId, CardState)]) -> Result<()>;

    /// Counter for `today`; `None` when the store has never recorded one
    fn load_daily(&self, learner: &str, today: NaiveDate) -> Result<Option<DailyCounter>>;

    fn save_daily(&self, learner: &str, daily: &DailyCounter) -> Result<()>;
}

/// File-backed storage for scheduling state, review history and flags
pub struct FlashcardStorage {
    /// Base data directory (e.g., ~/.local/share/xuexi)
    base_path: PathBuf,
}

impl FlashcardStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("xuexi"))
            .ok_or(FlashcardStorageError::DataDirNotFound)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the directory for a learner
    fn learner_dir(&self, learner: &str) -> Result<PathBuf> {
        let valid = !learner.is_empty()
            && learner
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && learner != "."
            && learner != "..";
        if !valid {
            return Err(FlashcardStorageError::InvalidLearner(learner.to_string()));
        }
        Ok(self.base_path.join("learners").join(learner))
    }

    fn states_dir(&self, learner: &str) -> Result<PathBuf> {
        Ok(self.learner_dir(learner)?.join("states"))
    }

    fn state_path(&self, learner: &str, card_id: CardId) -> Result<PathBuf> {
        Ok(self.states_dir(learner)?.join(format!("{}.json", card_id)))
    }

    fn daily_path(&self, learner: &str) -> Result<PathBuf> {
        Ok(self.learner_dir(learner)?.join("daily.json"))
    }

    fn reviews_path(&self, learner: &str) -> Result<PathBuf> {
        Ok(self.learner_dir(learner)?.join("reviews.json"))
    }

    fn flags_path(&self, learner: &str) -> Result<PathBuf> {
        Ok(self.learner_dir(learner)?.join("flags.json"))
    }

    /// Initialize storage for a learner
    pub fn init(&self, learner: &str) -> Result<()> {
        fs::create_dir_all(self.states_dir(learner)?)?;
        Ok(())
    }

    // ==================== State Operations ====================

    /// Load the learner's full scheduling state, with the counter for `today`
    pub fn load_state(&self, learner: &str, today: NaiveDate) -> Result<SrsState> {
        load_merged(self, None, learner, today)
    }

    /// Persist a graded card: its new state, the daily counter and the review log
    pub fn save_outcome(
        &self,
        learner: &str,
        state: &SrsState,
        outcome: &GradeOutcome,
    ) -> Result<()> {
        self.upsert_card_states(learner, &[(outcome.card_id, outcome.next.clone())])?;
        self.save_daily(learner, &state.daily)?;
        self.append_review(
            learner,
            ReviewRecord::new(outcome.card_id, &outcome.next, outcome.grade, outcome.reviewed_at),
        )?;
        Ok(())
    }

    // ==================== Review Log ====================

    /// List all reviews for a learner, oldest first
    pub fn list_reviews(&self, learner: &str) -> Result<Vec<ReviewRecord>> {
        let path = self.reviews_path(learner)?;
        Ok(read_json_list(&path)?.unwrap_or_default())
    }

    pub fn append_review(&self, learner: &str, record: ReviewRecord) -> Result<()> {
        self.init(learner)?;
        let path = self.reviews_path(learner)?;
        let mut reviews: Vec<ReviewRecord> = read_json_list_for_update(&path)?;
        reviews.push(record);
        fs::write(&path, serde_json::to_string_pretty(&reviews)?)?;
        Ok(())
    }

    // ==================== Flags ====================

    /// List flags, newest first
    pub fn list_flags(&self, learner: &str) -> Result<Vec<ReviewFlag>> {
        let path = self.flags_path(learner)?;
        let mut flags: Vec<ReviewFlag> = read_json_list(&path)?.unwrap_or_default();
        flags.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(flags)
    }

    /// Create or replace the flag on a card
    pub fn set_flag(&self, learner: &str, card_id: CardId, flag: FlagKind) -> Result<ReviewFlag> {
        self.init(learner)?;
        let mut flags: Vec<ReviewFlag> = read_json_list_for_update(&self.flags_path(learner)?)?;
        flags.retain(|f| f.card_id != card_id);

        let created = ReviewFlag {
            card_id,
            flag,
            created_at: Utc::now(),
        };
        flags.push(created.clone());
        self.save_flags(learner, &flags)?;
        Ok(created)
    }

    /// Remove the flag on a card; returns whether one existed
    pub fn clear_flag(&self, learner: &str, card_id: Uuid) -> Result<bool> {
        let mut flags: Vec<ReviewFlag> = read_json_list_for_update(&self.flags_path(learner)?)?;
        let before = flags.len();
        flags.retain(|f| f.card_id != card_id);
        if flags.len() == before {
            return Ok(false);
        }
        self.save_flags(learner, &flags)?;
        Ok(true)
    }

    fn save_flags(&self, learner: &str, flags: &[ReviewFlag]) -> Result<()> {
        fs::write(self.flags_path(learner)?, serde_json::to_string_pretty(flags)?)?;
        Ok(())
    }

    // ==================== Decks ====================

    /// Read a deck file
    pub fn load_deck(path: &Path) -> Result<Deck> {
        if !path.exists() {
            return Err(FlashcardStorageError::DeckNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let deck: Deck = serde_json::from_str(&content)?;
        Ok(deck)
    }
}

/// Read a JSON list file; `None` when the file exists but cannot be parsed
fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        return Ok(Some(Vec::new()));
    }

    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(items) => Ok(Some(items)),
        Err(e) => {
            log::warn!("Ignoring corrupt file {:?}: {}", path, e);
            Ok(None)
        }
    }
}

/// Read a JSON list file that is about to be rewritten
///
/// A corrupt file is moved aside first so the rewrite never discards it.
fn read_json_list_for_update<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if let Some(items) = read_json_list(path)? {
        return Ok(items);
    }

    let backup = corrupt_backup_path(path);
    fs::rename(path, &backup)?;
    log::warn!("Moved corrupt {:?} to {:?}", path, backup);
    Ok(Vec::new())
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    path.with_file_name(format!("{}.corrupt-{}", name, stamp))
}

impl SrsStore for FlashcardStorage {
    fn load_card_states(&self, learner: &str) -> Result<HashMap<CardId, CardState>> {
        let states_dir = self.states_dir(learner)?;
        let mut states = HashMap::new();
        if !states_dir.exists() {
            return Ok(states);
        }

        for entry in fs::read_dir(&states_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }

            let Some(card_id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Uuid::parse_str(stem).ok())
            else {
                log::warn!("Skipping state file with unexpected name {:?}", path);
                continue;
            };

            let parsed = fs::read_to_string(&path)
                .map_err(FlashcardStorageError::from)
                .and_then(|content| Ok(serde_json::from_str::<CardState>(&content)?));
            match parsed {
                Ok(state) => {
                    states.insert(card_id, state);
                }
                Err(e) => log::warn!("Ignoring corrupt card state {:?}: {}", path, e),
            }
        }

        Ok(states)
    }

    fn upsert_card_states(&self, learner: &str, states: &[(CardId, CardState)]) -> Result<()> {
        self.init(learner)?;
        for (card_id, state) in states {
            let path = self.state_path(learner, *card_id)?;
            fs::write(&path, serde_json::to_string_pretty(state)?)?;
        }
        Ok(())
    }

    fn load_daily(&self, learner: &str, today: NaiveDate) -> Result<Option<DailyCounter>> {
        let path = self.daily_path(learner)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<DailyCounter>(&content) {
            Ok(counter) => Ok(Some(counter.for_day(today))),
            Err(e) => {
                log::warn!("Resetting corrupt daily counter {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn save_daily(&self, learner: &str, daily: &DailyCounter) -> Result<()> {
        self.init(learner)?;
        fs::write(self.daily_path(learner)?, serde_json::to_string_pretty(daily)?)?;
        Ok(())
    }
}

/// Merge two state maps; remote rows replace local rows for the same card
pub fn merge_states(
    local: HashMap<CardId, CardState>,
    remote: HashMap<CardId, CardState>,
) -> HashMap<CardId, CardState> {
    let mut merged = local;
    merged.extend(remote);
    merged
}

/// Load a learner's state from the local store with an optional remote store
/// taking precedence
///
/// Remote rows override local rows card by card, and a remote daily counter
/// replaces the local one. A failing remote is logged and ignored so practice
/// continues from the local cache.
pub fn load_merged(
    local: &dyn SrsStore,
    remote: Option<&dyn SrsStore>,
    learner: &str,
    today: NaiveDate,
) -> Result<SrsState> {
    let mut state = SrsState::new(today);
    state.per_card = local.load_card_states(learner)?;
    if let Some(daily) = local.load_daily(learner, today)? {
        state.daily = daily;
    }

    let Some(remote) = remote else {
        return Ok(state);
    };

    let remote_states = match remote.load_card_states(learner) {
        Ok(states) => states,
        Err(e) => {
            log::warn!("Remote state unavailable, using local cache: {}", e);
            HashMap::new()
        }
    };
    let remote_daily = remote.load_daily(learner, today).unwrap_or_else(|e| {
        log::warn!("Remote daily counter unavailable: {}", e);
        None
    });

    log::info!(
        "Merged {} local and {} remote card states for {}",
        state.per_card.len(),
        remote_states.len(),
        learner
    );

    state.per_card = merge_states(std::mem::take(&mut state.per_card), remote_states);
    if let Some(daily) = remote_daily {
        state.daily = daily;
    }
    Ok(state)
}
