use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use xuexi_lib::flashcards::{
    load_merged, Deck, FlashcardStorage, GradeOutcome, QueueOptions, SrsState, SrsStore, Word,
};
use xuexi_lib::Settings;

/// Shared application state for CLI commands
pub struct App {
    pub settings: Settings,
    pub storage: FlashcardStorage,
    /// Server-synced copy of the learner store, if configured
    pub remote: Option<FlashcardStorage>,
}

/// Overrides taken from global CLI flags
#[derive(Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub learner: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub remote_dir: Option<PathBuf>,
    pub new_daily_cap: Option<u32>,
}

impl App {
    pub fn new(overrides: Overrides) -> Result<Self> {
        let config_path = overrides.config.clone().or_else(Settings::default_path);
        let mut settings = match config_path {
            Some(path) => Settings::load(&path).context("Failed to load config")?,
            None => Settings::default(),
        };

        if let Some(learner) = overrides.learner {
            settings.learner = learner;
        }
        if let Some(dir) = overrides.data_dir {
            settings.data_dir = Some(dir);
        }
        if let Some(dir) = overrides.remote_dir {
            settings.remote_dir = Some(dir);
        }
        if let Some(cap) = overrides.new_daily_cap {
            settings.new_daily_cap = cap;
        }

        let data_dir = match &settings.data_dir {
            Some(dir) => dir.clone(),
            None => FlashcardStorage::default_data_dir().context("Failed to get data directory")?,
        };
        let storage = FlashcardStorage::new(data_dir);
        let remote = settings.remote_dir.clone().map(FlashcardStorage::new);

        Ok(Self {
            settings,
            storage,
            remote,
        })
    }

    pub fn learner(&self) -> &str {
        &self.settings.learner
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.settings.today(now)
    }

    pub fn queue_options(&self) -> QueueOptions {
        self.settings.queue_options()
    }

    pub fn load_deck(&self, path: &Path) -> Result<Deck> {
        FlashcardStorage::load_deck(path).with_context(|| format!("Failed to load deck {:?}", path))
    }

    /// Find a word by id, or by exact hanzi / case-insensitive pinyin
    pub fn find_word<'a>(&self, deck: &'a Deck, query: &str) -> Result<&'a Word> {
        if let Ok(id) = Uuid::parse_str(query) {
            return deck
                .word(id)
                .with_context(|| format!("No card with id {} in deck '{}'", id, deck.name));
        }

        let query_lower = query.to_lowercase();
        let matches: Vec<&Word> = deck
            .words
            .iter()
            .filter(|w| w.hanzi == query || w.pinyin.to_lowercase() == query_lower)
            .collect();

        match matches.len() {
            0 => bail!("No card matching '{}' in deck '{}'", query, deck.name),
            1 => Ok(matches[0]),
            _ => bail!(
                "Ambiguous card '{}'. Matches:\n{}",
                query,
                matches
                    .iter()
                    .map(|w| format!("  - {} {} ({})", w.hanzi, w.pinyin, w.id))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    /// Load the learner state, local cache merged with the remote copy
    pub fn load_state(&self, now: DateTime<Utc>) -> Result<SrsState> {
        let remote = self.remote.as_ref().map(|r| r as &dyn SrsStore);
        load_merged(&self.storage, remote, self.learner(), self.today(now))
            .context("Failed to load learner state")
    }

    /// Persist a graded card locally, then push it to the remote copy
    pub fn save_outcome(&self, state: &SrsState, outcome: &GradeOutcome) -> Result<()> {
        self.storage
            .save_outcome(self.learner(), state, outcome)
            .context("Failed to save review")?;

        if let Some(remote) = &self.remote {
            let pushed = remote
                .upsert_card_states(self.learner(), &[(outcome.card_id, outcome.next.clone())])
                .and_then(|_| remote.save_daily(self.learner(), &state.daily));
            if let Err(e) = pushed {
                log::warn!("Failed to push review to remote store: {}", e);
            }
        }

        Ok(())
    }
}
