//! Vocabulary flashcards with spaced repetition
//!
//! This module provides:
//! - The grade-driven scheduler (next state for a graded card)
//! - Practice queue construction (linear, random, spaced repetition)
//! - Review sessions over a queue
//! - Learner state storage and local/remote merging
//! - Review statistics

pub mod algorithm;
pub mod models;
pub mod queue;
pub mod session;
pub mod stats;
pub mod storage;

pub use models::*;
pub use queue::{build_queue, build_queue_with_rng, QueueOptions, SessionQueue};
pub use session::{apply_grade, GradeOutcome, ReviewSession};
pub use storage::{load_merged, merge_states, FlashcardStorage, FlashcardStorageError, SrsStore};
