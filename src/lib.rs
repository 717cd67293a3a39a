//! Vocabulary flashcards with a spaced repetition scheduler.
//!
//! The scheduling core ([`flashcards::algorithm`], [`flashcards::queue`]) is
//! pure: the clock and the RNG are passed in. Loading and saving learner state
//! happens only through [`flashcards::FlashcardStorage`] and the
//! [`flashcards::SrsStore`] trait.

pub mod config;
pub mod flashcards;

pub use config::{DayBoundary, Settings};
