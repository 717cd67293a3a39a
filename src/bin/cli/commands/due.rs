use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use xuexi_lib::flashcards::algorithm::is_due;
use xuexi_lib::flashcards::queue::remaining_new;
use xuexi_lib::flashcards::{WordFilter, WordWithState};

use crate::app::App;
use crate::render::terminal::render_word_line;
use crate::OutputFormat;

pub fn run(
    app: &App,
    deck_path: &Path,
    only_due: bool,
    filter: &WordFilter,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.load_deck(deck_path)?;
    let now = Utc::now();
    let state = app.load_state(now)?;
    let new_remaining = remaining_new(&state.daily, &app.queue_options(), app.today(now));
    let words: Vec<_> = deck.words.iter().filter(|w| filter.matches(w)).collect();

    let mut rows: Vec<WordWithState> = words
        .iter()
        .filter(|w| !only_due || is_due(state.per_card.get(&w.id), now))
        .map(|&w| WordWithState {
            word: w.clone(),
            state: state.per_card.get(&w.id).cloned(),
        })
        .collect();

    // New cards last, otherwise soonest due first
    rows.sort_by_key(|r| (r.state.is_none(), r.state.as_ref().map(|s| s.due_at)));

    let due_now = words
        .iter()
        .filter(|w| is_due(state.per_card.get(&w.id), now))
        .count();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dueNow": due_now,
                "newRemainingToday": new_remaining,
                "cards": rows,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No cards.");
                return Ok(());
            }
            for row in &rows {
                println!("{}", render_word_line(&row.word, row.state.as_ref(), use_color));
            }
            println!(
                "\nDue now: {} · New cards left today: {}",
                due_now, new_remaining
            );
        }
    }

    Ok(())
}
