use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use xuexi_lib::flashcards::algorithm::format_interval;
use xuexi_lib::flashcards::{apply_grade, Grade};

use crate::app::App;
use crate::render::terminal::{grade_color, paint};
use crate::OutputFormat;

pub fn run(
    app: &App,
    deck_path: &Path,
    card: &str,
    grade: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    // Validate before touching any state
    let grade: Grade = grade.parse().context("Invalid grade")?;

    let deck = app.load_deck(deck_path)?;
    let word = app.find_word(&deck, card)?;

    let now = Utc::now();
    let mut state = app.load_state(now)?;
    let outcome = apply_grade(&mut state, word.id, grade, now, app.today(now));

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Plain => {
            println!(
                "{} {} -> {}: next in {} (due {}, ease {:.2})",
                word.hanzi,
                word.pinyin,
                paint(grade.label(), grade_color(grade), use_color),
                format_interval(outcome.next.interval_days),
                outcome.next.due_at.format("%Y-%m-%d %H:%M"),
                outcome.next.ease
            );
            if outcome.was_new {
                println!("  New card ({} introduced today)", state.daily.new_introduced);
            }
        }
    }

    app.save_outcome(&state, &outcome)
}
