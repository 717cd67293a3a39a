use std::path::Path;

use anyhow::{anyhow, Context, Result};

use xuexi_lib::flashcards::FlagKind;

use crate::app::App;
use crate::OutputFormat;

pub fn run_set(
    app: &App,
    deck_path: &Path,
    card: &str,
    flag: &str,
    format: &OutputFormat,
) -> Result<()> {
    let flag: FlagKind = flag.parse().map_err(|e: String| anyhow!(e))?;

    let deck = app.load_deck(deck_path)?;
    let word = app.find_word(&deck, card)?;
    let created = app
        .storage
        .set_flag(app.learner(), word.id, flag)
        .context("Failed to save flag")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        OutputFormat::Plain => {
            println!("Flagged {} {} as {:?}", word.hanzi, word.pinyin, created.flag);
        }
    }

    Ok(())
}

pub fn run_clear(app: &App, deck_path: &Path, card: &str) -> Result<()> {
    let deck = app.load_deck(deck_path)?;
    let word = app.find_word(&deck, card)?;

    if app.storage.clear_flag(app.learner(), word.id)? {
        println!("Cleared flag on {}", word.hanzi);
    } else {
        println!("{} was not flagged", word.hanzi);
    }

    Ok(())
}

pub fn run_list(app: &App, deck_path: &Path, format: &OutputFormat) -> Result<()> {
    let deck = app.load_deck(deck_path)?;
    let flags = app.storage.list_flags(app.learner())?;

    let rows: Vec<serde_json::Value> = flags
        .iter()
        .filter_map(|f| deck.word(f.card_id).map(|w| (f, w)))
        .map(|(f, w)| {
            serde_json::json!({
                "cardId": f.card_id.to_string(),
                "flag": f.flag,
                "createdAt": f.created_at.to_rfc3339(),
                "hanzi": w.hanzi,
                "pinyin": w.pinyin,
                "english": w.english,
            })
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No flagged cards.");
                return Ok(());
            }
            for row in &rows {
                println!(
                    "[{}] {}  {}  {}",
                    row["flag"].as_str().unwrap_or_default(),
                    row["hanzi"].as_str().unwrap_or_default(),
                    row["pinyin"].as_str().unwrap_or_default(),
                    row["english"].as_str().unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
