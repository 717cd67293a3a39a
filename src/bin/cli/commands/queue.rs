use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use xuexi_lib::flashcards::queue::remaining_new;
use xuexi_lib::flashcards::{DeckMode, SessionQueue, WordFilter};

use crate::app::App;
use crate::render::terminal::{paint, render_word_line, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    deck_path: &Path,
    mode: Option<DeckMode>,
    seed: Option<u64>,
    filter: &WordFilter,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.load_deck(deck_path)?;
    let now = Utc::now();
    let today = app.today(now);
    let state = app.load_state(now)?;
    let mode = mode.unwrap_or(deck.mode);
    let ids = deck.filtered_ids(filter);
    let options = app.queue_options();
    let introduced = state.daily.for_day(today).new_introduced;

    let queue = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            SessionQueue::build_with_rng(
                &ids,
                &state.per_card,
                &state.daily,
                mode,
                &options,
                now,
                today,
                &mut rng,
            )
        }
        None => SessionQueue::build(
            &ids,
            &state.per_card,
            &state.daily,
            mode,
            &options,
            now,
            today,
        ),
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "deck": deck.name,
                "mode": mode,
                "fallback": queue.fallback,
                "newIntroducedToday": introduced,
                "newRemainingToday": remaining_new(&state.daily, &options, today),
                "cards": queue
                    .cards
                    .iter()
                    .filter_map(|id| deck.word(*id))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if queue.is_empty() {
                if filter.is_empty() {
                    println!("Deck '{}' has no cards.", deck.name);
                } else {
                    println!("No cards in deck '{}' match the filter.", deck.name);
                }
                return Ok(());
            }
            if queue.fallback {
                println!("Nothing due right now; practicing all {} cards.", queue.len());
            }
            for (i, id) in queue.cards.iter().enumerate() {
                if let Some(word) = deck.word(*id) {
                    let line = render_word_line(word, state.per_card.get(id), use_color);
                    println!("{:>3}. {}", i + 1, line);
                }
            }
            let summary = format!(
                "\n{} cards queued ({} new introduced today, cap {})",
                queue.len(),
                introduced,
                options.new_daily_cap
            );
            println!("{}", paint(&summary, Color::GRAY, use_color));
        }
    }

    Ok(())
}
