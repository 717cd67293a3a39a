use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use rand::Rng;

use xuexi_lib::flashcards::algorithm::preview_intervals;
use xuexi_lib::flashcards::{DeckMode, Grade, ReviewSession, SessionQueue, WordFilter};

use crate::app::App;
use crate::render::terminal::{paint, render_back, render_front, render_grade_prompt, Color};

pub fn run(
    app: &App,
    deck_path: &Path,
    mode: Option<DeckMode>,
    limit: Option<usize>,
    filter: &WordFilter,
    use_color: bool,
) -> Result<()> {
    let deck = app.load_deck(deck_path)?;
    let mode = mode.unwrap_or(deck.mode);
    let ids = deck.filtered_ids(filter);
    let options = app.queue_options();

    let now = Utc::now();
    let mut state = app.load_state(now)?;
    let queue = SessionQueue::build(
        &ids,
        &state.per_card,
        &state.daily,
        mode,
        &options,
        now,
        app.today(now),
    );
    if queue.is_empty() {
        println!("Add some words to practice.");
        return Ok(());
    }
    if queue.fallback {
        println!("Nothing due right now; practicing all {} cards.", queue.len());
    }

    // Linear decks start from the top, anything else at a random card
    let start = match mode {
        DeckMode::Linear => 0,
        _ => rand::thread_rng().gen_range(0..queue.len()),
    };
    let mut session = ReviewSession::starting_at(queue, start);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(card_id) = session.current() {
        if limit.map_or(false, |max| session.reviewed() >= max) {
            break;
        }
        let Some(word) = deck.word(card_id) else {
            break;
        };

        println!(
            "\n{}",
            paint(
                &format!("Card {} / {}", session.position() + 1, session.queue().len()),
                Color::GRAY,
                use_color
            )
        );
        println!("{}", render_front(word, use_color));
        print!("{}", paint("Press Enter to reveal (q to quit) ", Color::DIM, use_color));
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        if line?.trim() == "q" {
            break;
        }

        println!("{}", render_back(word, use_color));
        let previews = preview_intervals(state.per_card.get(&card_id), Utc::now());
        println!("{}", render_grade_prompt(previews, use_color));

        let grade = loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                return finish(&session, use_color);
            };
            let line = line?;
            let input = line.trim();
            if input == "q" {
                return finish(&session, use_color);
            }
            // Digits are keyboard shortcuts (1-4), words are grade names
            let parsed = match input {
                "1" | "2" | "3" | "4" => input.chars().next().and_then(Grade::from_key),
                _ if input.chars().all(|c| c.is_ascii_digit()) => None,
                _ => input.parse::<Grade>().ok(),
            };
            match parsed {
                Some(grade) => break grade,
                None => println!("Enter 1-4 or again/hard/good/easy"),
            }
        };

        let now = Utc::now();
        let today = app.today(now);
        let Some(outcome) = session.grade_current(&mut state, grade, now, today) else {
            break;
        };
        // The in-memory state stays authoritative for this session even if saving fails
        if let Err(e) = app.save_outcome(&state, &outcome) {
            log::error!("{:#}", e);
            eprintln!("Warning: review not saved: {:#}", e);
        }

        if mode == DeckMode::SpacedRepetition {
            let rebuilt = SessionQueue::build(
                &ids,
                &state.per_card,
                &state.daily,
                mode,
                &options,
                now,
                today,
            );
            session.replace_queue(rebuilt);
        }
    }

    finish(&session, use_color)
}

fn finish(session: &ReviewSession, use_color: bool) -> Result<()> {
    let summary = format!(
        "\nReviewed: {} · Accuracy: {}%",
        session.reviewed(),
        session.accuracy()
    );
    println!("{}", paint(&summary, Color::BOLD, use_color));
    Ok(())
}
