use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use xuexi_lib::flashcards::stats::compute_stats;
use xuexi_lib::flashcards::Grade;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, deck_path: &Path, format: &OutputFormat) -> Result<()> {
    let deck = app.load_deck(deck_path)?;
    let now = Utc::now();
    let state = app.load_state(now)?;
    let ids = deck.card_ids();

    // Only reviews of cards in this deck
    let reviews: Vec<_> = app
        .storage
        .list_reviews(app.learner())
        .context("Failed to read review log")?
        .into_iter()
        .filter(|r| ids.contains(&r.card_id))
        .collect();

    let stats = compute_stats(&ids, &state.per_card, &reviews, now, app.settings.day_boundary);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("Deck: {}", deck.name);
            println!("  Cards:     {}", stats.total_cards);
            println!("  New:       {}", stats.new_cards);
            println!("  Learning:  {}", stats.learning_cards);
            println!("  Review:    {}", stats.review_cards);
            println!("  Due now:   {}", stats.due_cards);
            println!();
            let accuracy = if stats.reviews_today == 0 {
                0
            } else {
                stats.correct_today * 100 / stats.reviews_today
            };
            println!("  Today:        {} reviews ({}% correct)", stats.reviews_today, accuracy);
            println!("  Last 7 days:  {}", stats.last_7_days);
            println!();
            println!("  By grade:");
            for grade in Grade::ALL {
                println!("    {:<6} {}", grade.label(), stats.by_grade[grade.as_u8() as usize]);
            }
        }
    }

    Ok(())
}
