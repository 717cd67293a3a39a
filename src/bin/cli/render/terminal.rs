use xuexi_lib::flashcards::algorithm::{format_interval, AGAIN_DELAY_MINUTES};
use xuexi_lib::flashcards::{CardState, Grade, Word};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn grade_color(grade: Grade) -> &'static str {
    match grade {
        Grade::Again => Color::RED,
        Grade::Hard => Color::YELLOW,
        Grade::Good => Color::GREEN,
        Grade::Easy => Color::CYAN,
    }
}

/// Front of a card: hanzi and pinyin
pub fn render_front(word: &Word, use_color: bool) -> String {
    format!(
        "{}\n{}",
        paint(&word.hanzi, Color::BOLD, use_color),
        paint(&word.pinyin, Color::DIM, use_color)
    )
}

/// Back of a card: translation and optional notes
pub fn render_back(word: &Word, use_color: bool) -> String {
    let mut out = paint(&word.english, Color::BOLD, use_color);
    if let Some(desc) = word.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push('\n');
        out.push_str(&paint(desc, Color::GRAY, use_color));
    }
    out
}

/// One-line summary of a word and its schedule
pub fn render_word_line(word: &Word, state: Option<&CardState>, use_color: bool) -> String {
    let schedule = match state {
        None => paint("new", Color::BLUE, use_color),
        Some(s) => {
            let interval = format_interval(s.interval_days);
            let due = s.due_at.format("%Y-%m-%d %H:%M").to_string();
            match s.last_grade {
                Some(g) => format!(
                    "{} {} due {}",
                    paint(g.label(), grade_color(g), use_color),
                    interval,
                    due
                ),
                None => format!("{} due {}", interval, due),
            }
        }
    };
    format!("{}  {}  {}  [{}]", word.hanzi, word.pinyin, word.english, schedule)
}

/// Grade choices with the interval each would assign
pub fn render_grade_prompt(previews: [u32; 4], use_color: bool) -> String {
    Grade::ALL
        .iter()
        .zip(previews.iter())
        .map(|(grade, days)| {
            let wait = match grade {
                Grade::Again => format!("{}m", AGAIN_DELAY_MINUTES),
                _ => format_interval(*days),
            };
            format!(
                "[{}] {} ({})",
                grade.as_u8() + 1,
                paint(grade.label(), grade_color(*grade), use_color),
                wait
            )
        })
        .collect::<Vec<_>>()
        .join("  ")
}
