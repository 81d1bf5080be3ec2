//! Flashcard parsing and rendering.
//!
//! The model is asked for one `Q: question | A: answer` pair per line. It
//! does not always comply: numbering, bullets, bold markers and the Spanish
//! `P:` / `R:` labels all show up in practice. Parsing is lenient about
//! decoration and strict about the two-part shape; anything that does not
//! split into a question and an answer is kept as raw text so nothing the
//! model produced is lost from the rendered file.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// A line of flashcard output: either a parsed card or verbatim text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashcardLine {
    Card(Flashcard),
    Raw(String),
}

// Optional list marker, optional bold, the question label, then everything
// up to the `|` separator and the answer label.
static RE_CARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:[-*•]\s*|\d+[.)]\s*)?(?:\*\*)?(?:Q|P|Question|Pregunta)\s*(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.+?)\s*\|\s*(?:\*\*)?(?:A|R|Answer|Respuesta)\s*(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.+)$",
    )
    .expect("flashcard regex is valid")
});

/// Parse a single line, `None` if it is not a well-formed card.
pub fn parse_line(line: &str) -> Option<Flashcard> {
    let caps = RE_CARD.captures(line.trim())?;
    let question = caps[1].trim().trim_end_matches("**").trim().to_string();
    let answer = caps[2].trim().trim_end_matches("**").trim().to_string();
    if question.is_empty() || answer.is_empty() {
        return None;
    }
    Some(Flashcard { question, answer })
}

/// Classify every non-blank line of generated flashcard text.
pub fn parse_lines(text: &str) -> Vec<FlashcardLine> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| match parse_line(l) {
            Some(card) => FlashcardLine::Card(card),
            None => FlashcardLine::Raw(l.to_string()),
        })
        .collect()
}

/// Only the well-formed cards.
pub fn parse_flashcards(text: &str) -> Vec<Flashcard> {
    parse_lines(text)
        .into_iter()
        .filter_map(|line| match line {
            FlashcardLine::Card(card) => Some(card),
            FlashcardLine::Raw(_) => None,
        })
        .collect()
}

/// Render `flashcards.md`: a numbered section per card, raw lines kept as-is.
pub fn render_flashcards_markdown(text: &str) -> String {
    let mut out = String::from("# Flashcards\n\n");
    let mut n = 0usize;
    for line in parse_lines(text) {
        match line {
            FlashcardLine::Card(card) => {
                n += 1;
                out.push_str(&format!(
                    "## Card {n}\n\n**Question:** {}\n\n**Answer:** {}\n\n",
                    card.question, card.answer
                ));
            }
            FlashcardLine::Raw(raw) => {
                out.push_str(&raw);
                out.push_str("\n\n");
            }
        }
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_english_labels() {
        let card = parse_line("Q: What is a stack? | A: A LIFO structure").unwrap();
        assert_eq!(card.question, "What is a stack?");
        assert_eq!(card.answer, "A LIFO structure");
    }

    #[test]
    fn parses_spanish_labels() {
        let card = parse_line("P: ¿Qué es una cola? | R: Una estructura FIFO").unwrap();
        assert_eq!(card.question, "¿Qué es una cola?");
        assert_eq!(card.answer, "Una estructura FIFO");
    }

    #[test]
    fn tolerates_numbering_and_bold() {
        let card = parse_line("3. **Q:** Big-O of binary search? | **A:** O(log n)").unwrap();
        assert_eq!(card.question, "Big-O of binary search?");
        assert_eq!(card.answer, "O(log n)");

        let card = parse_line("- q: lower case? | a: yes").unwrap();
        assert_eq!(card.answer, "yes");
    }

    #[test]
    fn rejects_lines_without_answer() {
        assert!(parse_line("Q: dangling question").is_none());
        assert!(parse_line("Here are your flashcards:").is_none());
    }

    #[test]
    fn parse_flashcards_skips_prose() {
        let text = "Here are your flashcards:\n\nQ: one | A: 1\nQ: two | A: 2\n";
        let cards = parse_flashcards(text);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].question, "two");
    }

    #[test]
    fn render_numbers_cards_and_keeps_raw_lines() {
        let md = render_flashcards_markdown("Intro line\nQ: one | A: 1\nQ: two | A: 2");
        assert_eq!(
            md,
            "# Flashcards\n\nIntro line\n\n## Card 1\n\n**Question:** one\n\n**Answer:** 1\n\n\
## Card 2\n\n**Question:** two\n\n**Answer:** 2\n"
        );
    }
}
