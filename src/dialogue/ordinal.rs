//! Parsing spoken option references like "option 2", "the second
//! one", or a bare number.

use regex::Regex;

const ORDINAL_WORDS: [(&str, usize); 10] = [
    ("one", 1),
    ("first", 1),
    ("two", 2),
    ("second", 2),
    ("three", 3),
    ("third", 3),
    ("four", 4),
    ("fourth", 4),
    ("five", 5),
    ("fifth", 5),
];

/// First standalone number anywhere in the text. Used when options are
/// on screen and any number the user says is meant as a selection,
/// including out-of-range ones the caller rejects with a re-prompt.
pub fn selection_number(text: &str) -> Option<usize> {
    let re = Regex::new(r"\b(\d+)\b").unwrap();
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn ordinal_word(text: &str) -> Option<usize> {
    let lower = text.to_lowercase();
    let re = Regex::new(r"\b(one|first|two|second|three|third|four|fourth|five|fifth)\b").unwrap();
    let word = re.captures(&lower)?.get(1)?.as_str().to_string();
    ORDINAL_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// Selection reference for the showing-options state: any standalone
/// number, or an ordinal word.
pub fn selection_reference(text: &str) -> Option<usize> {
    selection_number(text).or_else(|| ordinal_word(text))
}

/// Conservative reference for the orchestrator fast path, which fires
/// outside the options prompt: only digits 1-5 or ordinal words count,
/// so "a 30 minute call" doesn't book option 30.
pub fn option_reference(text: &str) -> Option<usize> {
    if let Some(n) = selection_number(text)
        && (1..=5).contains(&n)
    {
        return Some(n);
    }
    ordinal_word(text)
}
