//! Plausibility check for candidate game terms.
//!
//! Rules run in a fixed order and the first decisive rule wins. Whitelist
//! membership is checked after the exclusion lists but before the noise and
//! casing heuristics, so short or irregular known terms (`Aid`, `Half-Orc`)
//! still pass.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::lexicon;

/// Inclusive character-length bounds for any accepted term.
pub const MIN_TERM_LEN: usize = 3;
pub const MAX_TERM_LEN: usize = 50;

/// More than this many characters outside `[A-Za-z\s'\-&]` marks a match as noise.
const MAX_NOISE_CHARS: usize = 2;

/// Generic stopwords that show up capitalized in headings and lists.
const GENERAL: &[&str] = &[
    "Game", "Build", "Guide", "Level", "Act", "Patch", "User", "Community", "Expert", "Best",
    "Top", "Main", "New", "Latest", "Update", "Version",
];

/// Ability score and check abbreviations.
const STAT_CODES: &[&str] = &["STR", "DEX", "CON", "INT", "WIS", "CHA", "AC", "DC", "HP"];

/// Narrative connectives that start sentences.
const CONNECTIVES: &[&str] = &[
    "This", "That", "With", "From", "When", "Where", "What", "How", "Why", "These", "Those",
    "Then", "Also",
];

/// Nouns that belong to the game's setting but never have a useful icon.
const GENRE_NOUNS: &[&str] = &[
    "BG3", "Baldur", "Baldur's Gate", "Baldur's Gate 3", "Gate", "Chapter", "Quest", "NPC",
    "Companion", "Camp", "Rest", "Long Rest", "Short Rest", "Advantage", "Disadvantage",
    "Tadpole", "Party", "Tactician", "Honour Mode", "Early Game", "Late Game", "Pros", "Cons",
];

static EXCLUDED: LazyLock<HashSet<String>> = LazyLock::new(|| {
    [GENERAL, STAT_CODES, CONNECTIVES, GENRE_NOUNS]
        .iter()
        .flat_map(|list| list.iter())
        .map(|w| w.to_lowercase())
        .collect()
});

/// Why a candidate was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Whitelisted,
    Capitalized,
    OfConstruct,
    TitleCasePhrase,
    TooShort,
    TooLong,
    Excluded,
    Noisy,
    NoPattern,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            Self::Whitelisted | Self::Capitalized | Self::OfConstruct | Self::TitleCasePhrase
        )
    }
}

/// Whether the term is on any exclusion list (case-insensitive).
pub fn is_excluded(term: &str) -> bool {
    EXCLUDED.contains(&term.trim().to_lowercase())
}

/// Classify a candidate term.
pub fn validate(term: &str) -> Verdict {
    static CAPITALIZED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[A-Z][a-z]").expect("valid regex"));
    static OF_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?:The\s+)?[A-Z][a-z]+(?:\s+of\s+[A-Z]|'s\s+[A-Z])").expect("valid regex")
    });

    let len = term.chars().count();
    if len < MIN_TERM_LEN {
        return Verdict::TooShort;
    }
    if len > MAX_TERM_LEN {
        return Verdict::TooLong;
    }

    if is_excluded(term) {
        return Verdict::Excluded;
    }

    if lexicon::is_whitelisted(term) {
        return Verdict::Whitelisted;
    }

    let noise = term
        .chars()
        .filter(|c| !(c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '\'' | '-' | '&')))
        .count();
    if noise > MAX_NOISE_CHARS {
        return Verdict::Noisy;
    }

    if CAPITALIZED_RE.is_match(term) && len >= 4 {
        return Verdict::Capitalized;
    }

    if OF_RE.is_match(term) {
        return Verdict::OfConstruct;
    }

    let words: Vec<&str> = term.split_whitespace().collect();
    if words.len() >= 2 && words.iter().all(|w| w.starts_with(|c: char| c.is_uppercase())) {
        return Verdict::TitleCasePhrase;
    }

    Verdict::NoPattern
}

/// Pure predicate: is this a plausible game term?
pub fn is_valid(term: &str) -> bool {
    validate(term).is_accepted()
}
