//! Ordered spelling variants for wiki lookups.

/// Variants this short are never sent to the wiki.
const MIN_VARIANT_LEN: usize = 3;

/// Words at or below this length are skipped by [`VariantStrategy::SignificantWords`].
const SHORT_WORD_LEN: usize = 3;

/// One rule that derives lookup spellings from a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStrategy {
    /// The term as written.
    Verbatim,
    /// Spaces replaced by underscores (`Misty_Step`).
    Underscored,
    /// Spaces removed (`MistyStep`).
    Compact,
    Lowercase,
    /// Each word capitalized, rest lowercased.
    TitleCase,
    NoApostrophes,
    HyphensAsSpaces,
    AmpersandAsAnd,
    /// Every word longer than three characters, for multi-word terms.
    SignificantWords,
    /// First and last word, for multi-word terms.
    FirstLast,
}

impl VariantStrategy {
    /// The standard lookup order.
    pub const DEFAULT_ORDER: [Self; 10] = [
        Self::Verbatim,
        Self::Underscored,
        Self::Compact,
        Self::Lowercase,
        Self::TitleCase,
        Self::NoApostrophes,
        Self::HyphensAsSpaces,
        Self::AmpersandAsAnd,
        Self::SignificantWords,
        Self::FirstLast,
    ];

    /// Spellings produced by this rule, possibly none.
    pub fn apply(self, term: &str) -> Vec<String> {
        let words: Vec<&str> = term.split_whitespace().collect();
        match self {
            Self::Verbatim => vec![term.to_string()],
            Self::Underscored => vec![term.replace(' ', "_")],
            Self::Compact => vec![term.replace(' ', "")],
            Self::Lowercase => vec![term.to_lowercase()],
            Self::TitleCase => vec![title_case(term)],
            Self::NoApostrophes => vec![term.replace('\'', "")],
            Self::HyphensAsSpaces => vec![term.replace('-', " ")],
            Self::AmpersandAsAnd => vec![term.replace('&', "and")],
            Self::SignificantWords if words.len() > 1 => words
                .iter()
                .filter(|w| w.chars().count() > SHORT_WORD_LEN)
                .map(|w| w.to_string())
                .collect(),
            Self::FirstLast if words.len() > 1 => {
                vec![format!("{} {}", words[0], words[words.len() - 1])]
            }
            Self::SignificantWords | Self::FirstLast => Vec::new(),
        }
    }
}

/// Uppercase the first letter of each word and lowercase the rest.
/// Apostrophes stay inside the word, so `hunter's` becomes `Hunter's`.
fn title_case(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut in_word = false;
    for c in term.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = c == '\'' && in_word;
        }
    }
    out
}

/// Applies strategies in order, de-duplicating and dropping short spellings.
#[derive(Debug, Clone)]
pub struct VariantGenerator {
    strategies: Vec<VariantStrategy>,
}

impl VariantGenerator {
    pub fn new(strategies: impl IntoIterator<Item = VariantStrategy>) -> Self {
        Self {
            strategies: strategies.into_iter().collect(),
        }
    }

    /// All distinct variants for `term`, in strategy order.
    pub fn variants(&self, term: &str) -> Vec<String> {
        let term = term.trim();
        let mut out: Vec<String> = Vec::new();
        for strategy in &self.strategies {
            for variant in strategy.apply(term) {
                if variant.chars().count() >= MIN_VARIANT_LEN && !out.contains(&variant) {
                    out.push(variant);
                }
            }
        }
        out
    }
}

impl Default for VariantGenerator {
    fn default() -> Self {
        Self::new(VariantStrategy::DEFAULT_ORDER)
    }
}
