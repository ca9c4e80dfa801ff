//! Regex-driven term extraction.
//!
//! An extractor is an ordered list of [`TermPattern`]s plus two optional
//! lexicon scans. Every capture is trimmed, scope-checked, and run through
//! the validator; survivors are unioned into an ordered candidate list.
//! Pattern order only affects the per-pattern statistics.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use guidepress_shared::{Candidate, GuideError, Result};

use crate::lexicon::{self, LexiconEntry};
use crate::validator;

/// Number of sample matches kept per pattern for diagnostics.
const SAMPLE_SIZE: usize = 3;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// A named regex whose capture group 1 (or the whole match) yields a term.
#[derive(Debug, Clone)]
pub struct TermPattern {
    name: String,
    regex: Regex,
}

impl TermPattern {
    /// Compile a pattern. Invalid regex syntax is a validation error.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern)
            .map_err(|e| GuideError::validation(format!("pattern {name}: {e}")))?;
        Ok(Self { name, regex })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn captures<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.regex.captures_iter(text).filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str())
        })
    }
}

fn builtin(name: &str, pattern: &str) -> TermPattern {
    TermPattern {
        name: name.to_string(),
        regex: Regex::new(pattern).expect("valid regex"),
    }
}

// Literal spaces instead of `\s` keep every match on one line.
static ENGLISH_PATTERNS: LazyLock<Vec<TermPattern>> = LazyLock::new(|| {
    vec![
        builtin("hangul_gloss", r"[가-힣][가-힣 ]*\(([A-Z][A-Za-z '\-&]+)\)"),
        builtin("paren_name", r"\(([A-Z][A-Za-z '\-&]+)\)"),
        builtin(
            "colon_name",
            r":[ ]*([A-Z][A-Za-z'\-&]*(?: (?:of|the|[A-Z][A-Za-z'\-&]*)){0,4})",
        ),
        builtin("of_construct", r"\b((?:The )?[A-Z][a-z]+(?: of [A-Z][a-z]+)+)\b"),
        builtin("armor_suffix", r"\b([A-Z][a-z]+ (?:Splint )?Armor)\b"),
        builtin(
            "gear_suffix",
            r"\b([A-Z][a-z]+(?: [A-Z][a-z]+)* (?:Staff|Helm|Boots|Cloak|Ring|Amulet))\b",
        ),
        builtin(
            "spell_suffix",
            r"\b((?:Mass )?[A-Z][a-z]+ (?:Wounds|Word|Flame|Guardians|Ward|Strike|Intervention|Feast))\b",
        ),
        builtin("feature_suffix", r"\b([A-Z][a-z]+ (?:Domain|Dwarf|Artisan|Caster))\b"),
        builtin("proper_noun_run", r"\b([A-Z][a-z]+(?: [A-Z][a-z]+){1,3})\b"),
    ]
});

static MARKDOWN_PATTERNS: LazyLock<Vec<TermPattern>> = LazyLock::new(|| {
    vec![
        builtin("bold_gloss", r"\*\*[^*\n]*?\(([A-Z][A-Za-z '\-&]+)\)\*\*"),
        builtin("bold_name", r"\*\*([A-Z][A-Za-z '\-&]+)\*\*"),
        builtin("paren_name", r"\(([A-Z][A-Za-z '\-&]+)\)"),
        builtin(
            "list_item",
            r"(?m)^[ \t]*(?:[-*]|\d+\.)[ \t]+\*\*([A-Z][A-Za-z '\-&]+)\*\*",
        ),
    ]
});

/// Word-bounded, case-sensitive matcher per lexicon entry.
static LEXICON_MATCHERS: LazyLock<Vec<(&'static LexiconEntry, Regex)>> = LazyLock::new(|| {
    lexicon::entries()
        .iter()
        .map(|entry| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(entry.english)))
                .expect("valid regex");
            (entry, re)
        })
        .collect()
});

// ---------------------------------------------------------------------------
// Extraction result
// ---------------------------------------------------------------------------

/// Match counts for one pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternStats {
    pub name: String,
    /// Raw captures before validation.
    pub total: usize,
    /// Captures that passed scope and validation.
    pub valid: usize,
    pub sample: Vec<String>,
}

/// Candidates found in one text, plus per-pattern statistics.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Lexicon hits first, then pattern hits in discovery order.
    pub candidates: Vec<Candidate>,
    pub stats: Vec<PatternStats>,
}

impl Extraction {
    /// Candidate term strings in order.
    pub fn terms(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.term.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Append `other`'s candidates that are not already present
    /// (case-insensitive), keeping this extraction's order first.
    pub fn merge(&mut self, other: Extraction) {
        let mut seen: HashSet<String> =
            self.candidates.iter().map(|c| c.term.to_lowercase()).collect();
        for candidate in other.candidates {
            if seen.insert(candidate.term.to_lowercase()) {
                self.candidates.push(candidate);
            }
        }
        self.stats.extend(other.stats);
    }
}

/// Accumulates candidates with case-insensitive de-duplication.
#[derive(Default)]
struct CandidateSet {
    seen: HashSet<String>,
    items: Vec<Candidate>,
}

impl CandidateSet {
    fn insert(&mut self, candidate: Candidate) -> bool {
        if self.seen.insert(candidate.term.to_lowercase()) {
            self.items.push(candidate);
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Which scripts a match may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Source text is English; matches with non-Latin letters are dropped.
    #[default]
    English,
    /// Translated text; any script is allowed through to the validator.
    Any,
}

/// Configured term extractor. Build one with [`TermExtractor::builder`] or a preset.
#[derive(Debug, Clone)]
pub struct TermExtractor {
    patterns: Vec<TermPattern>,
    scope: Scope,
    lexicon_scan: bool,
    alias_scan: bool,
}

impl TermExtractor {
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::default()
    }

    /// Preset for the English research writeup.
    pub fn english_source() -> Self {
        Self::builder()
            .patterns(ENGLISH_PATTERNS.iter().cloned())
            .scope(Scope::English)
            .lexicon_scan(true)
            .build()
    }

    /// Preset for a translated Korean post that keeps English glosses in markup.
    pub fn translated_markdown() -> Self {
        Self::builder()
            .patterns(MARKDOWN_PATTERNS.iter().cloned())
            .scope(Scope::Any)
            .lexicon_scan(true)
            .alias_scan(true)
            .build()
    }

    /// Names of the configured patterns, in application order.
    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(TermPattern::name).collect()
    }

    /// Scan `text` and return validated candidates.
    pub fn extract(&self, text: &str) -> Extraction {
        let mut set = CandidateSet::default();

        if self.lexicon_scan {
            for (entry, re) in LEXICON_MATCHERS.iter() {
                if re.is_match(text) && set.insert(lexicon_candidate(entry, None)) {
                    debug!(term = entry.english, "lexicon term found");
                }
            }
        }

        if self.alias_scan {
            for entry in lexicon::entries() {
                if let Some(alias) = entry.korean.iter().find(|k| text.contains(**k)) {
                    set.insert(lexicon_candidate(entry, Some(*alias)));
                }
            }
        }

        let mut stats = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            let mut stat = PatternStats {
                name: pattern.name.clone(),
                ..PatternStats::default()
            };

            for raw in pattern.captures(text) {
                stat.total += 1;
                let term = raw.trim();
                if !self.in_scope(term) || !validator::is_valid(term) {
                    continue;
                }
                stat.valid += 1;
                if stat.sample.len() < SAMPLE_SIZE {
                    stat.sample.push(term.to_string());
                }
                let candidate = match lexicon::lookup(term) {
                    Some(entry) => lexicon_candidate(entry, None),
                    None => Candidate::plain(term),
                };
                set.insert(candidate);
            }

            debug!(pattern = %stat.name, valid = stat.valid, total = stat.total, "pattern applied");
            stats.push(stat);
        }

        info!(terms = set.items.len(), "term extraction complete");

        Extraction {
            candidates: set.items,
            stats,
        }
    }

    fn in_scope(&self, term: &str) -> bool {
        match self.scope {
            Scope::English => !contains_non_latin(term),
            Scope::Any => true,
        }
    }
}

impl Default for TermExtractor {
    fn default() -> Self {
        Self::english_source()
    }
}

fn lexicon_candidate(entry: &LexiconEntry, alias: Option<&str>) -> Candidate {
    Candidate {
        term: entry.english.to_string(),
        category: Some(entry.category),
        alias: alias.map(str::to_string),
    }
}

/// Letters outside ASCII and the Latin-1/Latin Extended blocks.
fn contains_non_latin(term: &str) -> bool {
    term.chars()
        .any(|c| c.is_alphabetic() && !c.is_ascii() && !('\u{00C0}'..='\u{024F}').contains(&c))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a custom [`TermExtractor`].
#[derive(Debug, Default)]
pub struct ExtractorBuilder {
    patterns: Vec<TermPattern>,
    scope: Scope,
    lexicon_scan: bool,
    alias_scan: bool,
}

impl ExtractorBuilder {
    /// Append one pattern.
    pub fn pattern(mut self, pattern: TermPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Append several patterns in order.
    pub fn patterns(mut self, patterns: impl IntoIterator<Item = TermPattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Emit every lexicon term that occurs word-bounded in the text, ahead of pattern hits.
    pub fn lexicon_scan(mut self, enabled: bool) -> Self {
        self.lexicon_scan = enabled;
        self
    }

    /// Emit the English term for every Korean lexicon name found in the text.
    pub fn alias_scan(mut self, enabled: bool) -> Self {
        self.alias_scan = enabled;
        self
    }

    pub fn build(self) -> TermExtractor {
        TermExtractor {
            patterns: self.patterns,
            scope: self.scope,
            lexicon_scan: self.lexicon_scan,
            alias_scan: self.alias_scan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidepress_shared::TermCategory;

    const SOURCE: &str = "\
## Storm Sorcerer
The core spells are Thunderwave and Lightning Bolt.
Wear the Helm of Brilliance with Adamantine Splint Armor.
Best Race: Half-Elf
Key feat: War Caster
천둥파 (Thunderwave) remains strong.
";

    #[test]
    fn english_preset_finds_lexicon_terms_first() {
        let extraction = TermExtractor::english_source().extract(SOURCE);
        let terms = extraction.terms();

        let lexicon_hits = ["Thunderwave", "Lightning Bolt", "Helm of Brilliance"];
        for hit in lexicon_hits {
            let pos = terms.iter().position(|t| *t == hit).unwrap();
            let storm = terms.iter().position(|t| *t == "Storm Sorcerer").unwrap();
            assert!(pos < storm, "{hit} should precede pattern-only hits");
        }
        assert!(terms.contains(&"Adamantine Splint Armor"));
        assert!(terms.contains(&"War Caster"));
    }

    #[test]
    fn excluded_and_hangul_matches_are_dropped() {
        let extraction = TermExtractor::english_source().extract(SOURCE);
        let terms = extraction.terms();
        assert!(!terms.iter().any(|t| t.contains('천')));
        assert!(!terms.contains(&"Best"));
    }

    #[test]
    fn duplicates_collapse_case_insensitively() {
        let text = "Fireball, then (Fireball), then **Fireball**.";
        let extraction = TermExtractor::translated_markdown().extract(text);
        let fireballs = extraction
            .terms()
            .into_iter()
            .filter(|t| t.eq_ignore_ascii_case("fireball"))
            .count();
        assert_eq!(fireballs, 1);
    }

    #[test]
    fn lexicon_candidates_carry_category() {
        let extraction = TermExtractor::english_source().extract("Cast Bless before combat.");
        let bless = extraction
            .candidates
            .iter()
            .find(|c| c.term == "Bless")
            .unwrap();
        assert_eq!(bless.category, Some(TermCategory::Spell));
    }

    #[test]
    fn translated_preset_reads_markup_and_aliases() {
        let text = "\
- **신성한 강타(Divine Smite)**: 핵심 기술
- **Sorcerous Burst**: 추가 피해
축복을 먼저 사용하세요.
";
        let extraction = TermExtractor::translated_markdown().extract(text);
        let terms = extraction.terms();
        assert!(terms.contains(&"Divine Smite"));
        assert!(terms.contains(&"Sorcerous Burst"));

        let bless = extraction
            .candidates
            .iter()
            .find(|c| c.term == "Bless")
            .unwrap();
        assert_eq!(bless.alias.as_deref(), Some("축복"));
    }

    #[test]
    fn stats_cover_every_pattern() {
        let extractor = TermExtractor::english_source();
        let extraction = extractor.extract(SOURCE);
        assert_eq!(extraction.stats.len(), extractor.pattern_names().len());
        let gloss = extraction
            .stats
            .iter()
            .find(|s| s.name == "hangul_gloss")
            .unwrap();
        assert_eq!(gloss.valid, 1);
        assert_eq!(gloss.sample, vec!["Thunderwave".to_string()]);
    }

    #[test]
    fn pattern_order_does_not_change_the_set() {
        let forward = TermExtractor::english_source().extract(SOURCE);
        let reversed = TermExtractor::builder()
            .patterns(ENGLISH_PATTERNS.iter().rev().cloned())
            .lexicon_scan(true)
            .build()
            .extract(SOURCE);

        let a: HashSet<_> = forward.terms().into_iter().collect();
        let b: HashSet<_> = reversed.terms().into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn custom_pattern_compiles_or_errors() {
        assert!(TermPattern::new("bad", "(unclosed").is_err());

        let extractor = TermExtractor::builder()
            .pattern(TermPattern::new("quoted", r#""([A-Z][a-z]+ [A-Z][a-z]+)""#).unwrap())
            .build();
        let extraction = extractor.extract(r#"Try "Arcane Acuity" next."#);
        assert_eq!(extraction.terms(), vec!["Arcane Acuity"]);
    }

    #[test]
    fn captures_outlive_the_borrowed_text_scope() {
        let pattern = TermPattern::new("paren", r"\(([A-Z][a-z]+)\)").unwrap();
        let found: Vec<&str> = {
            let text = "Cast (Haste) then (Bless).";
            pattern.captures(text).collect()
        };
        assert_eq!(found, vec!["Haste", "Bless"]);
    }

    #[test]
    fn merge_keeps_first_order_and_drops_duplicates() {
        let mut english = TermExtractor::english_source().extract("Cast Bless and Haste.");
        let korean = TermExtractor::translated_markdown()
            .extract("- **HASTE**: 가속\n- **Sorcerous Burst**: 추가 피해");
        let english_len = english.len();
        let stat_count = english.stats.len() + korean.stats.len();

        english.merge(korean);
        let terms = english.terms();
        assert_eq!(terms.iter().filter(|t| t.eq_ignore_ascii_case("haste")).count(), 1);
        assert_eq!(terms.last(), Some(&"Sorcerous Burst"));
        assert_eq!(english.len(), english_len + 1);
        assert_eq!(english.stats.len(), stat_count);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(TermExtractor::english_source().extract("").is_empty());
    }
}
