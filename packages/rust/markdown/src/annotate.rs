//! Image annotation for translated guides.
//!
//! For every resolved term, a styled `<img>` snippet is spliced in front of
//! the term's first recognizable occurrence. Surface forms are tried in a
//! fixed priority order; the first form that matches anywhere wins. A term
//! is annotated at most once, and a term whose snippet is already present
//! is left alone, so annotating twice with the same images is a no-op.
//!
//! Longer terms go first, and a term never matches inside an occurrence of
//! a longer resolved term that contains it (`Elf` inside `Half-Elf`). Links,
//! URLs, HTML tags and inline code are never split.

use std::ops::Range;

use regex::Regex;
use tracing::{debug, info, instrument};

use guidepress_shared::{AnnotatedDocument, ResolvedImage};
use guidepress_terms::lexicon::korean_aliases;

use crate::cleanup::protected_spans;

/// Inline style applied to every inserted image.
const IMAGE_STYLE: &str = "width: 64px; height: 64px; object-fit: cover; \
border: 2px solid #8B4513; border-radius: 8px; margin: 0 8px 4px 0; \
vertical-align: middle; box-shadow: 0 2px 4px rgba(0,0,0,0.3);";

/// Surface forms a term can take in the document, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceForm {
    /// `**Term**`
    Bold,
    /// `(Term)`
    Parenthesized,
    /// `` `Term` ``
    InlineCode,
    /// `_Term_`
    Italic,
    /// `Term` on word boundaries.
    Plain,
}

impl SurfaceForm {
    pub const PRIORITY: [Self; 5] = [
        Self::Bold,
        Self::Parenthesized,
        Self::InlineCode,
        Self::Italic,
        Self::Plain,
    ];

    /// Case-insensitive pattern for `term` in this form.
    fn pattern(self, term: &str) -> Option<Regex> {
        let t = regex::escape(term);
        let pattern = match self {
            Self::Bold => format!(r"(?i)\*\*{t}\*\*"),
            Self::Parenthesized => format!(r"(?i)\({t}\)"),
            Self::InlineCode => format!(r"(?i)`{t}`"),
            Self::Italic => format!(r"(?i)_{t}_"),
            Self::Plain => format!(r"(?i)\b{t}\b"),
        };
        Regex::new(&pattern).ok()
    }
}

/// The `<img>` snippet inserted for `term`.
pub fn image_snippet(term: &str, image_url: &str) -> String {
    let term = escape_attr(term);
    let url = escape_attr(image_url);
    format!(r#"<img src="{url}" alt="{term}" title="{term}" style="{IMAGE_STYLE}">"#)
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// A match may not touch a blocked span, unless it is exactly that span
/// (an inline code match is its own code span).
fn blocked(spans: &[Range<usize>], range: &Range<usize>) -> bool {
    spans
        .iter()
        .any(|s| s.start < range.end && range.start < s.end && s != range)
}

/// Occurrences of longer resolved terms that contain `term`, canonical and
/// Korean, so `term` is not matched inside them.
fn shadow_spans(doc: &str, term: &str, longer: &[&str]) -> Vec<Range<usize>> {
    let lower = term.to_lowercase();
    let aliases = korean_aliases(term);
    let mut spans = Vec::new();

    for outer in longer {
        if outer.to_lowercase().contains(&lower) {
            if let Some(re) = SurfaceForm::Plain.pattern(outer) {
                spans.extend(re.find_iter(doc).map(|m| m.range()));
            }
        }
        for outer_alias in korean_aliases(outer) {
            if aliases.iter().any(|a| outer_alias.contains(*a)) {
                spans.extend(doc.match_indices(*outer_alias).map(|(i, s)| i..i + s.len()));
            }
        }
    }
    spans
}

/// Splices image snippets into markdown.
#[derive(Debug, Clone)]
pub struct Annotator {
    forms: Vec<SurfaceForm>,
    aliases: bool,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            forms: SurfaceForm::PRIORITY.to_vec(),
            aliases: true,
        }
    }
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the Korean alias pass on or off.
    pub fn with_aliases(mut self, enabled: bool) -> Self {
        self.aliases = enabled;
        self
    }

    /// Restrict or reorder the surface forms tried.
    pub fn with_forms(mut self, forms: impl IntoIterator<Item = SurfaceForm>) -> Self {
        self.forms = forms.into_iter().collect();
        self
    }

    /// Annotate `md` with one image per resolved term.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn annotate(&self, md: &str, images: &[ResolvedImage]) -> AnnotatedDocument {
        let mut doc = md.to_string();
        let mut inserted: Vec<String> = Vec::new();
        let mut pending: Vec<&ResolvedImage> = Vec::new();

        // Stable sort: equal lengths keep their resolution order.
        let mut ordered: Vec<&ResolvedImage> =
            images.iter().filter(|i| !i.image_url.is_empty()).collect();
        ordered.sort_by_key(|i| std::cmp::Reverse(i.term.chars().count()));

        for &image in &ordered {
            if inserted.contains(&image.term) {
                continue;
            }
            if already_annotated(&doc, &image.term) {
                debug!(term = %image.term, "snippet already present");
                inserted.push(image.term.clone());
                continue;
            }
            match self.find_canonical(&doc, &image.term, &longer_terms(&ordered, &image.term)) {
                Some(at) => {
                    doc.insert_str(at, &image_snippet(&image.term, &image.image_url));
                    debug!(term = %image.term, at, "image inserted");
                    inserted.push(image.term.clone());
                }
                None => pending.push(image),
            }
        }

        let mut unmatched: Vec<String> = Vec::new();
        for image in pending {
            if inserted.contains(&image.term) {
                continue;
            }
            let at = if self.aliases {
                find_alias(&doc, &image.term, &longer_terms(&ordered, &image.term))
            } else {
                None
            };
            match at {
                Some(at) => {
                    doc.insert_str(at, &image_snippet(&image.term, &image.image_url));
                    debug!(term = %image.term, at, "image inserted at alias");
                    inserted.push(image.term.clone());
                }
                None => {
                    if !unmatched.contains(&image.term) {
                        unmatched.push(image.term.clone());
                    }
                }
            }
        }

        info!(
            inserted = inserted.len(),
            unmatched = unmatched.len(),
            "annotation complete"
        );

        AnnotatedDocument {
            markdown: doc,
            inserted,
            unmatched,
        }
    }

    /// Byte offset of the first occurrence of `term` in the highest-priority
    /// surface form that appears outside protected and shadowed spans.
    fn find_canonical(&self, doc: &str, term: &str, longer: &[&str]) -> Option<usize> {
        let mut spans = protected_spans(doc);
        spans.extend(shadow_spans(doc, term, longer));
        self.forms.iter().find_map(|form| {
            let re = form.pattern(term)?;
            re.find_iter(doc)
                .map(|m| m.range())
                .find(|r| !blocked(&spans, r))
                .map(|r| r.start)
        })
    }
}

fn longer_terms<'a>(images: &[&'a ResolvedImage], term: &str) -> Vec<&'a str> {
    let len = term.chars().count();
    images
        .iter()
        .map(|i| i.term.as_str())
        .filter(|t| t.chars().count() > len)
        .collect()
}

fn already_annotated(doc: &str, term: &str) -> bool {
    doc.contains(&format!(r#"alt="{}""#, escape_attr(term)))
}

/// First occurrence of any Korean display name for `term`.
fn find_alias(doc: &str, term: &str, longer: &[&str]) -> Option<usize> {
    let mut spans = protected_spans(doc);
    spans.extend(shadow_spans(doc, term, longer));
    korean_aliases(term)
        .iter()
        .filter_map(|alias| {
            doc.match_indices(*alias)
                .map(|(i, s)| i..i + s.len())
                .find(|r| !blocked(&spans, r))
                .map(|r| r.start)
        })
        .min()
}

/// Annotate with the default surface forms and alias pass.
pub fn annotate(md: &str, images: &[ResolvedImage]) -> AnnotatedDocument {
    Annotator::default().annotate(md, images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(term: &str, url: &str) -> ResolvedImage {
        ResolvedImage {
            term: term.to_string(),
            image_url: url.to_string(),
            variant: term.to_string(),
        }
    }

    fn img_count(md: &str) -> usize {
        md.matches("<img ").count()
    }

    #[test]
    fn parenthesized_term_gets_one_image() {
        let md = "레벨 1에는 천둥파 (Thunderwave) 를 배웁니다. 이후에도 (Thunderwave) 는 유용합니다.";
        let doc = annotate(md, &[image("Thunderwave", "https://img/thunderwave.png")]);

        assert_eq!(img_count(&doc.markdown), 1);
        let snippet = image_snippet("Thunderwave", "https://img/thunderwave.png");
        assert!(doc.markdown.contains(&format!("천둥파 {snippet}(Thunderwave) 를")));
        assert_eq!(doc.markdown.replace(&snippet, ""), md);
        assert_eq!(doc.inserted, vec!["Thunderwave"]);
        assert!(doc.unmatched.is_empty());
    }

    #[test]
    fn bold_outranks_earlier_plain_occurrence() {
        let md = "Haste first. Later: **Haste** is key.";
        let doc = annotate(md, &[image("Haste", "u")]);
        let snippet = image_snippet("Haste", "u");
        assert!(doc.markdown.contains(&format!("Later: {snippet}**Haste**")));
        assert!(doc.markdown.starts_with("Haste first."));
    }

    #[test]
    fn plain_match_is_case_insensitive_and_word_bounded() {
        let md = "Hasted units. then haste them.";
        let doc = annotate(md, &[image("Haste", "u")]);
        assert_eq!(img_count(&doc.markdown), 1);
        assert!(doc.markdown.contains(r#"style="width: 64px;"#));
        assert!(doc.markdown.contains("then <img "));
    }

    #[test]
    fn annotate_is_idempotent() {
        let md = "**Bless** and (Haste) and Misty Step.";
        let images = [
            image("Bless", "https://img/bless.png"),
            image("Haste", "https://img/haste.png"),
            image("Misty Step", "https://img/misty.png"),
        ];
        let once = annotate(md, &images);
        let twice = annotate(&once.markdown, &images);
        assert_eq!(once.markdown, twice.markdown);
        assert_eq!(img_count(&twice.markdown), 3);
        assert_eq!(twice.inserted.len(), 3);
    }

    #[test]
    fn never_matches_inside_existing_image_tag() {
        let md = r#"<img src="x" alt="Fireball icon"> text without the word."#;
        let doc = annotate(md, &[image("Fireball", "u")]);
        assert_eq!(doc.markdown, md);
        assert_eq!(doc.unmatched, vec!["Fireball"]);
    }

    #[test]
    fn alias_pass_places_image_before_korean_name() {
        let md = "이 빌드는 천둥파를 자주 씁니다.";
        let doc = annotate(md, &[image("Thunderwave", "u")]);
        assert!(doc.markdown.contains("이 빌드는 <img "));
        assert!(doc.markdown.contains(">천둥파를"));
        assert_eq!(doc.inserted, vec!["Thunderwave"]);

        let without = Annotator::new().with_aliases(false).annotate(md, &[image("Thunderwave", "u")]);
        assert_eq!(without.markdown, md);
        assert_eq!(without.unmatched, vec!["Thunderwave"]);
    }

    #[test]
    fn short_terms_never_land_inside_longer_ones() {
        let md = "추천 주문: Mass Healing Word 와 Half-Elf 종족.";
        let doc = annotate(
            md,
            &[
                image("Healing Word", "hw"),
                image("Mass Healing Word", "mhw"),
                image("Elf", "elf"),
                image("Half-Elf", "half"),
            ],
        );

        let mass = image_snippet("Mass Healing Word", "mhw");
        let half = image_snippet("Half-Elf", "half");
        assert_eq!(doc.markdown, format!("추천 주문: {mass}Mass Healing Word 와 {half}Half-Elf 종족."));
        assert_eq!(doc.inserted, vec!["Mass Healing Word", "Half-Elf"]);
        assert_eq!(doc.unmatched, vec!["Healing Word", "Elf"]);
    }

    #[test]
    fn short_term_still_found_outside_longer_ones() {
        let md = "Mass Healing Word 다음에 Healing Word. 하프엘프보다 엘프.";
        let images = [image("Healing Word", "hw"), image("Mass Healing Word", "mhw"), image("Elf", "e"), image("Half-Elf", "he")];
        let doc = annotate(md, &images);

        let hw = image_snippet("Healing Word", "hw");
        assert!(doc.markdown.contains(&format!("다음에 {hw}Healing Word.")));
        let elf = image_snippet("Elf", "e");
        assert!(doc.markdown.contains(&format!("보다 {elf}엘프.")));
        assert!(doc.unmatched.is_empty());
    }

    #[test]
    fn links_urls_and_code_are_not_split() {
        let md = "[위키](https://bg3.wiki/wiki/Haste) 참고. <https://x.test/Haste> Haste 는 핵심.";
        let doc = annotate(md, &[image("Haste", "u")]);
        let snippet = image_snippet("Haste", "u");
        assert_eq!(
            doc.markdown,
            format!("[위키](https://bg3.wiki/wiki/Haste) 참고. <https://x.test/Haste> {snippet}Haste 는 핵심.")
        );

        let code = annotate("Use `cast Haste` first, then `Haste`.", &[image("Haste", "u")]);
        assert!(code.markdown.contains(&format!("then {snippet}`Haste`.")));
        assert!(code.markdown.starts_with("Use `cast Haste` first"));
    }

    #[test]
    fn snippet_escapes_attributes() {
        let s = image_snippet("Salt \"&\" Pepper", "https://x/a?b=1&c=2");
        assert!(s.contains(r#"alt="Salt &quot;&amp;&quot; Pepper""#));
        assert!(s.contains(r#"src="https://x/a?b=1&amp;c=2""#));
    }

    #[test]
    fn restricted_forms() {
        let md = "Bless and **Bless**";
        let doc = Annotator::new()
            .with_forms([SurfaceForm::Plain])
            .annotate(md, &[image("Bless", "u")]);
        assert!(doc.markdown.starts_with("<img "));
    }
}
