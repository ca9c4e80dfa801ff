//! Text cleanup passes for generated guides.
//!
//! Each pass is a function `&str -> String`. All of them are idempotent:
//! running a pass on its own output changes nothing.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Fields that make up a summary card blockquote.
const CARD_FIELDS: &str = r"빌드명|주요\s*역할|핵심\s*스탯|추천\s*종족|강점|패치\s*기준";

/// Marker that identifies a summary card.
const CARD_MARKER: &str = "빌드명";

// ---------------------------------------------------------------------------
// Pass 1: Strip summary cards
// ---------------------------------------------------------------------------

/// Remove summary-card blockquotes left in generated posts, then collapse
/// the blank lines they leave behind.
///
/// A card starts at a `> **빌드명**:` line and runs to the end of the
/// blockquote. Stray `> **핵심 스탯**:`-style field lines are removed too,
/// as are rendered `<blockquote>` blocks mentioning 빌드명.
pub fn strip_summary_cards(md: &str) -> String {
    static CARD_START_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(&format!(r"^\s*>\s*\*\*{CARD_MARKER}\*\*\s*:")).expect("valid regex")
    });
    static CARD_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(&format!(r"^\s*>\s*\*\*(?:{CARD_FIELDS})\*\*\s*:")).expect("valid regex")
    });
    static HTML_BLOCKQUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<blockquote[^>]*>.*?</blockquote>").expect("valid regex")
    });

    let mut kept: Vec<&str> = Vec::new();
    let mut in_card = false;

    for line in md.split('\n') {
        if CARD_START_RE.is_match(line) {
            in_card = true;
            continue;
        }
        if in_card {
            if line.trim_start().starts_with('>') {
                continue;
            }
            in_card = false;
        }
        if CARD_FIELD_RE.is_match(line) {
            continue;
        }
        kept.push(line);
    }

    let joined = kept.join("\n");
    let without_html = HTML_BLOCKQUOTE_RE.replace_all(&joined, |caps: &regex::Captures<'_>| {
        if caps[0].contains(CARD_MARKER) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    collapse_blank_lines(&without_html)
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of two or more blank (or whitespace-only) lines into one.
pub fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"));

    BLANK_RUN_RE.replace_all(md, "\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Sentence line breaks
// ---------------------------------------------------------------------------

/// Turn `. ` before an uppercase Latin or Hangul letter into a markdown hard
/// break (`.  \n`), so each sentence renders on its own line.
///
/// Code fences, headings, and table rows are left alone, as are ordered-list
/// markers and links, images, inline code, and HTML tags inside other lines.
pub fn break_sentences(md: &str) -> String {
    static SENTENCE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\. ([A-Z가-힣])").expect("valid regex"));
    static ORDERED_ITEM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[ \t]*\d+\. ").expect("valid regex"));

    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in md.split('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        if in_fence || trimmed.starts_with('#') || is_table_row(trimmed) {
            out.push(line.to_string());
            continue;
        }

        let mut protected = protected_spans(line);
        if let Some(marker) = ORDERED_ITEM_RE.find(line) {
            protected.push(marker.range());
        }
        let broken = SENTENCE_RE.replace_all(line, |caps: &regex::Captures<'_>| {
            let Some(m) = caps.get(0) else {
                return String::new();
            };
            if protected.iter().any(|r| r.contains(&m.start())) {
                m.as_str().to_string()
            } else {
                format!(".  \n{}", &caps[1])
            }
        });
        out.push(broken.into_owned());
    }

    out.join("\n")
}

/// Byte ranges that text passes must not edit inside: markdown links and
/// images, HTML tags (autolinks included), inline code, and bare URLs.
pub(crate) fn protected_spans(text: &str) -> Vec<Range<usize>> {
    static PROTECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"!?\[[^\]\n]*\]\([^)\n]*\)|<[^>\n]+>|`[^`\n]*`|https?://[^\s)>\]]+")
            .expect("valid regex")
    });

    PROTECTED_RE.find_iter(text).map(|m| m.range()).collect()
}

fn is_table_row(line: &str) -> bool {
    let line = line.trim_end();
    line.len() > 1 && line.starts_with('|') && line.ends_with('|')
}

// ---------------------------------------------------------------------------
// Pass 4: Ensure trailing newline
// ---------------------------------------------------------------------------

/// Ensure the text ends with exactly one newline.
pub fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_DOC: &str = "\
# 폭풍 소서러 빌드 가이드

> **빌드명**: 폭풍 소서러
> **주요 역할**: 광역 딜러
> **핵심 스탯**: 매력

## 개요
본문입니다.

> **강점**: 높은 폭딜


<blockquote><p><strong>빌드명</strong>: 폭풍</p></blockquote>
<blockquote>일반 인용</blockquote>
";

    #[test]
    fn strips_markdown_and_html_cards() {
        let cleaned = strip_summary_cards(CARD_DOC);
        assert!(!cleaned.contains("빌드명"));
        assert!(!cleaned.contains("주요 역할"));
        assert!(!cleaned.contains("강점"));
        assert!(cleaned.contains("## 개요\n본문입니다."));
        assert!(cleaned.contains("<blockquote>일반 인용</blockquote>"));
        assert!(!cleaned.contains("\n\n\n"));
    }

    #[test]
    fn strip_summary_cards_is_idempotent() {
        let once = strip_summary_cards(CARD_DOC);
        let twice = strip_summary_cards(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn clean_text_is_unchanged() {
        let clean = "# 제목\n\n본문.\n\n> 평범한 인용\n";
        assert_eq!(strip_summary_cards(clean), clean);
    }

    #[test]
    fn collapse_blank_lines_handles_whitespace_lines() {
        assert_eq!(collapse_blank_lines("a\n\n \n\t\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn breaks_sentences_before_capitals_and_hangul() {
        let out = break_sentences("First point. Second point. 세 번째 문장. lower stays.");
        assert_eq!(
            out,
            "First point.  \nSecond point.  \n세 번째 문장. lower stays."
        );
    }

    #[test]
    fn break_sentences_skips_protected_regions() {
        let input = "\
# Title. Not broken
| Col. A | Col. B |
See [Step one. Two](https://x.y/a. B) now. Next.
<img alt=\"a. B\" src=\"x\"> done. Ok
```
code. Block
```";
        let out = break_sentences(input);
        assert!(out.contains("# Title. Not broken"));
        assert!(out.contains("| Col. A | Col. B |"));
        assert!(out.contains("[Step one. Two](https://x.y/a. B) now.  \nNext."));
        assert!(out.contains("<img alt=\"a. B\" src=\"x\"> done.  \nOk"));
        assert!(out.contains("code. Block"));
    }

    #[test]
    fn ordered_list_markers_are_not_sentence_ends() {
        let out = break_sentences("1. 전투 시작. 버프 먼저\n  12. Attack. Then heal");
        assert_eq!(out, "1. 전투 시작.  \n버프 먼저\n  12. Attack.  \nThen heal");
    }

    #[test]
    fn break_sentences_is_idempotent() {
        let once = break_sentences("One. Two. Three.");
        assert_eq!(break_sentences(&once), once);
    }

    #[test]
    fn trailing_newline_normalized() {
        assert_eq!(ensure_trailing_newline("a\n\n\n"), "a\n");
        assert_eq!(ensure_trailing_newline("a"), "a\n");
    }
}
