//! Built-in image selection strategies, most specific first.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::ImageStrategy;

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static TABLE_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tr").expect("valid selector"));

/// Alt texts containing these are site chrome, not article images.
const ALT_NOISE: &[&str] = &["logo", "banner", "icon-", "edit", "external"];

/// Class names that mark inline icons, in preference order.
const ICON_CLASSES: &[&str] = &["icon", "item-icon", "spell-icon", "ability-icon"];

/// Filename fragments typical of icon uploads.
const ICON_SRC_HINTS: &[&str] = &["icon", "spell", "item", "ability", "equipment"];

/// Filename fragments of scaled-down thumbnails.
const THUMB_SRC_HINTS: &[&str] = &["thumb", "64px", "32px"];

/// Article body containers, tried in order.
const CONTENT_AREAS: &[&str] = &["#mw-content-text", ".mw-parser-output", "#content"];

/// Image sources in the article body that are still navigation.
const CONTENT_SRC_NOISE: &[&str] = &["logo", "wiki", "nav", "menu"];

fn src(img: ElementRef<'_>) -> Option<String> {
    img.value()
        .attr("src")
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn alt(img: ElementRef<'_>) -> Option<&str> {
    img.value().attr("alt").filter(|a| !a.is_empty())
}

/// `alt` equals the term, ignoring case and surrounding whitespace.
pub struct AltExact;

impl ImageStrategy for AltExact {
    fn find(&self, doc: &Html, term: &str) -> Option<String> {
        let needle = term.trim().to_lowercase();
        doc.select(&IMG)
            .find(|img| alt(*img).is_some_and(|a| a.trim().to_lowercase() == needle))
            .and_then(src)
    }

    fn name(&self) -> &str {
        "alt_exact"
    }
}

/// `alt` contains the term and is not a chrome image.
pub struct AltPartial;

impl ImageStrategy for AltPartial {
    fn find(&self, doc: &Html, term: &str) -> Option<String> {
        let needle = term.trim().to_lowercase();
        doc.select(&IMG)
            .find(|img| {
                alt(*img).is_some_and(|a| {
                    let a = a.to_lowercase();
                    a.contains(&needle) && !ALT_NOISE.iter().any(|n| a.contains(n))
                })
            })
            .and_then(src)
    }

    fn name(&self) -> &str {
        "alt_partial"
    }
}

/// First image in a table row whose text mentions the term.
pub struct TableRow;

impl ImageStrategy for TableRow {
    fn find(&self, doc: &Html, term: &str) -> Option<String> {
        let needle = term.trim().to_lowercase();
        doc.select(&TABLE_ROW)
            .filter(|row| row.text().collect::<String>().to_lowercase().contains(&needle))
            .find_map(|row| row.select(&IMG).find_map(src))
    }

    fn name(&self) -> &str {
        "table_row"
    }
}

/// Image carrying an icon class.
pub struct IconClass;

impl ImageStrategy for IconClass {
    fn find(&self, doc: &Html, _term: &str) -> Option<String> {
        ICON_CLASSES.iter().find_map(|class| {
            doc.select(&IMG)
                .filter(|img| {
                    img.value()
                        .attr("class")
                        .is_some_and(|c| c.contains(class))
                })
                .find_map(src)
        })
    }

    fn name(&self) -> &str {
        "icon_class"
    }
}

/// Thumbnail whose filename looks like an icon upload.
pub struct IconFilename;

impl ImageStrategy for IconFilename {
    fn find(&self, doc: &Html, _term: &str) -> Option<String> {
        doc.select(&IMG).find_map(|img| {
            let s = src(img)?;
            let lower = s.to_lowercase();
            let iconish = ICON_SRC_HINTS.iter().any(|h| lower.contains(h));
            let thumb = THUMB_SRC_HINTS.iter().any(|h| lower.contains(h));
            (iconish && thumb).then_some(s)
        })
    }

    fn name(&self) -> &str {
        "icon_filename"
    }
}

/// Last resort: first image in the article body.
pub struct FirstContentImage;

impl ImageStrategy for FirstContentImage {
    fn find(&self, doc: &Html, _term: &str) -> Option<String> {
        CONTENT_AREAS.iter().find_map(|area| {
            let sel = Selector::parse(area).ok()?;
            let container = doc.select(&sel).next()?;
            let s = container.select(&IMG).next().and_then(src)?;
            let lower = s.to_lowercase();
            (!CONTENT_SRC_NOISE.iter().any(|n| lower.contains(n))).then_some(s)
        })
    }

    fn name(&self) -> &str {
        "first_content_image"
    }
}
