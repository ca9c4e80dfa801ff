//! Markdown post-processing for generated guides.
//!
//! - [`cleanup`]: idempotent text passes (summary cards, blank lines, sentence breaks)
//! - [`annotate`]: splices term images into the document
//! - [`decorate`]: title, header image, and video thumbnail
//! - [`routine`]: combat routine section for posts without one

pub mod annotate;
pub mod cleanup;
pub mod decorate;
pub mod routine;

pub use annotate::{Annotator, SurfaceForm, annotate, image_snippet};
pub use cleanup::{break_sentences, collapse_blank_lines, ensure_trailing_newline, strip_summary_cards};
pub use decorate::{ensure_title, extract_title, guide_title, insert_thumbnail, prepend_header};
pub use routine::{combat_routine, extract_spells, has_combat_section, insert_combat_routine};

/// Final text passes applied after all insertions.
pub fn finalize(md: &str) -> String {
    let md = break_sentences(md);
    let md = collapse_blank_lines(&md);
    ensure_trailing_newline(&md)
}
