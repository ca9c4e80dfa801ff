//! Game-term recognition for generated build guides.
//!
//! Three layers, leaves first:
//! - [`lexicon`]: curated English/Korean term list with categories
//! - [`validator`]: pure plausibility predicate over a candidate string
//! - [`extractor`]: configurable regex pipeline producing validated candidates

pub mod extractor;
pub mod lexicon;
pub mod validator;

pub use extractor::{Extraction, ExtractorBuilder, PatternStats, Scope, TermExtractor, TermPattern};
pub use lexicon::LexiconEntry;
pub use validator::{Verdict, is_valid};
