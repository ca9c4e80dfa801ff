//! Image and video enrichment for build guides.
//!
//! - [`wiki`]: page lookup plus prioritized DOM strategies for picking an image
//! - [`variants`]: ordered spelling variants tried per term
//! - [`resolver`]: rate-limited term → image resolution
//! - [`video`]: search-page scraping and thumbnail probing

pub mod resolver;
pub mod variants;
pub mod video;
pub mod wiki;

pub use resolver::{ImageResolver, Resolution};
pub use variants::{VariantGenerator, VariantStrategy};
pub use video::{VideoLookup, VideoThumbnail, YoutubeClient};
pub use wiki::{ImageLookup, ImageStrategy, StrategyChain, WikiClient, normalize_image_url};
