//! Term → image resolution against an [`ImageLookup`].
//!
//! Each term's variants are queried in order and the first hit wins. A
//! fixed pause separates every pair of consecutive lookups. Misses and
//! lookup errors never abort the remaining terms.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use guidepress_shared::{Candidate, ResolvedImage, WikiConfig};

use crate::variants::VariantGenerator;
use crate::wiki::ImageLookup;

/// Outcome of resolving a list of terms.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Hits, in candidate order. Terms are unique.
    pub images: Vec<ResolvedImage>,
    /// Terms that were looked up (after the max-terms cap).
    pub attempted: usize,
}

impl Resolution {
    /// Percentage of attempted terms that resolved.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.images.len() as f64 / self.attempted as f64 * 100.0
        }
    }

    /// Image URL for a term, if it resolved.
    pub fn image_for(&self, term: &str) -> Option<&str> {
        self.images
            .iter()
            .find(|i| i.term == term)
            .map(|i| i.image_url.as_str())
    }
}

/// Resolves terms to images with rate-limited, ordered variant lookups.
pub struct ImageResolver {
    lookup: Box<dyn ImageLookup>,
    variants: VariantGenerator,
    delay: Duration,
    max_terms: usize,
}

impl ImageResolver {
    pub fn new(lookup: Box<dyn ImageLookup>, config: &WikiConfig) -> Self {
        Self {
            lookup,
            variants: VariantGenerator::default(),
            delay: Duration::from_millis(config.rate_limit_ms),
            max_terms: config.max_terms,
        }
    }

    /// Replace the variant generator.
    pub fn with_variants(mut self, variants: VariantGenerator) -> Self {
        self.variants = variants;
        self
    }

    /// Override the pause between lookups.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Resolve one term, trying variants in order until one yields an image.
    #[instrument(skip_all, fields(term = %term))]
    pub async fn resolve(&self, term: &str) -> Option<ResolvedImage> {
        for (i, variant) in self.variants.variants(term).into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }

            match self.lookup.lookup(&variant).await {
                Ok(Some(image_url)) => {
                    debug!(%variant, %image_url, "image found");
                    return Some(ResolvedImage {
                        term: term.to_string(),
                        image_url,
                        variant,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(%variant, error = %e, "image lookup failed"),
            }
        }

        debug!("no image for term");
        None
    }

    /// Resolve up to `max_terms` candidates in order.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn resolve_all(&self, candidates: &[Candidate]) -> Resolution {
        let mut resolution = Resolution::default();

        for (i, candidate) in candidates.iter().take(self.max_terms).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }
            resolution.attempted += 1;
            if let Some(image) = self.resolve(&candidate.term).await {
                resolution.images.push(image);
            }
        }

        info!(
            resolved = resolution.images.len(),
            attempted = resolution.attempted,
            success_rate = %format!("{:.1}%", resolution.success_rate()),
            "image resolution complete"
        );
        resolution
    }
}
