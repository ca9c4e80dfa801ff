//! Wiki page image lookup.
//!
//! A [`WikiClient`] fetches `{base}/wiki/{Name}` and hands the page to a
//! [`StrategyChain`], which tries each [`ImageStrategy`] in priority order
//! and returns the first image source found, made absolute.

mod strategies;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, instrument};
use url::Url;

use guidepress_shared::{GuideError, Result, WikiConfig};

pub use strategies::{AltExact, AltPartial, FirstContentImage, IconClass, IconFilename, TableRow};

/// User-Agent string for wiki requests.
const USER_AGENT: &str = concat!("GuidePress/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Anything that can map a page name to an image URL.
///
/// `Ok(None)` means "no image"; `Err` is a transport failure the caller may
/// log and treat as a miss.
#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<String>>;
}

/// One way of picking an image out of a wiki page.
pub trait ImageStrategy: Send + Sync {
    /// Return the raw `src` of the chosen image, if any.
    fn find(&self, doc: &Html, term: &str) -> Option<String>;

    /// Strategy name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Strategy chain
// ---------------------------------------------------------------------------

/// Holds strategies in priority order.
pub struct StrategyChain {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl StrategyChain {
    /// All built-in strategies, most specific first.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(AltExact),
                Box::new(AltPartial),
                Box::new(TableRow),
                Box::new(IconClass),
                Box::new(IconFilename),
                Box::new(FirstContentImage),
            ],
        }
    }

    /// A chain with caller-chosen strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn ImageStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse `html` and return `(strategy name, raw src)` for the first hit.
    pub fn find(&self, html: &str, term: &str) -> Option<(&str, String)> {
        let doc = Html::parse_document(html);
        self.strategies
            .iter()
            .find_map(|s| s.find(&doc, term).map(|src| (s.name(), src)))
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Make an image `src` absolute against the wiki origin.
///
/// Protocol-relative sources get `https:`, root-relative ones get the base.
/// Anything that still isn't http(s) is rejected.
pub fn normalize_image_url(src: &str, base: &str) -> Option<String> {
    let src = src.trim();
    let absolute = if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else if src.starts_with('/') {
        format!("{}{src}", base.trim_end_matches('/'))
    } else {
        src.to_string()
    };

    absolute.starts_with("http").then_some(absolute)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for a MediaWiki-style site.
pub struct WikiClient {
    client: Client,
    base_url: String,
    chain: StrategyChain,
}

impl WikiClient {
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuideError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chain: StrategyChain::new(),
        })
    }

    /// Page URL for a name: spaces become underscores, the rest is percent-encoded.
    pub fn page_url(&self, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GuideError::config(format!("invalid wiki base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| GuideError::config(format!("wiki base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push("wiki")
            .push(&name.trim().replace(' ', "_"));
        Ok(url)
    }
}

#[async_trait]
impl ImageLookup for WikiClient {
    #[instrument(skip_all, fields(name = %name))]
    async fn lookup(&self, name: &str) -> Result<Option<String>> {
        let url = self.page_url(name)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GuideError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "wiki page not found");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| GuideError::Network(format!("{url}: failed to read body: {e}")))?;

        let Some((strategy, src)) = self.chain.find(&body, name) else {
            debug!(%url, "no image on page");
            return Ok(None);
        };

        let normalized = normalize_image_url(&src, &self.base_url);
        debug!(strategy, ?normalized, "image candidate");
        Ok(normalized)
    }
}
