//! Ghost Admin API publishing.
//!
//! Every request carries a fresh five-minute HS256 token signed with the
//! admin key secret. Posts are sent as a single mobiledoc markdown card.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, instrument};

use guidepress_shared::{GhostConfig, GuideError, Result, read_secret};

type HmacSha256 = Hmac<Sha256>;

/// User-Agent string for publishing requests.
const USER_AGENT: &str = concat!("GuidePress/", env!("CARGO_PKG_VERSION"));

/// Token lifetime accepted by Ghost.
const TOKEN_TTL_SECS: i64 = 300;
const TOKEN_AUDIENCE: &str = "/admin/";
const PAGE_SIZE: u32 = 50;
const MAX_SLUG_CHARS: usize = 60;

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Publication state of a new post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    /// Parse a config value; anything unknown is a draft.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "published" => Self::Published,
            "scheduled" => Self::Scheduled,
            _ => Self::Draft,
        }
    }
}

/// A post ready to be sent.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub markdown: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    /// Required for scheduled posts; defaults to now otherwise.
    pub published_at: Option<DateTime<Utc>>,
    pub meta_title: String,
    pub meta_description: String,
    pub feature_image: Option<String>,
}

impl PostDraft {
    /// Draft for a build guide with the standard tags and meta fields.
    pub fn for_guide(
        build_name: &str,
        category: &str,
        title: &str,
        markdown: &str,
        batch_tag: &str,
        status: PostStatus,
    ) -> Self {
        Self {
            title: title.to_string(),
            markdown: markdown.to_string(),
            tags: guide_tags(batch_tag, category, build_name),
            status,
            published_at: None,
            meta_title: meta_title(build_name),
            meta_description: format!("Baldur's Gate 3 {build_name} 빌드 공략 가이드"),
            feature_image: None,
        }
    }

    /// Schedule the post for `at`.
    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = PostStatus::Scheduled;
        self.published_at = Some(at);
        self
    }
}

/// `BG3 {name} 빌드 가이드`
pub fn meta_title(build_name: &str) -> String {
    format!("BG3 {build_name} 빌드 가이드")
}

/// Batch tag, category, and build name, with spaces removed and empties dropped.
pub fn guide_tags(batch_tag: &str, category: &str, build_name: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in [batch_tag, category, build_name] {
        let tag = tag.replace(' ', "");
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// URL slug: word characters and Hangul kept, whitespace runs become `-`.
pub fn slugify(title: &str) -> String {
    static STRIP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\w\s가-힣]").expect("valid regex"));
    static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let stripped = STRIP_RE.replace_all(title.trim(), "");
    let hyphenated = SPACE_RE.replace_all(&stripped, "-");
    hyphenated.chars().take(MAX_SLUG_CHARS).collect()
}

/// Mobiledoc document wrapping `markdown` in one markdown card.
pub fn mobiledoc(markdown: &str) -> String {
    serde_json::json!({
        "version": "0.3.1",
        "markups": [],
        "atoms": [],
        "cards": [["markdown", { "markdown": markdown }]],
        "sections": [[10, 0]],
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Parsed `id:secret` admin key.
#[derive(Clone)]
pub struct AdminKey {
    id: String,
    secret: Vec<u8>,
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminKey").field("id", &self.id).finish_non_exhaustive()
    }
}

impl AdminKey {
    pub fn parse(key: &str) -> Result<Self> {
        let (id, secret) = key
            .trim()
            .split_once(':')
            .ok_or_else(|| GuideError::config("admin API key must look like id:secret"))?;
        let secret = hex::decode(secret)
            .map_err(|e| GuideError::config(format!("admin API key secret is not hex: {e}")))?;
        Ok(Self {
            id: id.to_string(),
            secret,
        })
    }

    /// HS256 token valid for five minutes from `now`.
    pub fn token(&self, now: DateTime<Utc>) -> Result<String> {
        let header = serde_json::json!({ "alg": "HS256", "kid": self.id, "typ": "JWT" });
        let iat = now.timestamp();
        let payload = serde_json::json!({
            "iat": iat,
            "exp": iat + TOKEN_TTL_SECS,
            "aud": TOKEN_AUDIENCE,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        );

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| GuideError::config(format!("invalid admin key secret: {e}")))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }
}

// ---------------------------------------------------------------------------
// Publisher trait
// ---------------------------------------------------------------------------

/// Title fields of an existing post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta_title: Option<String>,
}

/// Blog backend: creates posts and lists existing ones.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create a post and return its URL.
    async fn create_post(&self, draft: &PostDraft) -> Result<String>;

    /// All posts carrying `tag` (or all posts when `None`).
    async fn list_posts(&self, tag: Option<&str>) -> Result<Vec<PostSummary>>;
}

// ---------------------------------------------------------------------------
// Ghost client
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreatedPosts {
    #[serde(default)]
    posts: Vec<CreatedPost>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct PostPage {
    #[serde(default)]
    posts: Vec<PostSummary>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    pages: u32,
}

/// Ghost Admin API client.
pub struct GhostClient {
    client: Client,
    posts_url: String,
    key: AdminKey,
}

impl GhostClient {
    /// Build a client from the env vars named in the config.
    pub fn from_config(config: &GhostConfig) -> Result<Self> {
        let api_url = read_secret(&config.api_url_env)?;
        let key = read_secret(&config.admin_key_env)?;
        Self::new(&api_url, &key, Duration::from_secs(config.timeout_secs))
    }

    /// `api_url` is the Ghost admin root, e.g. `https://blog.example.com/ghost`.
    pub fn new(api_url: &str, admin_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GuideError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            posts_url: format!("{}/api/admin/posts/", api_url.trim_end_matches('/')),
            key: AdminKey::parse(admin_key)?,
        })
    }

    fn auth_header(&self) -> Result<String> {
        Ok(format!("Ghost {}", self.key.token(Utc::now())?))
    }
}

#[async_trait]
impl Publisher for GhostClient {
    #[instrument(skip_all, fields(title = %draft.title, status = ?draft.status))]
    async fn create_post(&self, draft: &PostDraft) -> Result<String> {
        if draft.status == PostStatus::Scheduled && draft.published_at.is_none() {
            return Err(GuideError::validation("scheduled post needs a publish time"));
        }

        let published_at = draft.published_at.unwrap_or_else(Utc::now);
        let tags: Vec<serde_json::Value> = draft
            .tags
            .iter()
            .map(|name| serde_json::json!({ "name": name }))
            .collect();

        let mut post = serde_json::json!({
            "title": draft.title,
            "status": draft.status,
            "featured": false,
            "tags": tags,
            "slug": slugify(&draft.title),
            "published_at": published_at.to_rfc3339(),
            "meta_title": draft.meta_title,
            "meta_description": draft.meta_description,
            "mobiledoc": mobiledoc(&draft.markdown),
        });
        if let Some(image) = &draft.feature_image {
            post["feature_image"] = serde_json::Value::String(image.clone());
        }
        let body = serde_json::json!({ "posts": [post] });

        let response = self
            .client
            .post(&self.posts_url)
            .header("Authorization", self.auth_header()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| GuideError::Publish(format!("{}: {e}", self.posts_url)))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let text = response.text().await.unwrap_or_default();
            return Err(GuideError::Publish(format!(
                "HTTP {status}: {}",
                text.chars().take(300).collect::<String>()
            )));
        }

        let created: CreatedPosts = response
            .json()
            .await
            .map_err(|e| GuideError::parse(format!("invalid create-post response: {e}")))?;
        let url = created
            .posts
            .into_iter()
            .next()
            .map(|p| p.url)
            .unwrap_or_default();

        info!(%url, "post created");
        Ok(url)
    }

    #[instrument(skip_all, fields(tag = ?tag))]
    async fn list_posts(&self, tag: Option<&str>) -> Result<Vec<PostSummary>> {
        let mut all: Vec<PostSummary> = Vec::new();
        let mut page = 1u32;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("limit", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
                ("fields", "title,meta_title".to_string()),
            ];
            if let Some(tag) = tag {
                query.push(("filter", format!("tag:{tag}")));
            }

            let response = self
                .client
                .get(&self.posts_url)
                .header("Authorization", self.auth_header()?)
                .query(&query)
                .send()
                .await
                .map_err(|e| GuideError::Publish(format!("{}: {e}", self.posts_url)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(GuideError::Publish(format!("listing posts: HTTP {status}")));
            }

            let body: PostPage = response
                .json()
                .await
                .map_err(|e| GuideError::parse(format!("invalid post list response: {e}")))?;

            let fetched = body.posts.len();
            all.extend(body.posts);
            debug!(page, fetched, "post page loaded");

            let pages = body.meta.map(|m| m.pagination.pages).unwrap_or(1);
            if fetched == 0 || page >= pages {
                break;
            }
            page += 1;
        }

        info!(count = all.len(), "existing posts loaded");
        Ok(all)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
