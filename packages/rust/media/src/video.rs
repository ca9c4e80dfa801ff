//! Video thumbnail lookup for a build name.
//!
//! Scrapes video ids from a search results page, then checks thumbnail
//! resolutions from best to worst with HEAD requests.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use guidepress_shared::{GuideError, Result, VideoConfig};

/// User-Agent string for video site requests.
const USER_AGENT: &str = concat!("GuidePress/", env!("CARGO_PKG_VERSION"));

/// Thumbnail file names, best first. `default.jpg` always exists.
const THUMBNAIL_QUALITIES: &[&str] = &["maxresdefault", "sddefault", "hqdefault"];
const FALLBACK_THUMBNAIL: &str = "default";

/// A video chosen for a build, with its preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoThumbnail {
    pub video_id: String,
    pub video_url: String,
    pub thumbnail_url: String,
}

/// Finds a representative video for a build name.
#[async_trait]
pub trait VideoLookup: Send + Sync {
    async fn find_video(&self, build_name: &str) -> Result<Option<VideoThumbnail>>;
}

/// Search queries tried in order for a build.
pub fn search_queries(build_name: &str) -> [String; 2] {
    [
        format!("{build_name} BG3 build"),
        format!("Baldur's Gate 3 {build_name} guide"),
    ]
}

/// Unique 11-character video ids in page order, at most `limit`.
pub fn extract_video_ids(html: &str, limit: usize) -> Vec<String> {
    static WATCH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"watch\?v=([A-Za-z0-9_-]{11})").expect("valid regex"));

    let mut ids: Vec<String> = Vec::new();
    for caps in WATCH_RE.captures_iter(html) {
        let id = &caps[1];
        if !ids.iter().any(|i| i == id) {
            ids.push(id.to_string());
            if ids.len() >= limit {
                break;
            }
        }
    }
    ids
}

/// Scraping client for the public search page and thumbnail CDN.
pub struct YoutubeClient {
    client: Client,
    search_base: String,
    thumbnail_base: String,
    max_results: usize,
}

impl YoutubeClient {
    pub fn new(config: &VideoConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuideError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_base: config.search_base.trim_end_matches('/').to_string(),
            thumbnail_base: config.thumbnail_base.trim_end_matches('/').to_string(),
            max_results: config.max_results.max(1),
        })
    }

    /// Video ids from the search results page for `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let mut url = Url::parse(&format!("{}/results", self.search_base))
            .map_err(|e| GuideError::config(format!("invalid video search base: {e}")))?;
        url.query_pairs_mut().append_pair("search_query", query);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GuideError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GuideError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GuideError::Network(format!("{url}: failed to read body: {e}")))?;

        Ok(extract_video_ids(&body, self.max_results))
    }

    /// Best available thumbnail for a video id.
    pub async fn best_thumbnail(&self, video_id: &str) -> String {
        for quality in THUMBNAIL_QUALITIES {
            let url = self.thumbnail_url(video_id, quality);
            match self.client.head(&url).send().await {
                Ok(resp) if resp.status().as_u16() == 200 => return url,
                Ok(resp) => debug!(%url, status = %resp.status(), "thumbnail unavailable"),
                Err(e) => debug!(%url, error = %e, "thumbnail check failed"),
            }
        }
        self.thumbnail_url(video_id, FALLBACK_THUMBNAIL)
    }

    fn thumbnail_url(&self, video_id: &str, quality: &str) -> String {
        format!("{}/vi/{video_id}/{quality}.jpg", self.thumbnail_base)
    }

    fn video_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={video_id}", self.search_base)
    }
}

#[async_trait]
impl VideoLookup for YoutubeClient {
    #[instrument(skip_all, fields(build = %build_name))]
    async fn find_video(&self, build_name: &str) -> Result<Option<VideoThumbnail>> {
        for query in search_queries(build_name) {
            let ids = match self.search(&query).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(%query, error = %e, "video search failed");
                    continue;
                }
            };

            if let Some(video_id) = ids.into_iter().next() {
                let thumbnail_url = self.best_thumbnail(&video_id).await;
                info!(%video_id, %thumbnail_url, "video thumbnail found");
                return Ok(Some(VideoThumbnail {
                    video_url: self.video_url(&video_id),
                    video_id,
                    thumbnail_url,
                }));
            }
            debug!(%query, "no videos in search results");
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> YoutubeClient {
        YoutubeClient::new(&VideoConfig {
            search_base: server.uri(),
            thumbnail_base: server.uri(),
            ..VideoConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn ids_are_unique_and_capped() {
        let html = r#"
            <a href="/watch?v=AAAAAAAAAAA">x</a>
            <a href="/watch?v=AAAAAAAAAAA">dup</a>
            <a href="/watch?v=BBBBBBBBB_b">y</a>
            <a href="/watch?v=CCCCCCCCC-c">z</a>
            <a href="/watch?v=DDDDDDDDDDD">w</a>"#;
        assert_eq!(
            extract_video_ids(html, 3),
            vec!["AAAAAAAAAAA", "BBBBBBBBB_b", "CCCCCCCCC-c"]
        );
        assert!(extract_video_ids("no videos", 3).is_empty());
    }

    #[test]
    fn queries_in_order() {
        let [first, second] = search_queries("Storm Sorcerer");
        assert_eq!(first, "Storm Sorcerer BG3 build");
        assert_eq!(second, "Baldur's Gate 3 Storm Sorcerer guide");
    }

    #[tokio::test]
    async fn falls_back_to_second_query_and_checks_thumbnails() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/results"))
            .and(query_param("search_query", "Storm Sorcerer BG3 build"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nothing</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/results"))
            .and(query_param("search_query", "Baldur's Gate 3 Storm Sorcerer guide"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/watch?v=abcdefghijk">v</a>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/vi/abcdefghijk/maxresdefault.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/vi/abcdefghijk/sddefault.jpg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let video = client_for(&server)
            .find_video("Storm Sorcerer")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(video.video_id, "abcdefghijk");
        assert_eq!(
            video.thumbnail_url,
            format!("{}/vi/abcdefghijk/sddefault.jpg", server.uri())
        );
        assert_eq!(video.video_url, format!("{}/watch?v=abcdefghijk", server.uri()));
    }

    #[tokio::test]
    async fn default_thumbnail_when_checks_fail() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = client_for(&server).best_thumbnail("abcdefghijk").await;
        assert!(url.ends_with("/vi/abcdefghijk/default.jpg"));
    }

    #[tokio::test]
    async fn no_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let video = client_for(&server).find_video("Nobody").await.unwrap();
        assert!(video.is_none());
    }
}
