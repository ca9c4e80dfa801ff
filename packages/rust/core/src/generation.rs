//! Text generation backends.
//!
//! Both the research (English source) and rewrite (Korean post) steps talk
//! to OpenAI-compatible chat completions endpoints through
//! [`ChatCompletionsClient`]. [`CannedGenerator`] stands in for them in test
//! mode.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use guidepress_artifacts::ArtifactWriter;
use guidepress_shared::{BackendConfig, GuideError, Result, read_secret};

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("GuidePress/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Prompt in, prose out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Backend label for logs.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Prompt asking the research backend for one community-verified build.
pub fn build_research_prompt(build_name: &str) -> String {
    format!(
        "Search Reddit, YouTube, Fextralife, Steam discussions, and expert build guides \
for the most highly rated {build_name} build in Baldur's Gate 3 on the latest patch.

Return a single, coherent build that the community actually uses. Include:

1. Exact ability score allocation at character creation (STR / DEX / CON / INT / WIS / CHA)
2. Recommended race and background, with reasons
3. Spells to take at each level from 1 to 12
4. Subclass and multiclass path, if any, with pros and cons
5. Best gear for each Act (1-3): weapons, armor, accessories
6. Combos, tactical tips, and overall play style
7. The patch or game version the build is based on

Write every spell, item, and feature name with its exact English in-game name. \
If a Korean localized name exists, add it in parentheses.

Do not merge contradicting sources and do not fill gaps with guesses."
    )
}

/// Prompt asking the rewrite backend for a Korean blog post.
pub fn korean_rewrite_prompt(build_name: &str, english_source: &str) -> String {
    format!(
        "다음은 Baldur's Gate 3 {build_name} 빌드에 대한 영어 공략 정보임. \
이 내용을 바탕으로 한국어 블로그 공략글을 작성할 것.

- 스펠, 장비, 특성 이름은 공식 한국어 번역이나 유저들이 흔히 쓰는 이름으로 쓰고, 필요하면 괄호 안에 영어 이름을 병기
- 표보다는 제목과 리스트 위주로 가독성 있게
- 문체는 음슴체, 정보는 전문가 수준으로 정확하게
- 스탯 분배는 정확한 숫자로, 레벨별 스펠 선택은 구체적으로
- 멀티클래스가 있다면 조합과 장단점, Act별 추천 장비, 전투 전략과 콤보 팁 포함
- 기반 패치/버전 명시, 원문에 없는 내용은 절대 창작하지 말 것
- 마크다운 형식, # 제목 하나와 ##, ### 섹션 헤딩 사용
- 글머리에 요약 카드(인용 블록)는 넣지 말 것

원문 정보:
{english_source}"
    )
}

// ---------------------------------------------------------------------------
// Chat completions client
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for one OpenAI-compatible chat completions endpoint.
pub struct ChatCompletionsClient {
    client: Client,
    label: String,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: Option<u32>,
    snapshots: Option<ArtifactWriter>,
}

impl ChatCompletionsClient {
    /// Build a client, reading the API key from the configured env var.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let api_key = read_secret(&config.api_key_env)?;
        Self::new(config, api_key)
    }

    pub fn new(config: &BackendConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GuideError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            label: config.label.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_tokens: config.max_tokens,
            snapshots: None,
        })
    }

    /// Save every raw response body as `{label}_raw_response_{ts}.json`.
    pub fn with_snapshots(mut self, writer: ArtifactWriter) -> Self {
        self.snapshots = Some(writer);
        self
    }

    fn save_snapshot(&self, body: &serde_json::Value) {
        let Some(writer) = &self.snapshots else {
            return;
        };
        let prefix = format!("{}_raw_response", self.label);
        match writer.write_snapshot(&prefix, body, Utc::now()) {
            Ok(artifact) => debug!(path = %artifact.path.display(), "raw response saved"),
            Err(e) => warn!(error = %e, "failed to save raw response"),
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    #[instrument(skip_all, fields(backend = %self.label, model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        info!(prompt_chars = prompt.chars().count(), "requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GuideError::Generation(format!("{}: {e}", self.label)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GuideError::Generation(format!(
                "{}: HTTP {status}: {}",
                self.label,
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GuideError::parse(format!("{}: invalid response body: {e}", self.label)))?;
        self.save_snapshot(&body);

        let parsed: ChatResponse = serde_json::from_value(body)
            .map_err(|e| GuideError::parse(format!("{}: unexpected response shape: {e}", self.label)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GuideError::Generation(format!("{}: empty completion", self.label)))?;

        info!(response_chars = content.chars().count(), "completion received");
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// Canned generator
// ---------------------------------------------------------------------------

/// Which fixed text a [`CannedGenerator`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedRole {
    /// English research writeup.
    Source,
    /// Korean post.
    Translator,
}

/// Returns fixed texts so the pipeline runs without credentials.
///
/// The Korean text has no H1, so the assembler titles it after the build.
#[derive(Debug, Clone, Copy)]
pub struct CannedGenerator {
    role: CannedRole,
}

impl CannedGenerator {
    pub fn new(role: CannedRole) -> Self {
        Self { role }
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(match self.role {
            CannedRole::Source => "## Build Overview\n\n\
Take the Oath of Devotion and lead with Divine Smite on every crit. \
Cast Bless before engaging and keep Healing Word ready for downed allies.\n\n\
- Level 1: Thunderwave (천둥파) for crowd control\n\
- Level 5: Extra Attack\n\n\
Best gear: Helldusk Armor and the Cloak of Protection."
                .to_string(),
            CannedRole::Translator => "## 개요\n\
이 빌드는 **신성한 강타(Divine Smite)** 를 중심으로 운영함. 치명타가 뜨면 바로 강타를 넣는 게 핵심임.\n\n\
## 주문\n\
- 전투 시작 전 **축복(Bless)** 을 걸어둘 것\n\
- 1레벨: 천둥파 (Thunderwave) 로 적을 밀어냄\n\
- 쓰러진 아군은 치유의 단어로 일으킴\n\n\
## 장비\n\
헬더스크 갑옷 (Helldusk Armor) 과 보호의 망토 (Cloak of Protection) 추천함."
                .to_string(),
        })
    }

    fn name(&self) -> &str {
        match self.role {
            CannedRole::Source => "canned-source",
            CannedRole::Translator => "canned-translator",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer, max_tokens: Option<u32>) -> BackendConfig {
        BackendConfig {
            label: "translator".into(),
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            model: "grok-3-beta".into(),
            api_key_env: "UNUSED".into(),
            timeout: Duration::from_secs(5),
            max_tokens,
        }
    }

    #[tokio::test]
    async fn posts_chat_request_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({
                "model": "grok-3-beta",
                "max_tokens": 4000,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "안녕"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(&backend(&server, Some(4000)), "secret").unwrap();
        assert_eq!(client.generate("hello").await.unwrap(), "안녕");
        assert_eq!(client.name(), "translator");
    }

    #[tokio::test]
    async fn non_success_status_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(&backend(&server, None), "k").unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, GuideError::Generation(ref m) if m.contains("429")));
    }

    #[tokio::test]
    async fn empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(&backend(&server, None), "k").unwrap();
        assert!(client.generate("x").await.is_err());
    }

    #[tokio::test]
    async fn raw_response_snapshot_written() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "text"}}]
            })))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();

        let client = ChatCompletionsClient::new(&backend(&server, None), "k")
            .unwrap()
            .with_snapshots(ArtifactWriter::new(tmp.path()));
        client.generate("x").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("translator_raw_response_"));
    }

    #[test]
    fn prompts_embed_inputs() {
        assert!(build_research_prompt("Storm Sorcerer").contains("Storm Sorcerer build"));
        let p = korean_rewrite_prompt("Storm Sorcerer", "ENGLISH BODY");
        assert!(p.contains("Storm Sorcerer"));
        assert!(p.ends_with("ENGLISH BODY"));
    }

    #[tokio::test]
    async fn canned_texts_mention_known_terms() {
        let source = CannedGenerator::new(CannedRole::Source).generate("").await.unwrap();
        assert!(source.contains("Divine Smite"));
        let post = CannedGenerator::new(CannedRole::Translator).generate("").await.unwrap();
        assert!(post.starts_with("## 개요"));
        assert!(post.contains("(Thunderwave)"));
    }
}
