//! Guide assembler.
//!
//! Runs one build name through the whole pipeline:
//!
//! 1. research the build (English source)
//! 2. rewrite it as a Korean post, falling back to the source backend
//! 3. strip leftover summary cards and make sure there is a title
//! 4. extract terms from the English source and the Korean post, resolve
//!    their images
//! 5. annotate the Korean post
//! 6. header image, optional video thumbnail, combat routine, sentence breaks

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use guidepress_artifacts::{ArtifactWriter, BuildSnapshot};
use guidepress_markdown::{
    Annotator, ensure_title, extract_title, finalize, guide_title, insert_combat_routine,
    insert_thumbnail, prepend_header, strip_summary_cards,
};
use guidepress_media::{ImageResolver, VideoLookup, VideoThumbnail};
use guidepress_shared::{GuideError, GuideStats, ResolvedImage, Result};
use guidepress_terms::TermExtractor;

use crate::generation::{TextGenerator, build_research_prompt, korean_rewrite_prompt};

/// A finished guide.
#[derive(Debug, Clone)]
pub struct GuideDocument {
    pub build_name: String,
    pub title: String,
    pub markdown: String,
    pub english_source: String,
    pub stats: GuideStats,
    pub images: Vec<ResolvedImage>,
    pub video: Option<VideoThumbnail>,
}

/// Builds guides from a name using the configured collaborators.
pub struct GuideAssembler {
    source: Box<dyn TextGenerator>,
    translator: Box<dyn TextGenerator>,
    extractor: TermExtractor,
    post_extractor: TermExtractor,
    resolver: ImageResolver,
    annotator: Annotator,
    video: Option<Box<dyn VideoLookup>>,
    header_image_url: String,
    snapshots: Option<ArtifactWriter>,
}

impl GuideAssembler {
    pub fn new(
        source: Box<dyn TextGenerator>,
        translator: Box<dyn TextGenerator>,
        resolver: ImageResolver,
        header_image_url: impl Into<String>,
    ) -> Self {
        Self {
            source,
            translator,
            extractor: TermExtractor::english_source(),
            post_extractor: TermExtractor::translated_markdown(),
            resolver,
            annotator: Annotator::default(),
            video: None,
            header_image_url: header_image_url.into(),
            snapshots: None,
        }
    }

    pub fn with_video(mut self, video: Box<dyn VideoLookup>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_extractor(mut self, extractor: TermExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extractor for terms glossed only in the Korean post.
    pub fn with_post_extractor(mut self, extractor: TermExtractor) -> Self {
        self.post_extractor = extractor;
        self
    }

    /// Save the intermediate texts of every guide.
    pub fn with_snapshots(mut self, writer: ArtifactWriter) -> Self {
        self.snapshots = Some(writer);
        self
    }

    /// Assemble a guide, logging and swallowing any failure.
    pub async fn assemble(&self, build_name: &str) -> Option<GuideDocument> {
        match self.try_assemble(build_name).await {
            Ok(doc) => Some(doc),
            Err(e) => {
                error!(build = %build_name, error = %e, "guide assembly failed");
                None
            }
        }
    }

    /// Assemble a guide, returning the first fatal error.
    #[instrument(skip_all, fields(build = %build_name))]
    pub async fn try_assemble(&self, build_name: &str) -> Result<GuideDocument> {
        let build_name = build_name.trim();
        if build_name.is_empty() {
            return Err(GuideError::validation("build name is empty"));
        }

        // --- Source ---
        info!(backend = self.source.name(), "fetching build source");
        let english = self
            .source
            .generate(&build_research_prompt(build_name))
            .await?;

        // --- Translation ---
        let korean = self.translate(build_name, &english).await?;

        // --- Cleanup ---
        let cleaned = strip_summary_cards(&korean);
        let titled = ensure_title(&cleaned, build_name);

        // --- Terms and images ---
        let mut extraction = self.extractor.extract(&english);
        let source_terms = extraction.len();
        extraction.merge(self.post_extractor.extract(&titled));
        info!(
            terms = extraction.len(),
            from_post = extraction.len() - source_terms,
            "terms extracted"
        );
        let resolution = self.resolver.resolve_all(&extraction.candidates).await;
        let annotated = self.annotator.annotate(&titled, &resolution.images);

        // --- Decoration ---
        let mut markdown = prepend_header(&annotated.markdown, &self.header_image_url);
        let video = self.find_video(build_name).await;
        if let Some(v) = &video {
            markdown = insert_thumbnail(&markdown, build_name, &v.thumbnail_url, &v.video_url);
        }
        let markdown = finalize(&insert_combat_routine(&markdown));

        let stats = GuideStats::of(&markdown);
        let title = extract_title(&markdown).unwrap_or_else(|| guide_title(build_name));
        info!(
            images = stats.image_count,
            chars = stats.char_count,
            unmatched = annotated.unmatched.len(),
            "guide assembled"
        );

        if let Some(writer) = &self.snapshots {
            let snapshot = BuildSnapshot {
                build_name: build_name.to_string(),
                timestamp: Utc::now(),
                english_source: english.clone(),
                korean_translation: korean,
                cleaned,
                final_markdown: markdown.clone(),
                terms: extraction.terms().iter().map(|t| t.to_string()).collect(),
                images: resolution.images.iter().map(|i| i.image_url.clone()).collect(),
            };
            if let Err(e) = writer.write_build_snapshot(&snapshot) {
                warn!(error = %e, "failed to save build snapshot");
            }
        }

        Ok(GuideDocument {
            build_name: build_name.to_string(),
            title,
            markdown,
            english_source: english,
            stats,
            images: resolution.images,
            video,
        })
    }

    async fn translate(&self, build_name: &str, english: &str) -> Result<String> {
        let prompt = korean_rewrite_prompt(build_name, english);

        info!(backend = self.translator.name(), "translating");
        match self.translator.generate(&prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    backend = self.translator.name(),
                    fallback = self.source.name(),
                    error = %e,
                    "translator failed, using fallback"
                );
                self.source.generate(&prompt).await
            }
        }
    }

    async fn find_video(&self, build_name: &str) -> Option<VideoThumbnail> {
        let lookup = self.video.as_ref()?;
        match lookup.find_video(build_name).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "video lookup failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use guidepress_media::ImageLookup;
    use guidepress_shared::WikiConfig;

    use super::*;
    use crate::generation::{CannedGenerator, CannedRole};

    /// Returns `text`, or fails when `None`. Records prompts.
    #[derive(Clone)]
    struct FixedGenerator {
        label: &'static str,
        text: Option<String>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl FixedGenerator {
        fn new(label: &'static str, text: Option<&str>) -> Self {
            Self {
                label,
                text: text.map(str::to_string),
                prompts: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.text
                .clone()
                .ok_or_else(|| GuideError::Generation(format!("{} down", self.label)))
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    struct StubWiki(&'static [&'static str]);

    #[async_trait]
    impl ImageLookup for StubWiki {
        async fn lookup(&self, name: &str) -> Result<Option<String>> {
            Ok(self
                .0
                .contains(&name)
                .then(|| format!("https://img.test/{}.png", name.replace(' ', "_"))))
        }
    }

    struct StubVideo;

    #[async_trait]
    impl VideoLookup for StubVideo {
        async fn find_video(&self, _build_name: &str) -> Result<Option<VideoThumbnail>> {
            Ok(Some(VideoThumbnail {
                video_id: "abcdefghijk".into(),
                video_url: "https://video.test/watch?v=abcdefghijk".into(),
                thumbnail_url: "https://thumb.test/abcdefghijk.jpg".into(),
            }))
        }
    }

    fn resolver(hits: &'static [&'static str]) -> ImageResolver {
        ImageResolver::new(Box::new(StubWiki(hits)), &WikiConfig::default())
            .with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn canned_pipeline_produces_annotated_guide() {
        let assembler = GuideAssembler::new(
            Box::new(CannedGenerator::new(CannedRole::Source)),
            Box::new(CannedGenerator::new(CannedRole::Translator)),
            resolver(&["Thunderwave", "Divine Smite", "Bless", "Healing Word"]),
            "https://img.test/header.webp",
        )
        .with_video(Box::new(StubVideo));

        let doc = assembler.try_assemble("Paladin").await.unwrap();

        assert!(doc.markdown.starts_with("![Baldur's Gate 3](https://img.test/header.webp)"));
        assert_eq!(doc.title, "Paladin 빌드 가이드");
        assert_eq!(doc.stats.image_count, 4);
        assert_eq!(doc.markdown.matches(r#"alt="Thunderwave""#).count(), 1);
        assert!(doc.markdown.contains(r#"alt="Healing Word""#));
        assert!(doc
            .markdown
            .contains("[![Paladin 빌드 가이드](https://thumb.test/abcdefghijk.jpg)](https://video.test/watch?v=abcdefghijk)"));
        assert_eq!(doc.stats.char_count, doc.markdown.chars().count());
        assert!(doc.markdown.ends_with('\n'));
    }

    #[tokio::test]
    async fn translator_failure_falls_back_to_source_backend() {
        let source = FixedGenerator::new("source", Some("본문. 내용."));
        let translator = FixedGenerator::new("translator", None);
        let assembler = GuideAssembler::new(
            Box::new(source.clone()),
            Box::new(translator.clone()),
            resolver(&[]),
            "h",
        );

        let doc = assembler.try_assemble("Storm Sorcerer").await.unwrap();

        assert_eq!(source.prompts.lock().unwrap().len(), 2);
        assert_eq!(translator.prompts.lock().unwrap().len(), 1);
        assert!(doc.markdown.contains("# Storm Sorcerer 빌드 가이드"));
        assert_eq!(doc.stats.image_count, 0);
    }

    #[tokio::test]
    async fn terms_glossed_only_in_post_are_annotated() {
        let post = "## 주문\n- **천둥 강타(Thunderous Smite)**: 넘어뜨림";
        let assembler = GuideAssembler::new(
            Box::new(FixedGenerator::new("source", Some("Take smites early."))),
            Box::new(FixedGenerator::new("translator", Some(post))),
            resolver(&["Thunderous Smite"]),
            "h",
        );

        let doc = assembler.try_assemble("Paladin").await.unwrap();
        assert_eq!(doc.stats.image_count, 1);
        assert!(doc.markdown.contains(r#"alt="Thunderous Smite""#));
        assert_eq!(doc.images[0].term, "Thunderous Smite");
    }

    #[tokio::test]
    async fn combat_routine_added_from_post_spells() {
        let post = "## 주문\n\
- **축복(Bless)**: 명중 보너스\n\
- **신성한 강타(Divine Smite)**: 광휘 피해\n\
- **천둥파(Thunderwave)**: 적을 밀어냄";
        let assembler = GuideAssembler::new(
            Box::new(FixedGenerator::new("source", Some("Bless, Divine Smite, Thunderwave."))),
            Box::new(FixedGenerator::new("translator", Some(post))),
            resolver(&["Bless", "Divine Smite"]),
            "h",
        );

        let doc = assembler.try_assemble("Paladin").await.unwrap();
        assert_eq!(doc.stats.image_count, 2);
        assert!(doc.markdown.ends_with(
            "## 전투 루틴 예시\n\
1. **전투 준비** → 축복\n\
2. **공격 페이즈** → 신성한 강타\n\
3. **대응 페이즈** → 상황에 따라 천둥파 사용\n\
4. **위기 상황** → 보유한 포션 및 스크롤 적극 활용\n"
        ));
    }

    #[tokio::test]
    async fn existing_combat_section_is_kept() {
        let post = "## 전투 전략\n선공 후 후퇴";
        let assembler = GuideAssembler::new(
            Box::new(FixedGenerator::new("source", Some("Fight."))),
            Box::new(FixedGenerator::new("translator", Some(post))),
            resolver(&[]),
            "h",
        );

        let doc = assembler.try_assemble("Paladin").await.unwrap();
        assert!(!doc.markdown.contains("전투 루틴 예시"));
        assert!(doc.markdown.ends_with("## 전투 전략\n선공 후 후퇴\n"));
    }

    #[tokio::test]
    async fn source_failure_aborts() {
        let assembler = GuideAssembler::new(
            Box::new(FixedGenerator::new("source", None)),
            Box::new(FixedGenerator::new("translator", Some("x"))),
            resolver(&[]),
            "h",
        );
        assert!(assembler.assemble("X").await.is_none());
        assert!(matches!(
            assembler.try_assemble("X").await,
            Err(GuideError::Generation(_))
        ));
        assert!(matches!(
            assembler.try_assemble("  ").await,
            Err(GuideError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn summary_cards_removed_and_snapshot_saved() {
        let tmp = tempfile::tempdir().unwrap();
        let post = "# 제목\n\n> **빌드명**: X\n> **강점**: Y\n\n본문";
        let assembler = GuideAssembler::new(
            Box::new(FixedGenerator::new("source", Some("English"))),
            Box::new(FixedGenerator::new("translator", Some(post))),
            resolver(&[]),
            "h",
        )
        .with_snapshots(ArtifactWriter::new(tmp.path()));

        let doc = assembler.try_assemble("X").await.unwrap();
        assert!(!doc.markdown.contains("빌드명"));
        assert_eq!(doc.title, "제목");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}
