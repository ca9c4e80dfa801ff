//! Config-driven wiring: one build name in, saved guide and post out.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, instrument, warn};

use guidepress_artifacts::ArtifactWriter;
use guidepress_media::{ImageResolver, WikiClient, YoutubeClient};
use guidepress_shared::{AppConfig, BackendConfig, BatchItem, Result};

use crate::assembler::{GuideAssembler, GuideDocument};
use crate::batch::{BuildProcessor, ProcessedBuild};
use crate::generation::{CannedGenerator, CannedRole, ChatCompletionsClient, TextGenerator};
use crate::publish::{GhostClient, PostDraft, PostStatus, Publisher};

/// Switches for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Use canned generator texts instead of the generation backends.
    pub test_mode: bool,
    /// Publish each guide after saving it.
    pub publish: bool,
    /// Override for `defaults.output_dir`.
    pub output_dir: Option<PathBuf>,
}

/// Assembles, saves, and optionally publishes guides.
pub struct GuidePipeline {
    assembler: GuideAssembler,
    publisher: Option<Box<dyn Publisher>>,
    writer: ArtifactWriter,
    batch_tag: String,
    status: PostStatus,
}

impl GuidePipeline {
    pub fn new(assembler: GuideAssembler, writer: ArtifactWriter, config: &AppConfig) -> Self {
        Self {
            assembler,
            publisher: None,
            writer,
            batch_tag: config.ghost.batch_tag.clone(),
            status: PostStatus::from_config(&config.ghost.status),
        }
    }

    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Build every collaborator from config and environment.
    ///
    /// In test mode the generators are canned; otherwise both backend keys
    /// must be set.
    pub fn from_config(config: &AppConfig, options: &PipelineOptions) -> Result<Self> {
        let snapshots = (!config.defaults.snapshot_dir.is_empty())
            .then(|| ArtifactWriter::new(&config.defaults.snapshot_dir));

        let (source, translator): (Box<dyn TextGenerator>, Box<dyn TextGenerator>) =
            if options.test_mode {
                info!("test mode: using canned generator texts");
                (
                    Box::new(CannedGenerator::new(CannedRole::Source)),
                    Box::new(CannedGenerator::new(CannedRole::Translator)),
                )
            } else {
                (
                    Box::new(chat_client(&BackendConfig::from(&config.source), snapshots.clone())?),
                    Box::new(chat_client(&BackendConfig::from(&config.translator), snapshots.clone())?),
                )
            };

        let resolver = ImageResolver::new(Box::new(WikiClient::new(&config.wiki)?), &config.wiki);
        let mut assembler =
            GuideAssembler::new(source, translator, resolver, &config.defaults.header_image_url);
        if config.video.enabled {
            assembler = assembler.with_video(Box::new(YoutubeClient::new(&config.video)?));
        }
        if let Some(writer) = snapshots {
            assembler = assembler.with_snapshots(writer);
        }

        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));
        let mut pipeline = Self::new(assembler, ArtifactWriter::new(output_dir), config);

        if options.publish {
            pipeline = pipeline.with_publisher(Box::new(GhostClient::from_config(&config.ghost)?));
        }
        Ok(pipeline)
    }

    /// Assemble and save one guide without publishing.
    pub async fn generate(&self, build_name: &str) -> Result<(GuideDocument, PathBuf)> {
        let doc = self.assembler.try_assemble(build_name).await?;
        let artifact = self
            .writer
            .write_guide(&doc.build_name, &doc.markdown, Local::now().date_naive())?;
        Ok((doc, artifact.path))
    }
}

fn chat_client(config: &BackendConfig, snapshots: Option<ArtifactWriter>) -> Result<ChatCompletionsClient> {
    let client = ChatCompletionsClient::from_config(config)?;
    Ok(match snapshots {
        Some(writer) => client.with_snapshots(writer),
        None => client,
    })
}

#[async_trait]
impl BuildProcessor for GuidePipeline {
    #[instrument(skip_all, fields(build = %item.name, category = %item.category))]
    async fn process(&self, item: &BatchItem) -> Result<ProcessedBuild> {
        let (doc, path) = self.generate(&item.name).await?;
        info!(path = %path.display(), "guide saved");

        let Some(publisher) = &self.publisher else {
            return Ok(ProcessedBuild {
                post_url: None,
                stats: doc.stats,
            });
        };

        let mut draft = PostDraft::for_guide(
            &doc.build_name,
            &item.category,
            &doc.title,
            &doc.markdown,
            &self.batch_tag,
            self.status,
        );
        if let Some(at) = item.scheduled_at {
            draft = draft.scheduled_at(at);
        }
        if let Some(video) = &doc.video {
            draft.feature_image = Some(video.thumbnail_url.clone());
        }

        let url = publisher.create_post(&draft).await?;
        if url.is_empty() {
            warn!("post created without a URL");
        }
        Ok(ProcessedBuild {
            post_url: Some(url),
            stats: doc.stats,
        })
    }
}
