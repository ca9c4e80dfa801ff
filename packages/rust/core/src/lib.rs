//! Guide generation, batching, scheduling, and publishing for GuidePress.
//!
//! This crate ties the generation backends, term extraction, image lookup,
//! and markdown passes together into the end-to-end workflows the CLI runs.

pub mod assembler;
pub mod batch;
pub mod builds;
pub mod generation;
pub mod pipeline;
pub mod publish;
pub mod resume;
pub mod schedule;

pub use assembler::{GuideAssembler, GuideDocument};
pub use batch::{BatchOptions, BatchProgress, BatchRunner, BuildProcessor, ProcessedBuild, SilentProgress};
pub use builds::{load_build_list, parse_build_list};
pub use generation::{CannedGenerator, CannedRole, ChatCompletionsClient, TextGenerator};
pub use pipeline::{GuidePipeline, PipelineOptions};
pub use publish::{AdminKey, GhostClient, PostDraft, PostStatus, PostSummary, Publisher};
pub use resume::{build_name_from_post, find_resume_point, published_names};
pub use schedule::{assign, default_start, publish_time};
