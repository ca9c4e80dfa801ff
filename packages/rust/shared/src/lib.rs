//! Shared types, error model, and configuration for GuidePress.
//!
//! This crate is the foundation depended on by all other GuidePress crates.
//! It provides:
//! - [`GuideError`], the unified error type
//! - Domain types ([`Candidate`], [`ResolvedImage`], [`AnnotatedDocument`], [`BatchReport`])
//! - Configuration ([`AppConfig`], [`BackendConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, DefaultsConfig, GhostConfig, ScheduleConfig, SourceConfig,
    TranslatorConfig, VideoConfig, WikiConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, read_secret, validate_api_keys,
};
pub use error::{GuideError, Result};
pub use types::{
    AnnotatedDocument, BatchItem, BatchReport, Candidate, DEFAULT_CATEGORY, GuideStats,
    ItemResult, ResolvedImage, TermCategory,
};
