//! On-disk outputs of a run.
//!
//! Three kinds of file are written, all atomically (temp file, then rename):
//!
//! ```text
//! <dir>/
//! ├── bg3_storm_sorcerer_build_20250101.md             guide markdown
//! ├── batch_generation_report_20250101_093000.json     batch report
//! └── build_data_storm_sorcerer_20250101_093000.json   snapshot
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use guidepress_shared::{BatchReport, GuideError, Result};

const DATE_FORMAT: &str = "%Y%m%d";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A file that was written, with its checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Intermediate texts of one guide, kept for debugging generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSnapshot {
    pub build_name: String,
    pub timestamp: DateTime<Utc>,
    pub english_source: String,
    pub korean_translation: String,
    pub cleaned: String,
    pub final_markdown: String,
    pub terms: Vec<String>,
    pub images: Vec<String>,
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Lowercase snake-case form of a build name, safe for file names.
pub fn safe_build_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            ' ' | '-' => out.push('_'),
            '\'' => {}
            c if c.is_alphanumeric() || c == '_' => out.extend(c.to_lowercase()),
            _ => {}
        }
    }
    out
}

/// `bg3_{name}_build_{YYYYMMDD}.md`
pub fn guide_file_name(build_name: &str, date: NaiveDate) -> String {
    format!(
        "bg3_{}_build_{}.md",
        safe_build_name(build_name),
        date.format(DATE_FORMAT)
    )
}

/// `batch_generation_report_{YYYYMMDD_HHMMSS}.json`
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("batch_generation_report_{}.json", at.format(TIMESTAMP_FORMAT))
}

/// `{prefix}_{YYYYMMDD_HHMMSS}.json`
pub fn snapshot_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.json", at.format(TIMESTAMP_FORMAT))
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Writes guides, reports, and snapshots under one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a finished guide as markdown.
    #[instrument(skip_all, fields(build = %build_name))]
    pub fn write_guide(
        &self,
        build_name: &str,
        markdown: &str,
        date: NaiveDate,
    ) -> Result<WrittenArtifact> {
        let artifact = self.write_atomic(&guide_file_name(build_name, date), markdown)?;
        info!(path = %artifact.path.display(), "guide saved");
        Ok(artifact)
    }

    /// Write a batch report as pretty JSON, named after its timestamp.
    #[instrument(skip_all, fields(run_id = %report.run_id))]
    pub fn write_report(&self, report: &BatchReport) -> Result<WrittenArtifact> {
        let json = to_json(report)?;
        let artifact = self.write_atomic(&report_file_name(report.timestamp), &json)?;
        info!(path = %artifact.path.display(), "batch report saved");
        Ok(artifact)
    }

    /// Write any serializable value as `{prefix}_{timestamp}.json`.
    pub fn write_snapshot<T: Serialize>(
        &self,
        prefix: &str,
        data: &T,
        at: DateTime<Utc>,
    ) -> Result<WrittenArtifact> {
        let json = to_json(data)?;
        self.write_atomic(&snapshot_file_name(prefix, at), &json)
    }

    /// Write the intermediate texts of a guide.
    pub fn write_build_snapshot(&self, snapshot: &BuildSnapshot) -> Result<WrittenArtifact> {
        let prefix = format!("build_data_{}", safe_build_name(&snapshot.build_name));
        self.write_snapshot(&prefix, snapshot, snapshot.timestamp)
    }

    fn write_atomic(&self, filename: &str, content: &str) -> Result<WrittenArtifact> {
        std::fs::create_dir_all(&self.dir).map_err(|e| GuideError::io(&self.dir, e))?;

        let target = self.dir.join(filename);
        let temp = self.dir.join(format!(".{filename}.tmp"));

        std::fs::write(&temp, content).map_err(|e| GuideError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| GuideError::io(&target, e))?;

        let sha256 = content_hash(content);
        debug!(file = %filename, size = content.len(), "wrote artifact");

        Ok(WrittenArtifact {
            path: target,
            sha256,
            size_bytes: content.len(),
        })
    }
}

/// Hex SHA-256 of a text.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| GuideError::validation(format!("JSON serialization failed: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use guidepress_shared::{GuideStats, ItemResult};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 9, 30, 5).unwrap()
    }

    #[test]
    fn safe_names() {
        assert_eq!(safe_build_name("Storm Sorcerer"), "storm_sorcerer");
        assert_eq!(safe_build_name("Hunter's Half-Orc"), "hunters_half_orc");
        assert_eq!(safe_build_name("  Fire/Ice  "), "fireice");
    }

    #[test]
    fn file_names() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            guide_file_name("Storm Sorcerer", date),
            "bg3_storm_sorcerer_build_20250307.md"
        );
        assert_eq!(
            report_file_name(at()),
            "batch_generation_report_20250307_093005.json"
        );
        assert_eq!(snapshot_file_name("raw", at()), "raw_20250307_093005.json");
    }

    #[test]
    fn writes_guide_with_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path().join("out"));
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        let artifact = writer.write_guide("Storm Sorcerer", "# 제목\n", date).unwrap();

        assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "# 제목\n");
        assert_eq!(artifact.sha256, content_hash("# 제목\n"));
        assert_eq!(artifact.sha256.len(), 64);
        assert_eq!(artifact.size_bytes, "# 제목\n".len());
        assert!(!tmp.path().join("out/.bg3_storm_sorcerer_build_20250307.md.tmp").exists());
    }

    #[test]
    fn writes_report_json() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path());
        let mut report = BatchReport::from_results(
            vec![ItemResult {
                build_name: "Storm Sorcerer".into(),
                category: "일반".into(),
                success: true,
                post_url: Some("https://blog/p/1".into()),
                stats: Some(GuideStats { image_count: 3, char_count: 1200 }),
                error: None,
                execution_time: 42.0,
                scheduled_time: None,
            }],
            42.0,
        );
        report.timestamp = at();

        let artifact = writer.write_report(&report).unwrap();
        assert!(artifact.path.ends_with("batch_generation_report_20250307_093005.json"));

        let back: BatchReport =
            serde_json::from_str(&std::fs::read_to_string(&artifact.path).unwrap()).unwrap();
        assert_eq!(back.completed, 1);
        assert_eq!(back.results[0].build_name, "Storm Sorcerer");
    }

    #[test]
    fn writes_build_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path());
        let snapshot = BuildSnapshot {
            build_name: "Storm Sorcerer".into(),
            timestamp: at(),
            english_source: "en".into(),
            korean_translation: "ko".into(),
            cleaned: "ko".into(),
            final_markdown: "final".into(),
            terms: vec!["Thunderwave".into()],
            images: vec![],
        };
        let artifact = writer.write_build_snapshot(&snapshot).unwrap();
        assert!(artifact
            .path
            .ends_with("build_data_storm_sorcerer_20250307_093005.json"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&artifact.path).unwrap()).unwrap();
        assert_eq!(json["terms"][0], "Thunderwave");
    }
}
