//! Build list file loading.
//!
//! ```text
//! # comment
//! Storm Sorcerer          <- category 일반
//! ## 근접 딜러
//! Battle Master Fighter   <- category 근접 딜러
//! ```

use std::path::Path;

use tracing::{debug, info};

use guidepress_shared::{BatchItem, DEFAULT_CATEGORY, GuideError, Result};

/// Parse build list text into items.
pub fn parse_build_list(text: &str) -> Vec<BatchItem> {
    let mut items = Vec::new();
    let mut category = DEFAULT_CATEGORY.to_string();

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("##") {
            category = rest.trim_start_matches('#').trim().to_string();
            if category.is_empty() {
                category = DEFAULT_CATEGORY.to_string();
            }
            debug!(%category, "category");
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        items.push(BatchItem::new(line, category.clone()));
    }
    items
}

/// Load a build list file. A missing file is an error.
pub fn load_build_list(path: &Path) -> Result<Vec<BatchItem>> {
    let text = std::fs::read_to_string(path).map_err(|e| GuideError::io(path, e))?;
    let items = parse_build_list(&text);
    info!(path = %path.display(), count = items.len(), "build list loaded");
    Ok(items)
}
