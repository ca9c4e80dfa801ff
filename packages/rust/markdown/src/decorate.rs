//! Title, header image, and video thumbnail decoration.

use std::sync::LazyLock;

use regex::Regex;

/// Alt text of the fixed header image.
const HEADER_ALT: &str = "Baldur's Gate 3";

/// Caption placed under a video thumbnail.
const THUMBNAIL_CAPTION: &str = "*이미지 클릭 시 YouTube 동영상으로 이동합니다*";

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t]*$").expect("valid regex"));

/// The guide title for a build.
pub fn guide_title(build_name: &str) -> String {
    format!("{build_name} 빌드 가이드")
}

/// Text of the first H1 heading, if any.
pub fn extract_title(md: &str) -> Option<String> {
    H1_RE.captures(md).map(|c| c[1].trim().to_string())
}

/// Prepend `# {build} 빌드 가이드` when the document has no H1.
pub fn ensure_title(md: &str, build_name: &str) -> String {
    if extract_title(md).is_some() {
        return md.to_string();
    }
    format!("# {}\n\n{}", guide_title(build_name), md.trim_start())
}

/// Prepend the fixed header image and a rule. A no-op if already present.
pub fn prepend_header(md: &str, header_image_url: &str) -> String {
    let header = format!("![{HEADER_ALT}]({header_image_url})");
    if md.trim_start().starts_with(&header) {
        return md.to_string();
    }
    format!("{header}\n\n---\n\n{md}")
}

/// Insert a linked video thumbnail after the first H1, or at the top when
/// there is none.
pub fn insert_thumbnail(md: &str, build_name: &str, thumbnail_url: &str, video_url: &str) -> String {
    let block = format!(
        "[![{}]({thumbnail_url})]({video_url})\n{THUMBNAIL_CAPTION}",
        guide_title(build_name)
    );
    if md.contains(&block) {
        return md.to_string();
    }

    match H1_RE.find(md) {
        Some(m) => {
            let (head, tail) = md.split_at(m.end());
            format!("{head}\n\n{block}\n\n{}", tail.trim_start_matches('\n'))
        }
        None => format!("{block}\n\n{md}"),
    }
}
