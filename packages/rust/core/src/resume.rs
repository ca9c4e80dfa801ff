//! Where a previous batch run left off.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use guidepress_shared::BatchItem;

use crate::publish::PostSummary;

/// Title prefix older batch runs put on their posts.
const BATCH_MARKER: &str = "[배치생성]";
const GUIDE_SUFFIX: &str = "빌드 가이드";

/// Index of the first item whose name is not in `published`, or
/// `items.len()` when every item is present.
///
/// Only the first gap matters: later items are retried even if published.
pub fn find_resume_point(items: &[BatchItem], published: &HashSet<String>) -> usize {
    match items.iter().position(|item| !published.contains(&item.name)) {
        Some(i) => {
            info!(index = i, build = %items[i].name, "resume point found");
            i
        }
        None => {
            info!("every build is already published");
            items.len()
        }
    }
}

/// Build name encoded in a post's titles, if it looks like one of ours.
pub fn build_name_from_post(post: &PostSummary) -> Option<String> {
    static META_TITLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^BG3\s+(.+?)\s+빌드 가이드$").expect("valid regex"));

    if let Some(caps) = post
        .meta_title
        .as_deref()
        .and_then(|m| META_TITLE_RE.captures(m.trim()))
    {
        return Some(caps[1].to_string());
    }

    let title = post.title.trim();
    let rest = title.strip_prefix(BATCH_MARKER)?;
    if !rest.contains(GUIDE_SUFFIX) {
        return None;
    }
    let name = rest.replace(GUIDE_SUFFIX, "").trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Names of every build that already has a post.
pub fn published_names(posts: &[PostSummary]) -> HashSet<String> {
    posts.iter().filter_map(build_name_from_post).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<BatchItem> {
        names.iter().map(|n| BatchItem::new(*n, "일반")).collect()
    }

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn first_gap_wins() {
        let list = items(&["A", "B", "C"]);
        assert_eq!(find_resume_point(&list, &set(&["A"])), 1);
        assert_eq!(find_resume_point(&list, &set(&["A", "C"])), 1);
        assert_eq!(find_resume_point(&list, &set(&[])), 0);
        assert_eq!(find_resume_point(&list, &set(&["A", "B", "C"])), 3);
        assert_eq!(find_resume_point(&[], &set(&[])), 0);
    }

    #[test]
    fn names_from_meta_title_and_marker() {
        let posts = vec![
            PostSummary {
                title: "Storm Sorcerer 빌드 가이드".into(),
                meta_title: Some("BG3 Storm Sorcerer 빌드 가이드".into()),
            },
            PostSummary {
                title: "[배치생성] Battle Master Fighter 빌드 가이드".into(),
                meta_title: None,
            },
            PostSummary {
                title: "공지사항".into(),
                meta_title: Some("공지".into()),
            },
        ];
        assert_eq!(
            published_names(&posts),
            set(&["Storm Sorcerer", "Battle Master Fighter"])
        );
    }
}
