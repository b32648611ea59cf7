//! Cache key and invalidation tag derivation.
//!
//! Three tiers, each a prefix of the next:
//! - `cai-{content}`: every entry of a content item, all versions.
//! - `cai-{content}-{version}`: every entry of one version; also the list key.
//! - `cai-{content}-{version}-{identifier}`: one record; also its cache key.

use crate::model::info::{AdditionalInfo, ContentId, VersionNo};
use std::collections::BTreeSet;

const KEY_PREFIX: &str = "cai";

pub fn content_tag(content_id: ContentId) -> String {
    format!("{KEY_PREFIX}-{content_id}")
}

pub fn version_tag(content_id: ContentId, version_no: VersionNo) -> String {
    format!("{KEY_PREFIX}-{content_id}-{version_no}")
}

pub fn record_key(content_id: ContentId, version_no: VersionNo, identifier: &str) -> String {
    format!("{KEY_PREFIX}-{content_id}-{version_no}-{identifier}")
}

/// Key of the cached full list for one content version.
pub fn list_key(content_id: ContentId, version_no: VersionNo) -> String {
    version_tag(content_id, version_no)
}

/// Tags carried by every cache entry that contains `info`.
pub fn record_tags(info: &AdditionalInfo) -> BTreeSet<String> {
    BTreeSet::from([
        content_tag(info.content_id),
        version_tag(info.content_id, info.version_no),
        record_key(info.content_id, info.version_no, &info.identifier),
    ])
}

/// Tags for a list entry: the anchors of the version plus each item's tags.
///
/// The anchors keep an empty list reachable by version and content
/// invalidation.
pub fn list_tags(
    content_id: ContentId,
    version_no: VersionNo,
    items: &[AdditionalInfo],
) -> BTreeSet<String> {
    let mut tags = BTreeSet::from([
        content_tag(content_id),
        version_tag(content_id, version_no),
    ]);
    for info in items {
        tags.extend(record_tags(info));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::{content_tag, list_key, list_tags, record_key, record_tags, version_tag};
    use crate::model::info::AdditionalInfo;
    use serde_json::json;

    #[test]
    fn keys_follow_the_three_tier_format() {
        assert_eq!(content_tag(2), "cai-2");
        assert_eq!(version_tag(2, 1), "cai-2-1");
        assert_eq!(list_key(2, 1), "cai-2-1");
        assert_eq!(record_key(2, 1, "seo-title"), "cai-2-1-seo-title");
    }

    #[test]
    fn record_tags_cover_content_version_and_record() {
        let info = AdditionalInfo::new(2, 1, "test", json!("test-value"));
        let tags: Vec<String> = record_tags(&info).into_iter().collect();
        assert_eq!(tags, vec!["cai-2", "cai-2-1", "cai-2-1-test"]);
    }

    #[test]
    fn empty_list_still_carries_anchor_tags() {
        let tags: Vec<String> = list_tags(5, 3, &[]).into_iter().collect();
        assert_eq!(tags, vec!["cai-5", "cai-5-3"]);
    }

    #[test]
    fn list_tags_include_every_item() {
        let items = vec![
            AdditionalInfo::new(5, 3, "a", json!(1)),
            AdditionalInfo::new(5, 3, "b", json!(2)),
        ];
        let tags = list_tags(5, 3, &items);
        assert!(tags.contains("cai-5-3-a"));
        assert!(tags.contains("cai-5-3-b"));
        assert_eq!(tags.len(), 4);
    }
}
