use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator byte between the hashed title and link. 0x1F (ASCII unit
/// separator) never appears in listing titles or URLs, so no two distinct
/// (title, link) pairs concatenate to the same byte sequence.
const ID_SEPARATOR: u8 = 0x1f;

/// Default capacity for a group formed around an activity.
pub const DEFAULT_GROUP_LIMIT: u32 = 5;

/// Derive the stable identity for an activity.
///
/// The exact hashed byte sequence is `title` UTF-8 bytes, one 0x1F byte,
/// then `link` UTF-8 bytes (empty when absent); the id is the lowercase
/// hex SHA-256 of that sequence. This is the sole deduplication key, so
/// the sequence must never change.
pub fn derive_id(title: &str, link: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([ID_SEPARATOR]);
    hasher.update(link.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Nycu,
    Hsinchu,
    Nthu,
    /// Synthetic origin; these activities are generated, not scraped.
    Restaurant,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Nycu => "nycu",
            Source::Hsinchu => "hsinchu",
            Source::Nthu => "nthu",
            Source::Restaurant => "restaurant",
        }
    }
}

/// A listing as pulled out of source markup, before normalization.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub title: String,
    pub link: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl RawListing {
    pub fn into_activity(self, source: Source) -> Activity {
        Activity::new(self.title, Some(self.link), source, self.image_url)
    }
}

/// The canonical activity record all sources converge to.
///
/// The `id` doubles as the store's document key and is not serialized
/// into the document body. `createdAt` is injected by the persister at
/// write time and is deliberately not a field here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub source: Source,
    pub image_url: Option<String>,
    pub liked_by: Vec<String>,
    pub group_id: Option<String>,
    pub group_limit: u32,
    pub date: Option<String>,
}

impl Activity {
    pub fn new(
        title: impl Into<String>,
        url: Option<String>,
        source: Source,
        image_url: Option<String>,
    ) -> Self {
        let title = title.into();
        let id = derive_id(&title, url.as_deref());
        Self {
            id,
            title,
            url,
            source,
            image_url,
            liked_by: Vec::new(),
            group_id: None,
            group_limit: DEFAULT_GROUP_LIMIT,
            date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_is_stable() {
        let first = derive_id("Campus Fall Festival", Some("https://example.edu/fest"));
        let second = derive_id("Campus Fall Festival", Some("https://example.edu/fest"));
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derive_id_distinguishes_inputs() {
        let a = derive_id("Campus Fall Festival", Some("https://example.edu/fest"));
        let b = derive_id("Campus Fall Festival", Some("https://example.edu/other"));
        let c = derive_id("Campus Spring Festival", Some("https://example.edu/fest"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn derive_id_separator_is_unambiguous() {
        // Without a reserved separator these two pairs would hash the
        // same byte sequence.
        assert_ne!(
            derive_id("a", Some("b_c")),
            derive_id("a_b", Some("c"))
        );
    }

    #[test]
    fn missing_link_hashes_as_empty() {
        assert_eq!(derive_id("lunch", None), derive_id("lunch", Some("")));
    }

    #[test]
    fn new_activity_carries_creation_defaults() {
        let activity = Activity::new(
            "Campus Fall Festival",
            Some("https://example.edu/fest".to_string()),
            Source::Nycu,
            None,
        );
        assert_eq!(activity.id, derive_id("Campus Fall Festival", Some("https://example.edu/fest")));
        assert!(activity.liked_by.is_empty());
        assert!(activity.group_id.is_none());
        assert_eq!(activity.group_limit, DEFAULT_GROUP_LIMIT);
        assert!(activity.date.is_none());
    }

    #[test]
    fn document_shape_uses_camel_case_and_omits_id() {
        let activity = Activity::new(
            "Campus Fall Festival",
            Some("https://example.edu/fest".to_string()),
            Source::Nthu,
            Some("https://example.edu/fest.png".to_string()),
        );
        let doc = serde_json::to_value(&activity).unwrap();
        assert!(doc.get("id").is_none());
        assert_eq!(doc["title"], "Campus Fall Festival");
        assert_eq!(doc["source"], "nthu");
        assert_eq!(doc["imageUrl"], "https://example.edu/fest.png");
        assert_eq!(doc["likedBy"], serde_json::json!([]));
        assert_eq!(doc["groupLimit"], 5);
        assert!(doc["groupId"].is_null());
        assert!(doc["date"].is_null());
    }
}
