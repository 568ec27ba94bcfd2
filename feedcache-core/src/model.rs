//! Domain values moved through the pipeline.
//!
//! - [`FeedItem`] - one entry of the feed, pointing at its image
//! - [`CachedFeed`] - the single feed record a store keeps, with its timestamp
//! - [`ImageComment`] - a comment attached to a feed image

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// One item of the feed.
///
/// Immutable value; two items are equal when every field is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedItem {
    /// Opaque unique identifier.
    pub id: Uuid,
    /// Free-form description.
    pub description: Option<String>,
    /// Human readable location label.
    pub location: Option<String>,
    /// Where the item's image data can be fetched.
    pub url: Url,
}

impl FeedItem {
    /// Creates a feed item.
    pub fn new(
        id: Uuid,
        description: Option<String>,
        location: Option<String>,
        url: Url,
    ) -> Self {
        Self {
            id,
            description,
            location,
            url,
        }
    }
}

/// The feed record held by a feed store.
///
/// A store keeps at most one of these; inserting a new one replaces the
/// previous record entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeed {
    /// Items in the order they were saved.
    pub items: Vec<FeedItem>,
    /// When the items were saved.
    pub timestamp: DateTime<Utc>,
}

impl CachedFeed {
    /// Creates a record for `items` saved at `timestamp`.
    pub fn new(items: Vec<FeedItem>, timestamp: DateTime<Utc>) -> Self {
        Self { items, timestamp }
    }

    /// Returns the items, discarding the timestamp.
    pub fn into_items(self) -> Vec<FeedItem> {
        self.items
    }
}

/// A comment left on a feed image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageComment {
    /// Opaque unique identifier.
    pub id: Uuid,
    /// Comment text.
    pub message: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
    /// Author's username.
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn item(description: Option<&str>) -> FeedItem {
        FeedItem::new(
            Uuid::nil(),
            description.map(str::to_owned),
            None,
            Url::parse("https://any-url.com").unwrap(),
        )
    }

    #[test]
    fn feed_items_compare_by_all_fields() {
        assert_eq!(item(Some("a")), item(Some("a")));
        assert_ne!(item(Some("a")), item(None));
    }

    #[test]
    fn cached_feed_survives_json() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let feed = CachedFeed::new(vec![item(Some("a")), item(None)], timestamp);

        let json = serde_json::to_vec(&feed).unwrap();
        let decoded: CachedFeed = serde_json::from_slice(&json).unwrap();

        assert_eq!(decoded, feed);
    }
}
