//! Decoding of remote payloads into domain values.
//!
//! Both resources share one envelope, `{"items": [...]}`, and are only
//! accepted with a 2xx status.

use chrono::{DateTime, Utc};
use feedcache_core::{FeedItem, ImageComment};
use http::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Failure to turn a response into domain values.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Status outside the 2xx range.
    #[error("unexpected status code {0}")]
    Status(StatusCode),

    /// Body is not the expected JSON envelope.
    #[error("invalid payload: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Maps a raw response to a domain value.
pub trait Mapper: Send + Sync {
    /// The decoded value.
    type Output: Send + 'static;

    /// Decodes `body`, received with `status`.
    fn map(&self, body: &[u8], status: StatusCode) -> Result<Self::Output, MapperError>;
}

#[derive(Deserialize)]
struct Root<T> {
    items: Vec<T>,
}

fn decode_items<T>(body: &[u8], status: StatusCode) -> Result<Vec<T>, MapperError>
where
    T: DeserializeOwned,
{
    if !status.is_success() {
        return Err(MapperError::Status(status));
    }
    let root: Root<T> = serde_json::from_slice(body)?;
    Ok(root.items)
}

#[derive(Deserialize)]
struct RemoteFeedItem {
    id: Uuid,
    description: Option<String>,
    location: Option<String>,
    image: Url,
}

impl From<RemoteFeedItem> for FeedItem {
    fn from(item: RemoteFeedItem) -> Self {
        FeedItem::new(item.id, item.description, item.location, item.image)
    }
}

/// Decodes the feed list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedItemsMapper;

impl Mapper for FeedItemsMapper {
    type Output = Vec<FeedItem>;

    fn map(&self, body: &[u8], status: StatusCode) -> Result<Vec<FeedItem>, MapperError> {
        let items = decode_items::<RemoteFeedItem>(body, status)?;
        Ok(items.into_iter().map(FeedItem::from).collect())
    }
}

#[derive(Deserialize)]
struct RemoteAuthor {
    username: String,
}

#[derive(Deserialize)]
struct RemoteImageComment {
    id: Uuid,
    message: String,
    created_at: DateTime<Utc>,
    author: RemoteAuthor,
}

impl From<RemoteImageComment> for ImageComment {
    fn from(comment: RemoteImageComment) -> Self {
        ImageComment {
            id: comment.id,
            message: comment.message,
            created_at: comment.created_at,
            username: comment.author.username,
        }
    }
}

/// Decodes the comments of an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCommentsMapper;

impl Mapper for ImageCommentsMapper {
    type Output = Vec<ImageComment>;

    fn map(&self, body: &[u8], status: StatusCode) -> Result<Vec<ImageComment>, MapperError> {
        let comments = decode_items::<RemoteImageComment>(body, status)?;
        Ok(comments.into_iter().map(ImageComment::from).collect())
    }
}
