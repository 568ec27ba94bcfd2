//! URLs of the remote resources.

use url::Url;
use uuid::Uuid;

/// Feed list resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEndpoint {
    /// `GET <base>/v1/feed`
    Get,
}

impl FeedEndpoint {
    /// Resolves the endpoint against `base`.
    pub fn url(&self, base: &Url) -> Url {
        match self {
            Self::Get => append_path(base, &["v1", "feed"]),
        }
    }
}

/// Comments of one feed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCommentsEndpoint {
    /// `GET <base>/v1/image/<id>/comments`
    Get(Uuid),
}

impl ImageCommentsEndpoint {
    /// Resolves the endpoint against `base`.
    pub fn url(&self, base: &Url) -> Url {
        match self {
            Self::Get(id) => {
                let id = id.to_string();
                append_path(base, &["v1", "image", &id, "comments"])
            }
        }
    }
}

/// Appends `segments` to the path of `base`, keeping what it already has.
fn append_path(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
