use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::adapter::{FeedAdapter, FeedContext, UpstreamError};

const LISTING_LIMIT: usize = 10;
const IMAGE_SUFFIXES: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemePayload {
    pub url: String,
    pub title: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One random image post from the subreddit's hot listing.
pub struct MemeAdapter {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    url: String,
    post_hint: Option<String>,
}

impl PostData {
    fn is_image(&self) -> bool {
        self.post_hint.as_deref() == Some("image")
            || IMAGE_SUFFIXES
                .iter()
                .any(|suffix| self.url.to_lowercase().ends_with(suffix))
    }
}

impl MemeAdapter {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl FeedAdapter for MemeAdapter {
    type Payload = MemePayload;

    fn name(&self) -> &'static str {
        "meme"
    }

    #[instrument(name = "meme_fetch", skip(self, _ctx))]
    async fn fetch(&self, _ctx: &FeedContext) -> Result<MemePayload, UpstreamError> {
        let url = format!("{}/r/cryptomemes/hot.json", self.base_url);
        debug!(%url, "requesting meme listing");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", LISTING_LIMIT.to_string().as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        let images: Vec<PostData> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .filter(PostData::is_image)
            .collect();

        let chosen = images
            .choose(&mut rand::thread_rng())
            .ok_or(UpstreamError::Empty)?;
        Ok(MemePayload {
            url: chosen.url.clone(),
            title: chosen.title.clone(),
            source: "Reddit".into(),
            note: None,
        })
    }

    fn fallback(&self, _ctx: &FeedContext) -> MemePayload {
        MemePayload {
            url: "https://i.imgur.com/example1.jpg".into(),
            title: "HODL Strong!".into(),
            source: "Static".into(),
            note: Some("Live memes unavailable; showing a classic.".into()),
        }
    }
}
