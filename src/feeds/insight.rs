use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::adapter::{FeedAdapter, FeedContext, UpstreamError};

const COMPLETION_MODEL: &str = "gpt-4o-mini";
const MAX_COMPLETION_TOKENS: u32 = 80;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightPayload {
    pub insight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Short personalized blurb from a generative provider; static per-archetype
/// text when no provider is configured or the call fails.
pub struct InsightAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Standing guidance per investor archetype, used whenever the generative
/// provider is unavailable.
pub fn static_insight(investor_type: &str) -> &'static str {
    match investor_type {
        "HODLer" => {
            "For HODLers: Long-term fundamentals remain strong. Consider DCA and ignore short-term volatility."
        }
        "Day Trader" => {
            "For Day Traders: Increased volatility detected. Watch support and resistance levels closely."
        }
        "NFT Collector" => "NFT markets are stabilizing. Blue-chip collections show resilience.",
        "DeFi Enthusiast" => {
            "For DeFi Enthusiasts: Yields are compressing; audit protocol risk before chasing returns."
        }
        _ => "Diversification remains key. Stay updated on macro trends and regulatory news.",
    }
}

impl InsightAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    fn prompt(ctx: &FeedContext) -> String {
        let (investor_type, interests) = match &ctx.preferences {
            Some(prefs) => (
                prefs.investor_type.as_str(),
                prefs.content_types.join(", "),
            ),
            None => ("General Investor", String::new()),
        };
        if interests.is_empty() {
            format!(
                "Give a two-sentence crypto market insight for a {investor_type} investor."
            )
        } else {
            format!(
                "Give a two-sentence crypto market insight for a {investor_type} investor \
                 interested in {interests}."
            )
        }
    }
}

#[async_trait]
impl FeedAdapter for InsightAdapter {
    type Payload = InsightPayload;

    fn name(&self) -> &'static str {
        "insight"
    }

    #[instrument(name = "insight_fetch", skip(self, ctx))]
    async fn fetch(&self, ctx: &FeedContext) -> Result<InsightPayload, UpstreamError> {
        let Some(api_key) = &self.api_key else {
            return Err(UpstreamError::NotConfigured);
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(%url, "requesting generated insight");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": COMPLETION_MODEL,
                "messages": [{ "role": "user", "content": Self::prompt(ctx) }],
                "max_tokens": MAX_COMPLETION_TOKENS,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(UpstreamError::Empty)?;

        Ok(InsightPayload {
            insight: content,
            note: None,
        })
    }

    fn fallback(&self, ctx: &FeedContext) -> InsightPayload {
        let investor_type = ctx
            .preferences
            .as_ref()
            .map(|p| p.investor_type.as_str())
            .unwrap_or("General Investor");
        InsightPayload {
            insight: static_insight(investor_type).to_string(),
            note: None,
        }
    }
}
