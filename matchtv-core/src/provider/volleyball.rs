//! Volleyball schedule adapter

use async_trait::async_trait;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::page::{selector, PageClient};
use super::{ScheduleSource, SourceKind};
use crate::{Error, Result};

/// A live card: the match label and the player embed URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolleyballMatch {
    #[serde(rename = "match")]
    pub title: Option<String>,
    pub src: Option<String>,
}

pub struct VolleyballSource {
    client: PageClient,
    url: String,
}

impl VolleyballSource {
    #[must_use]
    pub fn new(client: PageClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScheduleSource for VolleyballSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Volleyball
    }

    async fn fetch(&self) -> Result<Vec<Value>> {
        let html = self.client.fetch_html(&self.url).await?;
        let matches = parse_live_cards(&html)?;
        tracing::info!(count = matches.len(), "Scraped volleyball matches");

        matches
            .into_iter()
            .map(|m| serde_json::to_value(m).map_err(|e| Error::Internal(e.to_string())))
            .collect()
    }
}

/// Cards flagged live that carry a play button
pub fn parse_live_cards(html: &str) -> Result<Vec<VolleyballMatch>> {
    let document = Html::parse_document(html);
    let card_sel = selector("div.pls-card")?;
    let live_sel = selector("span.pls-status.live")?;
    let button_sel = selector("button.pls-btn")?;

    Ok(document
        .select(&card_sel)
        .filter(|card| card.select(&live_sel).next().is_some())
        .filter_map(|card| card.select(&button_sel).next())
        .map(|button| {
            let attrs = button.value();
            VolleyballMatch {
                title: attrs.attr("aria-label").map(str::to_string),
                src: attrs.attr("data-src").map(str::to_string),
            }
        })
        .collect())
}
