//! Football schedule adapter
//!
//! The schedule page lays each fixture out as three sibling columns inside a
//! `div.row.gy-3`: a time cell, a team/score cell and a cell of channel
//! logos whose `data-url` points at the stream.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::page::{collapsed_text, selector, PageClient};
use super::{ScheduleSource, SourceKind};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamLink {
    pub img: Option<String>,
    pub alt: String,
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootballMatch {
    pub time: String,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub streams: Vec<StreamLink>,
}

pub struct FootballSource {
    client: PageClient,
    url: String,
}

impl FootballSource {
    #[must_use]
    pub fn new(client: PageClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScheduleSource for FootballSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Football
    }

    async fn fetch(&self) -> Result<Vec<Value>> {
        let html = self.client.fetch_html(&self.url).await?;
        let matches = parse_matches(&html)?;
        tracing::info!(count = matches.len(), "Scraped football matches");

        matches
            .into_iter()
            .map(|m| serde_json::to_value(m).map_err(|e| Error::Internal(e.to_string())))
            .collect()
    }
}

/// Extract every fixture that has both teams, a score and at least one stream
pub fn parse_matches(html: &str) -> Result<Vec<FootballMatch>> {
    let document = Html::parse_document(html);

    let row_sel = selector("div.row.gy-3")?;
    let time_sel = selector("div.col-lg-1")?;
    let home_sel = selector("div.text-end p")?;
    let score_sel = selector("div.col-lg-2 p")?;
    let away_sel = selector("div.text-start p")?;
    let tv_sel = selector("img.iam-list-tv")?;

    let first_text = |cell: ElementRef<'_>, sel: &scraper::Selector| {
        cell.select(sel)
            .next()
            .map(collapsed_text)
            .unwrap_or_default()
    };

    let mut matches = Vec::new();
    for row in document.select(&row_sel) {
        for time_cell in row.select(&time_sel) {
            let Some(team_cell) = next_element(time_cell) else {
                continue;
            };

            let time = collapsed_text(time_cell).replace("LIVE", "").trim().to_string();
            let home_team = first_text(team_cell, &home_sel);
            let score = first_text(team_cell, &score_sel);
            let away_team = first_text(team_cell, &away_sel);

            let streams: Vec<StreamLink> = next_element(team_cell)
                .map(|tv_cell| {
                    tv_cell
                        .select(&tv_sel)
                        .filter_map(|img| {
                            let attrs = img.value();
                            Some(StreamLink {
                                img: attrs.attr("src").map(str::to_string),
                                alt: attrs.attr("alt").unwrap_or_default().to_string(),
                                data_url: attrs.attr("data-url").filter(|u| !u.is_empty())?.to_string(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            if !home_team.is_empty() && !away_team.is_empty() && !score.is_empty() && !streams.is_empty() {
                matches.push(FootballMatch {
                    time,
                    home_team,
                    away_team,
                    score,
                    streams,
                });
            }
        }
    }

    Ok(matches)
}

fn next_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}
