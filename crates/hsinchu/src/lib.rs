use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info};

use common::{
    parse, Activity, ActivitySource, Config, FilterRules, IngestResult, PageFetcher, RawListing,
    Source,
};

const INDEX_URL: &str = "https://tjm.tainanoutlook.com/hsinchu";
const BASE_URL: &str = "https://tjm.tainanoutlook.com";

/// Imgur-hosted card images are upload leftovers, not event posters;
/// treat them as absent.
const BLOCKED_IMAGE_HOST: &str = "https://i.imgur.com";

/// Hsinchu events portal. Cards sit in a lazy-loaded list whose element
/// id carries a build hash, so match on the id prefix rather than the
/// full id.
pub struct HsinchuSource {
    fetcher: Arc<dyn PageFetcher>,
    rules: FilterRules,
}

impl HsinchuSource {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        let rules = FilterRules {
            recruitment_keywords: config.recruitment_keywords.clone(),
            ..FilterRules::default()
        };
        Self::with_rules(fetcher, rules)
    }

    pub fn with_rules(fetcher: Arc<dyn PageFetcher>, rules: FilterRules) -> Self {
        Self { fetcher, rules }
    }
}

#[async_trait]
impl ActivitySource for HsinchuSource {
    fn name(&self) -> &'static str {
        "hsinchu"
    }

    async fn harvest(&self) -> IngestResult<Vec<Activity>> {
        let body = self.fetcher.fetch(INDEX_URL).await?.require_ok(INDEX_URL)?;
        let listings = extract_listings(&body, &self.rules)?;
        info!(count = listings.len(), "hsinchu listings accepted");
        Ok(listings
            .into_iter()
            .map(|listing| listing.into_activity(Source::Hsinchu))
            .collect())
    }
}

fn extract_listings(html: &str, rules: &FilterRules) -> IngestResult<Vec<RawListing>> {
    let document = Html::parse_document(html);
    let card_selector = parse::selector("ul[id^='blazy'] > li")?;
    let image_selector = parse::selector("a img")?;
    let anchor_selector = parse::selector("h3 a")?;

    let mut listings = Vec::new();
    for card in document.select(&card_selector) {
        let Some(image) = card.select(&image_selector).next() else {
            debug!("event card without image node, skipping");
            continue;
        };
        let Some(anchor) = card.select(&anchor_selector).next() else {
            debug!("event card without title anchor, skipping");
            continue;
        };

        let title = image.attr("title").unwrap_or("").trim().to_string();
        let href = anchor.attr("href").unwrap_or("");
        if title.is_empty() || href.is_empty() {
            debug!("event card without title or href, skipping");
            continue;
        }

        if !rules.accepts(&title, None) {
            continue;
        }

        let image_url = image
            .attr("src")
            .filter(|src| !src.starts_with(BLOCKED_IMAGE_HOST))
            .map(|src| src.to_string());

        listings.push(RawListing {
            title,
            link: format!("{}{}", BASE_URL, href),
            image_url,
            category: None,
        });
    }
    Ok(listings)
}
