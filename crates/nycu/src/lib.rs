mod detail;

pub use detail::FALLBACK_IMAGE_URL;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use scraper::Html;
use tracing::{debug, info};

use common::{
    filters, parse, Activity, ActivitySource, Config, FilterRules, IngestResult, PageFetcher,
    RawListing, Source,
};

const INDEX_URL: &str =
    "https://osa.nycu.edu.tw/osa/ch/app/data/list?module=nycu0085&id=3494";
pub(crate) const BASE_URL: &str = "https://osa.nycu.edu.tw";
const CATEGORY_LABEL: &str = "分類：";

/// NYCU student-affairs bulletin. The only source with a category
/// whitelist and per-listing detail-image enrichment.
pub struct NycuSource {
    fetcher: Arc<dyn PageFetcher>,
    rules: FilterRules,
    enrich_concurrency: usize,
}

impl NycuSource {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        let rules = FilterRules {
            category_whitelist: config.nycu_category_whitelist.clone(),
            recruitment_keywords: config.recruitment_keywords.clone(),
            sentinel_titles: Vec::new(),
        };
        Self::with_rules(fetcher, rules, config.enrich_concurrency)
    }

    pub fn with_rules(
        fetcher: Arc<dyn PageFetcher>,
        rules: FilterRules,
        enrich_concurrency: usize,
    ) -> Self {
        Self { fetcher, rules, enrich_concurrency: enrich_concurrency.max(1) }
    }
}

#[async_trait]
impl ActivitySource for NycuSource {
    fn name(&self) -> &'static str {
        "nycu"
    }

    async fn harvest(&self) -> IngestResult<Vec<Activity>> {
        let body = self.fetcher.fetch(INDEX_URL).await?.require_ok(INDEX_URL)?;
        let listings = extract_listings(&body, &self.rules)?;
        info!(count = listings.len(), "nycu listings accepted");

        // The detail fetch is one round trip per listing; bound the
        // in-flight requests. Write order does not matter, persistence
        // is keyed by derived id.
        let activities = stream::iter(listings)
            .map(|mut listing| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let image = detail::enrich_image(fetcher.as_ref(), &listing.link).await;
                    listing.image_url = Some(image);
                    listing.into_activity(Source::Nycu)
                }
            })
            .buffer_unordered(self.enrich_concurrency)
            .collect::<Vec<_>>()
            .await;
        Ok(activities)
    }
}

/// Extract candidate listings from the bulletin index markup. A card
/// missing its anchor, title, or href is skipped on its own; filters
/// reject the rest.
fn extract_listings(html: &str, rules: &FilterRules) -> IngestResult<Vec<RawListing>> {
    let document = Html::parse_document(html);
    let card_selector = parse::selector("div.newslist > ul > li")?;
    let anchor_selector = parse::selector("a")?;
    let info_selector = parse::selector("div.info p")?;

    let mut listings = Vec::new();
    for card in document.select(&card_selector) {
        let Some(anchor) = card.select(&anchor_selector).next() else {
            debug!("bulletin card without anchor, skipping");
            continue;
        };

        let title = anchor.attr("title").unwrap_or("").trim().to_string();
        let href = anchor.attr("href").unwrap_or("");
        if title.is_empty() || href.is_empty() {
            debug!("bulletin card without title or href, skipping");
            continue;
        }

        let category = anchor
            .select(&info_selector)
            .filter_map(|p| {
                let text = p.text().collect::<String>();
                filters::category_from_label(&text, CATEGORY_LABEL)
            })
            .next();

        if !rules.accepts(&title, category.as_deref()) {
            continue;
        }

        listings.push(RawListing {
            title,
            link: format!("{}{}", BASE_URL, href),
            image_url: None,
            category,
        });
    }
    Ok(listings)
}
