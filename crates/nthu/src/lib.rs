use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info};

use common::{
    parse, Activity, ActivitySource, Config, FilterRules, IngestResult, PageFetcher, RawListing,
    Source,
};

/// Mobile bulletin fragments for the two activity boards. Both are
/// required index pages; either failing fails the extractor.
const INDEX_URLS: [&str; 2] = [
    "https://bulletin.site.nthu.edu.tw/app/index.php?Action=mobileloadmod&Type=mobile_rcg_mstr&Nbr=5083",
    "https://bulletin.site.nthu.edu.tw/app/index.php?Action=mobileloadmod&Type=mobile_rcg_mstr&Nbr=5085",
];

/// The boards publish no per-event images; every activity gets the seal.
const SEAL_IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/5/5c/NTHU_Round_Seal.svg/1200px-NTHU_Round_Seal.svg.png";

/// Trailing "see more" link rendered as a plain anchor among the
/// listings.
const MORE_SENTINEL: &str = "更多...";

pub struct NthuSource {
    fetcher: Arc<dyn PageFetcher>,
    rules: FilterRules,
}

impl NthuSource {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        let rules = FilterRules {
            recruitment_keywords: config.recruitment_keywords.clone(),
            sentinel_titles: vec![MORE_SENTINEL.to_string()],
            ..FilterRules::default()
        };
        Self::with_rules(fetcher, rules)
    }

    pub fn with_rules(fetcher: Arc<dyn PageFetcher>, rules: FilterRules) -> Self {
        Self { fetcher, rules }
    }
}

#[async_trait]
impl ActivitySource for NthuSource {
    fn name(&self) -> &'static str {
        "nthu"
    }

    async fn harvest(&self) -> IngestResult<Vec<Activity>> {
        let mut listings = Vec::new();
        for url in INDEX_URLS {
            let body = self.fetcher.fetch(url).await?.require_ok(url)?;
            listings.extend(extract_listings(&body, &self.rules)?);
        }
        info!(count = listings.len(), "nthu listings accepted");
        Ok(listings
            .into_iter()
            .map(|mut listing| {
                listing.image_url = Some(SEAL_IMAGE_URL.to_string());
                listing.into_activity(Source::Nthu)
            })
            .collect())
    }
}

/// The bulletin fragment is a bare anchor list; hrefs are published
/// absolute. Title comes from the anchor's title attribute, falling back
/// to its text.
fn extract_listings(html: &str, rules: &FilterRules) -> IngestResult<Vec<RawListing>> {
    let document = Html::parse_document(html);
    let anchor_selector = parse::selector("a")?;

    let mut listings = Vec::new();
    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.attr("href") else {
            debug!("bulletin anchor without href, skipping");
            continue;
        };
        let title = match anchor.attr("title") {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => anchor.text().collect::<String>().trim().to_string(),
        };
        if title.is_empty() {
            debug!("bulletin anchor without title, skipping");
            continue;
        }

        if !rules.accepts(&title, None) {
            continue;
        }

        listings.push(RawListing {
            title,
            link: href.to_string(),
            image_url: None,
            category: None,
        });
    }
    Ok(listings)
}
