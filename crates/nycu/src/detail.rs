use scraper::Html;
use tracing::debug;

use common::{parse, IngestError, IngestResult, PageFetcher};

/// Shown when a detail page yields no usable image, for any reason.
pub const FALLBACK_IMAGE_URL: &str =
    "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcQXwODiLQvRBA1BDszB7csUFnWYDEie3epJlQ&s";

const DETAIL_IMAGE_SELECTOR: &str = "#relateImg0 > div > img";

/// Fetch the detail page behind a listing and pull out its representative
/// image. This is the single point where every enrichment failure (bad
/// status, network error, missing node) collapses to the fallback URL;
/// nothing propagates to the extractor.
pub async fn enrich_image(fetcher: &dyn PageFetcher, link: &str) -> String {
    match detail_image(fetcher, link).await {
        Ok(url) => url,
        Err(e) => {
            debug!(%link, error = %e, "detail image unavailable, using fallback");
            FALLBACK_IMAGE_URL.to_string()
        }
    }
}

async fn detail_image(fetcher: &dyn PageFetcher, link: &str) -> IngestResult<String> {
    let body = fetcher.fetch(link).await?.require_ok(link)?;
    let document = Html::parse_document(&body);
    let image_selector = parse::selector(DETAIL_IMAGE_SELECTOR)?;
    let src = document
        .select(&image_selector)
        .next()
        .and_then(|img| img.attr("src"))
        .ok_or_else(|| {
            IngestError::HtmlParse(format!("no detail image node at {}", link))
        })?;
    Ok(format!("{}{}", crate::BASE_URL, src))
}
