use std::time::Duration;

use async_trait::async_trait;

use crate::error::{IngestError, IngestResult};

/// A fetched page, before any status handling.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    /// Body of a successful response. Required index pages fail loudly on
    /// anything other than 200; optional detail pages let the caller
    /// decide what to do with the error.
    pub fn require_ok(self, url: &str) -> IngestResult<String> {
        if self.status == 200 {
            Ok(self.body)
        } else {
            Err(IngestError::Fetch {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> IngestResult<FetchedPage>;
}

/// reqwest-backed fetcher with a fixed User-Agent and request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> IngestResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> IngestResult<FetchedPage> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(FetchedPage { status, body })
    }
}
