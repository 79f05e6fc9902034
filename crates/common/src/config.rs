use std::env;
use anyhow::{Context, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

const DEFAULT_RECRUITMENT_KEYWORDS: &[&str] = &["徵", "Recruitment", "招募"];
const DEFAULT_NYCU_CATEGORY_WHITELIST: &[&str] = &["校外訊息", "校內活動"];

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub fcm_server_key: Option<String>,
    pub user_agent: String,
    /// Titles containing any of these substrings are dropped by every
    /// source. Locale-specific; override via RECRUITMENT_KEYWORDS.
    pub recruitment_keywords: Vec<String>,
    pub nycu_category_whitelist: Vec<String>,
    pub enrich_concurrency: usize,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_url = env::var("STORE_URL")
            .context("STORE_URL must be set")?;
        let store_key = env::var("STORE_API_KEY")
            .context("STORE_API_KEY must be set")?;
        let collection = env::var("ACTIVITIES_COLLECTION")
            .unwrap_or_else(|_| "activities".to_string());

        let recruitment_keywords =
            env_list("RECRUITMENT_KEYWORDS", DEFAULT_RECRUITMENT_KEYWORDS);
        let nycu_category_whitelist =
            env_list("NYCU_CATEGORY_WHITELIST", DEFAULT_NYCU_CATEGORY_WHITELIST);

        let enrich_concurrency = env::var("ENRICH_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4);
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        Ok(Config {
            store: StoreConfig {
                url: store_url.trim_end_matches('/').to_string(),
                key: store_key,
                collection,
            },
            fcm_server_key: env::var("FCM_SERVER_KEY").ok(),
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            recruitment_keywords,
            nycu_category_whitelist,
            enrich_concurrency,
            server_port,
        })
    }

    pub fn require_fcm_server_key(&self) -> Result<&String> {
        self.fcm_server_key
            .as_ref()
            .context("FCM_SERVER_KEY must be set")
    }
}

fn env_list(name: &str, default: &[&str]) -> Vec<String> {
    env::var(name)
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .filter(|list: &Vec<String>| !list.is_empty())
        .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
}
