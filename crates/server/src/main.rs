use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use common::{
    run_sources, ActivitySource, Config, HttpFetcher, PageFetcher, Persister, RestDocStore,
};
use notifier::{dispatch, FcmClient, NotificationRequest, NotifyError, PushSender};

struct AppState {
    sources: Vec<Arc<dyn ActivitySource>>,
    persister: Persister,
    push: Option<Arc<dyn PushSender>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.user_agent)?);
    let store = Arc::new(RestDocStore::new(&config.store.url, &config.store.key));
    let persister = Persister::new(store, &config.store.collection);
    let push: Option<Arc<dyn PushSender>> = config
        .fcm_server_key
        .as_deref()
        .map(|key| Arc::new(FcmClient::new(key)) as Arc<dyn PushSender>);

    let sources: Vec<Arc<dyn ActivitySource>> = vec![
        Arc::new(nycu::NycuSource::new(&config, Arc::clone(&fetcher))),
        Arc::new(hsinchu::HsinchuSource::new(&config, Arc::clone(&fetcher))),
        Arc::new(nthu::NthuSource::new(&config, Arc::clone(&fetcher))),
    ];

    let state = Arc::new(AppState { sources, persister, push });

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/fetch-activities", get(fetch_activities))
        .route("/create-restaurant-activity", post(create_restaurant_activity))
        .route("/send-notification", post(send_notification))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Trigger one ingestion run over every scraped source. The response is
/// binary success/failure text: 200 with per-source counts when every
/// source completed, 500 naming the failed sources otherwise (writes
/// from successful sources are kept either way).
async fn fetch_activities(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    let summary = run_sources(state.sources.clone(), state.persister.clone()).await;

    let mut lines: Vec<String> = summary.reports.iter().map(|r| r.to_string()).collect();
    if summary.all_ok() {
        lines.insert(0, "Activities fetched successfully.".to_string());
        (StatusCode::OK, lines.join("\n"))
    } else {
        for (source, error) in &summary.failures {
            lines.push(format!("{} failed: {}", source, error));
        }
        (StatusCode::INTERNAL_SERVER_ERROR, lines.join("\n"))
    }
}

async fn create_restaurant_activity(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, String) {
    let activity = restaurant::generate();
    match state.persister.persist_if_absent(&activity).await {
        Ok(_) => (
            StatusCode::OK,
            format!("Restaurant activity {} created successfully.", activity.id),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create restaurant activity: {}", e),
        ),
    }
}

async fn send_notification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<NotificationRequest>,
) -> (StatusCode, Json<Value>) {
    let caller = bearer_token(&headers);
    let Some(push) = state.push.as_deref() else {
        return error_response(&NotifyError::Internal(
            "push delivery is not configured".to_string(),
        ));
    };

    match dispatch(caller.as_deref(), &request, push).await {
        Ok(resp) => (
            StatusCode::OK,
            Json(json!({ "success": resp.success, "message": resp.message })),
        ),
        Err(e) => error_response(&e),
    }
}

/// Caller identity, per the scope of this service: a non-empty bearer
/// token counts as identified.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn error_response(err: &NotifyError) -> (StatusCode, Json<Value>) {
    let status = match err {
        NotifyError::Unauthenticated => StatusCode::UNAUTHORIZED,
        NotifyError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        NotifyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "code": err.code(), "message": err.to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use common::{Activity, IngestError, IngestResult, MemoryStore, Source};

    struct FixedSource {
        name: &'static str,
        result: Result<Vec<Activity>, (String, u16)>,
    }

    #[async_trait]
    impl ActivitySource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn harvest(&self) -> IngestResult<Vec<Activity>> {
            match &self.result {
                Ok(activities) => Ok(activities.clone()),
                Err((url, status)) => Err(IngestError::Fetch {
                    url: url.clone(),
                    status: *status,
                }),
            }
        }
    }

    fn state_with_sources(sources: Vec<Arc<dyn ActivitySource>>) -> Arc<AppState> {
        Arc::new(AppState {
            sources,
            persister: Persister::new(Arc::new(MemoryStore::new()), "activities"),
            push: None,
        })
    }

    #[tokio::test]
    async fn trigger_reports_counts_on_success() {
        let source = FixedSource {
            name: "nthu",
            result: Ok(vec![Activity::new(
                "Campus Fall Festival",
                Some("https://example.edu/fest".to_string()),
                Source::Nthu,
                None,
            )]),
        };
        let state = state_with_sources(vec![Arc::new(source)]);

        let (status, body) = fetch_activities(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Activities fetched successfully."));
        assert!(body.contains("nthu: 1 inserted, 0 skipped"));
    }

    #[tokio::test]
    async fn trigger_returns_500_naming_failed_source() {
        let healthy = FixedSource { name: "nthu", result: Ok(Vec::new()) };
        let broken = FixedSource {
            name: "nycu",
            result: Err(("https://osa.nycu.edu.tw".to_string(), 503)),
        };
        let sources: Vec<Arc<dyn ActivitySource>> =
            vec![Arc::new(healthy), Arc::new(broken)];
        let state = state_with_sources(sources);

        let (status, body) = fetch_activities(State(state)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("nycu failed:"));
        assert!(body.contains("nthu: 0 inserted, 0 skipped"));
    }

    #[test]
    fn bearer_token_requires_non_empty_value() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer user-1"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("user-1"));
    }
}
