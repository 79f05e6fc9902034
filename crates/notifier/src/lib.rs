use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("caller must be signed in to send notifications")]
    Unauthenticated,

    #[error("missing required field: {0}")]
    InvalidArgument(&'static str),

    #[error("notification delivery failed: {0}")]
    Internal(String),
}

impl NotifyError {
    /// Wire code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            NotifyError::Unauthenticated => "unauthenticated",
            NotifyError::InvalidArgument(_) => "invalid-argument",
            NotifyError::Internal(_) => "internal",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(default)]
    pub fcm_token: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub message: String,
}

/// Opaque push delivery; failures come back as plain errors for the
/// dispatcher to wrap. No retry at this layer.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, envelope: &Value) -> anyhow::Result<()>;
}

/// FCM delivery via the legacy HTTP endpoint.
pub struct FcmClient {
    client: Client,
    server_key: String,
}

impl FcmClient {
    pub fn new(server_key: &str) -> Self {
        Self {
            client: Client::new(),
            server_key: server_key.to_string(),
        }
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, envelope: &Value) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(FCM_SEND_URL)
            .header("Authorization", format!("key={}", self.server_key))
            .json(envelope)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("push endpoint returned {}: {}", status, body)
        }
    }
}

/// Platform envelope: high-priority delivery on Android, badge bump and
/// default sound on iOS.
fn build_envelope(req: &NotificationRequest) -> Value {
    json!({
        "to": req.fcm_token,
        "notification": { "title": req.title, "body": req.body },
        "data": req.data,
        "android": { "priority": "high" },
        "apns": { "payload": { "aps": { "badge": 1, "sound": "default" } } },
    })
}

/// Validate and forward one notification. `caller` is whatever identity
/// the entry point established; absence (or an empty identity) is an
/// authentication failure before any field validation runs.
pub async fn dispatch(
    caller: Option<&str>,
    req: &NotificationRequest,
    push: &dyn PushSender,
) -> Result<DispatchResponse, NotifyError> {
    match caller {
        Some(identity) if !identity.trim().is_empty() => {}
        _ => return Err(NotifyError::Unauthenticated),
    }
    if req.fcm_token.trim().is_empty() {
        return Err(NotifyError::InvalidArgument("fcmToken"));
    }
    if req.title.trim().is_empty() {
        return Err(NotifyError::InvalidArgument("title"));
    }
    if req.body.trim().is_empty() {
        return Err(NotifyError::InvalidArgument("body"));
    }

    let envelope = build_envelope(req);
    match push.send(&envelope).await {
        Ok(()) => Ok(DispatchResponse {
            success: true,
            message: "Notification sent successfully.".to_string(),
        }),
        Err(e) => {
            warn!(error = %e, "push delivery failed");
            Err(NotifyError::Internal(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct RecordingSender {
        sent: Mutex<Option<Value>>,
        fail_with: Option<&'static str>,
    }

    impl RecordingSender {
        fn ok() -> Self {
            Self { sent: Mutex::new(None), fail_with: None }
        }

        fn failing(reason: &'static str) -> Self {
            Self { sent: Mutex::new(None), fail_with: Some(reason) }
        }
    }

    #[async_trait]
    impl PushSender for RecordingSender {
        async fn send(&self, envelope: &Value) -> anyhow::Result<()> {
            *self.sent.lock().await = Some(envelope.clone());
            match self.fail_with {
                Some(reason) => anyhow::bail!("{}", reason),
                None => Ok(()),
            }
        }
    }

    fn valid_request() -> NotificationRequest {
        NotificationRequest {
            fcm_token: "token-123".to_string(),
            title: "New like".to_string(),
            body: "Someone liked your activity".to_string(),
            data: HashMap::from([("activityId".to_string(), "abc".to_string())]),
        }
    }

    #[tokio::test]
    async fn missing_caller_is_unauthenticated() {
        let sender = RecordingSender::ok();
        for caller in [None, Some(""), Some("   ")] {
            let err = dispatch(caller, &valid_request(), &sender).await.unwrap_err();
            assert_eq!(err.code(), "unauthenticated");
        }
        assert!(sender.sent.lock().await.is_none());
    }

    #[tokio::test]
    async fn each_missing_field_is_invalid_argument() {
        let sender = RecordingSender::ok();
        let cases: [(&str, fn(&mut NotificationRequest)); 3] = [
            ("fcmToken", |r| r.fcm_token.clear()),
            ("title", |r| r.title.clear()),
            ("body", |r| r.body.clear()),
        ];
        for (field, clear) in cases {
            let mut req = valid_request();
            clear(&mut req);
            let err = dispatch(Some("user-1"), &req, &sender).await.unwrap_err();
            assert_eq!(err.code(), "invalid-argument");
            assert!(err.to_string().contains(field));
        }
    }

    #[tokio::test]
    async fn push_failure_surfaces_as_internal_with_detail() {
        let sender = RecordingSender::failing("registration token expired");
        let err = dispatch(Some("user-1"), &valid_request(), &sender)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "internal");
        assert!(err.to_string().contains("registration token expired"));
    }

    #[tokio::test]
    async fn success_sends_platform_envelope() {
        let sender = RecordingSender::ok();
        let resp = dispatch(Some("user-1"), &valid_request(), &sender)
            .await
            .unwrap();
        assert!(resp.success);

        let envelope = sender.sent.lock().await.clone().unwrap();
        assert_eq!(envelope["to"], "token-123");
        assert_eq!(envelope["notification"]["title"], "New like");
        assert_eq!(envelope["notification"]["body"], "Someone liked your activity");
        assert_eq!(envelope["data"]["activityId"], "abc");
        assert_eq!(envelope["android"]["priority"], "high");
        assert_eq!(envelope["apns"]["payload"]["aps"]["badge"], 1);
        assert_eq!(envelope["apns"]["payload"]["aps"]["sound"], "default");
    }
}
