/// 投递跟踪 API 客户端
///
/// 把跟踪事件与失败遥测以 JSON POST 到配置的接口
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TrackingClient {
    client: Client,
    endpoint: String,
}

impl TrackingClient {
    pub fn new(endpoint: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 发送一条事件：`{"type": <message_type>, "payload": <event>}`
    pub async fn post_event<T: Serialize + ?Sized>(
        &self,
        message_type: &str,
        event: &T,
    ) -> AppResult<()> {
        let body = json!({
            "type": message_type,
            "payload": event,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::host_bridge_failed(
                message_type,
                format!("HTTP {}: {}", status, text),
            ));
        }

        debug!("事件已发送 ({}): {}", message_type, self.endpoint);
        Ok(())
    }
}
