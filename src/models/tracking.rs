use serde::{Deserialize, Serialize};

use crate::models::posting::JobPosting;

/// 投递跟踪事件，转发给外部跟踪服务
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub url: String,
    pub platform_name: String,
    pub job_title: String,
    pub company: String,
    pub applied_at: String,
}

impl TrackingEvent {
    pub fn new(platform_name: &str, posting: &JobPosting) -> Self {
        Self {
            url: posting.url.clone(),
            platform_name: platform_name.to_string(),
            job_title: posting.title.clone(),
            company: posting.company.clone(),
            applied_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// 失败遥测事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEvent {
    pub url: String,
    pub platform_name: Option<String>,
    pub stage: String,
    pub message: String,
    pub occurred_at: String,
}
