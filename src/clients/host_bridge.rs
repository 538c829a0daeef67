//! 主机通信
//!
//! 引擎与外部协作方（简历存储、投递跟踪、用户提示）之间的请求 / 响应接口。
//! 每种消息一个可等待的调用。

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::clients::tracking_client::TrackingClient;
use crate::config::Config;
use crate::error::{AppResult, PayloadError};
use crate::models::{
    load_json_payload, FailureEvent, StoredProfile, StoredResume, TrackingEvent,
};

/// 展示给用户的运行状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// 当前页面不是受支持的平台
    Unsupported,
    /// 页面已是提交成功页
    AlreadySubmitted { platform: String },
    Started { platform: String },
    Completed { filled: usize, skipped: usize },
    Failed { message: String },
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Unsupported => write!(f, "当前页面不是受支持的招聘平台"),
            RunStatus::AlreadySubmitted { platform } => {
                write!(f, "{} 申请已提交, 不再自动填写", platform)
            }
            RunStatus::Started { platform } => write!(f, "正在自动填写 {} 申请表...", platform),
            RunStatus::Completed { filled, skipped } => {
                write!(f, "已填写 {} 个字段, 跳过 {} 个, 请检查后手动提交", filled, skipped)
            }
            RunStatus::Failed { message } => write!(f, "自动填写失败: {}", message),
        }
    }
}

/// 主机通信接口
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn load_resume(&self) -> AppResult<StoredResume>;

    async fn load_profile(&self) -> AppResult<StoredProfile>;

    async fn track_application(&self, event: &TrackingEvent) -> AppResult<()>;

    async fn report_failure(&self, event: &FailureEvent) -> AppResult<()>;

    async fn show_status(&self, status: &RunStatus) -> AppResult<()>;
}

/// 本地主机：从磁盘读取载荷，跟踪事件发到配置的接口（未配置时只写日志）
pub struct LocalHostBridge {
    resume_file: PathBuf,
    profile_file: PathBuf,
    tracking: Option<TrackingClient>,
}

impl LocalHostBridge {
    pub fn new(config: &Config) -> AppResult<Self> {
        let tracking = match &config.tracking_endpoint {
            Some(endpoint) => Some(TrackingClient::new(endpoint.as_str())?),
            None => None,
        };
        Ok(Self {
            resume_file: PathBuf::from(&config.resume_file),
            profile_file: PathBuf::from(&config.profile_file),
            tracking,
        })
    }
}

#[async_trait]
impl HostBridge for LocalHostBridge {
    async fn load_resume(&self) -> AppResult<StoredResume> {
        if !self.resume_file.exists() {
            return Err(PayloadError::Missing {
                what: format!("简历文件 {}", self.resume_file.display()),
            }
            .into());
        }
        load_json_payload(&self.resume_file).await
    }

    /// 个人资料可选，文件不存在时使用空资料
    async fn load_profile(&self) -> AppResult<StoredProfile> {
        if !self.profile_file.exists() {
            warn!(
                "个人资料文件不存在, 只使用简历信息: {}",
                self.profile_file.display()
            );
            return Ok(StoredProfile::default());
        }
        load_json_payload(&self.profile_file).await
    }

    async fn track_application(&self, event: &TrackingEvent) -> AppResult<()> {
        match &self.tracking {
            Some(client) => client.post_event("trackApplication", event).await,
            None => {
                info!(
                    "📌 投递记录: {} | {} @ {} | {}",
                    event.platform_name, event.job_title, event.company, event.url
                );
                Ok(())
            }
        }
    }

    async fn report_failure(&self, event: &FailureEvent) -> AppResult<()> {
        match &self.tracking {
            Some(client) => client.post_event("reportFailure", event).await,
            None => {
                error!(
                    "失败遥测: [{}] {} ({})",
                    event.stage, event.message, event.url
                );
                Ok(())
            }
        }
    }

    async fn show_status(&self, status: &RunStatus) -> AppResult<()> {
        match status {
            RunStatus::Failed { .. } => error!("❌ {}", status),
            RunStatus::Completed { .. } => info!("✅ {}", status),
            _ => info!("{}", status),
        }
        Ok(())
    }
}
