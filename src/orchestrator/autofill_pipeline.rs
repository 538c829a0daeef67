//! 单次自动填表运行 - 编排层
//!
//! 顺序：识别平台 → 抽取职位 → 读取载荷 → 定制资料 → 填写表单 → 上传简历 → 检查提交按钮 → 投递跟踪
//!
//! - 同一页面同时只允许一次运行
//! - 上传步骤内部的错误只中止上传，不影响整次运行
//! - 其他意外错误中止剩余步骤：一条用户提示 + 一条失败遥测，不自动重试

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clients::{HostBridge, RunStatus};
use crate::config::EngineSettings;
use crate::error::{AppError, AppResult, RunError};
use crate::infrastructure::PageHost;
use crate::models::{
    FailureEvent, FormFillResult, JobPosting, PlatformConfig, TrackingEvent, UploadOutcome,
};
use crate::services::{
    ActionExecutor, ElementLocator, PageDataExtractor, PlatformDetector, ProfileTailor,
};
use crate::workflow::{FileUploadCoordinator, FormFillCoordinator};

/// 平台识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Unsupported,
    AlreadySubmitted { platform: String },
    Ready { platform: String },
}

impl Detection {
    pub fn platform(&self) -> Option<&str> {
        match self {
            Detection::Unsupported => None,
            Detection::AlreadySubmitted { platform } | Detection::Ready { platform } => {
                Some(platform)
            }
        }
    }
}

/// 一次运行的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub url: String,
    pub detection: Detection,
    pub posting: Option<JobPosting>,
    pub fill: Option<FormFillResult>,
    pub upload: Option<UploadOutcome>,
    /// 页面上找到的提交按钮定位器（只报告，不点击）
    pub submit_control: Option<String>,
    /// 跟踪事件是否已送达
    pub tracked: bool,
}

impl RunReport {
    fn skipped(url: String, detection: Detection) -> Self {
        Self {
            url,
            detection,
            posting: None,
            fill: None,
            upload: None,
            submit_control: None,
            tracked: false,
        }
    }
}

/// 运行阶段，用于失败遥测
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Detect,
    Extract,
    LoadPayloads,
    Tailor,
    Fill,
    Upload,
    SubmitCheck,
    Track,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Detect => "detect",
            Stage::Extract => "extract",
            Stage::LoadPayloads => "load_payloads",
            Stage::Tailor => "tailor",
            Stage::Fill => "fill",
            Stage::Upload => "upload",
            Stage::SubmitCheck => "submit_check",
            Stage::Track => "track",
        }
    }
}

/// 运行守卫，离开作用域时释放
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 运行过程中累积的上下文，失败时用于遥测
#[derive(Debug, Default)]
struct Progress {
    url: String,
    platform: Option<String>,
}

/// 自动填表流水线
pub struct AutofillPipeline {
    detector: PlatformDetector,
    locator: ElementLocator,
    extractor: PageDataExtractor,
    tailor: ProfileTailor,
    form_fill: FormFillCoordinator,
    upload: FileUploadCoordinator,
    running: AtomicBool,
}

impl AutofillPipeline {
    pub fn new(detector: PlatformDetector, settings: EngineSettings) -> Self {
        let locator = ElementLocator::new(Duration::from_millis(settings.poll_interval_ms));
        let executor = ActionExecutor::new(locator);
        Self {
            detector,
            locator,
            extractor: PageDataExtractor::new(locator),
            tailor: ProfileTailor::new(settings.tailor),
            form_fill: FormFillCoordinator::new(executor),
            upload: FileUploadCoordinator::new(
                executor,
                Duration::from_millis(settings.upload_success_timeout_ms),
            ),
            running: AtomicBool::new(false),
        }
    }

    pub fn detector(&self) -> &PlatformDetector {
        &self.detector
    }

    /// 是否有运行正在进行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> AppResult<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::from(RunError::AlreadyRunning))?;
        Ok(RunGuard(&self.running))
    }

    /// 识别当前页面：不支持 / 已提交 / 可以填写
    pub async fn detect(
        &self,
        page: &dyn PageHost,
    ) -> AppResult<(String, Option<&PlatformConfig>, Detection)> {
        let href = page.location().await?.href;
        let Some(platform) = self.detector.detect(&href) else {
            return Ok((href, None, Detection::Unsupported));
        };
        let detection = if self
            .detector
            .is_already_submitted(page, &self.locator, platform)
            .await?
        {
            Detection::AlreadySubmitted {
                platform: platform.name.clone(),
            }
        } else {
            Detection::Ready {
                platform: platform.name.clone(),
            }
        };
        Ok((href, Some(platform), detection))
    }

    /// 执行一次完整运行
    ///
    /// 已有运行进行中时返回 `RunError::AlreadyRunning`，不触碰页面
    pub async fn run(&self, page: &dyn PageHost, bridge: &dyn HostBridge) -> AppResult<RunReport> {
        let _guard = self.try_begin()?;

        let mut stage = Stage::Detect;
        let mut progress = Progress::default();
        match self.run_stages(page, bridge, &mut stage, &mut progress).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.report_failure(bridge, stage, &progress, &e).await;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        page: &dyn PageHost,
        bridge: &dyn HostBridge,
        stage: &mut Stage,
        progress: &mut Progress,
    ) -> AppResult<RunReport> {
        let (url, platform, detection) = self.detect(page).await?;
        progress.url = url.clone();
        progress.platform = detection.platform().map(str::to_string);

        let platform = match platform {
            Some(platform) if matches!(detection, Detection::Ready { .. }) => platform,
            Some(platform) => {
                info!("[平台 {}] 页面已是提交成功页, 跳过", platform.name);
                bridge
                    .show_status(&RunStatus::AlreadySubmitted {
                        platform: platform.name.clone(),
                    })
                    .await?;
                return Ok(RunReport::skipped(url, detection));
            }
            None => {
                info!("🔍 未识别到受支持的平台: {}", url);
                bridge.show_status(&RunStatus::Unsupported).await?;
                return Ok(RunReport::skipped(url, detection));
            }
        };

        info!("[平台 {}] ✓ 识别成功: {}", platform.name, url);
        bridge
            .show_status(&RunStatus::Started {
                platform: platform.name.clone(),
            })
            .await?;

        *stage = Stage::Extract;
        let posting = self.extractor.extract(page, platform).await;
        info!("[平台 {}] 职位: {}", platform.name, posting);

        *stage = Stage::LoadPayloads;
        let resume = bridge.load_resume().await?;
        let profile = bridge.load_profile().await?;

        *stage = Stage::Tailor;
        let tailored = self.tailor.tailor(&resume, &profile, Some(&posting));
        debug!(
            "[平台 {}] 定制完成: {} 个字段, {} 个关键词",
            platform.name,
            tailored.fields.len(),
            tailored.keywords.len()
        );

        *stage = Stage::Fill;
        let fill = self.form_fill.fill_all(page, platform, &tailored).await?;

        *stage = Stage::Upload;
        let upload = match self.upload.upload(page, platform, &resume).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_upload_error() => {
                warn!("[平台 {}] ⚠️ 简历上传中止: {}", platform.name, e);
                UploadOutcome::Aborted {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };

        *stage = Stage::SubmitCheck;
        let submit_control = self.form_fill.find_submit_control(page, platform).await?;
        match &submit_control {
            Some(locator) => info!("[平台 {}] 提交按钮已就绪: {}", platform.name, locator),
            None => warn!("[平台 {}] ⚠️ 未找到提交按钮", platform.name),
        }

        *stage = Stage::Track;
        let event = TrackingEvent::new(&platform.name, &posting);
        let tracked = match bridge.track_application(&event).await {
            Ok(()) => true,
            Err(e) => {
                warn!("[平台 {}] ⚠️ 投递跟踪发送失败: {}", platform.name, e);
                false
            }
        };

        bridge
            .show_status(&RunStatus::Completed {
                filled: fill.filled_count,
                skipped: fill.skip_count,
            })
            .await?;

        Ok(RunReport {
            url,
            detection,
            posting: Some(posting),
            fill: Some(fill),
            upload: Some(upload),
            submit_control,
            tracked,
        })
    }

    /// 一条用户提示 + 一条失败遥测；两者自身的失败只记日志
    async fn report_failure(
        &self,
        bridge: &dyn HostBridge,
        stage: Stage,
        progress: &Progress,
        err: &AppError,
    ) {
        let message = err.to_string();
        if let Err(e) = bridge
            .show_status(&RunStatus::Failed {
                message: message.clone(),
            })
            .await
        {
            warn!("显示失败状态时出错: {}", e);
        }

        let event = FailureEvent {
            url: progress.url.clone(),
            platform_name: progress.platform.clone(),
            stage: stage.as_str().to_string(),
            message,
            occurred_at: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = bridge.report_failure(&event).await {
            warn!("发送失败遥测时出错: {}", e);
        }
    }
}
