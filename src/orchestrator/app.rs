//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、加载注册表、连接浏览器、创建 JsExecutor 和主机通信
//! 2. **单次运行**：委托 `AutofillPipeline` 完成一次自动填表
//! 3. **资源管理**：唯一持有 Browser 的模块
//! 4. **结果汇总**：打印运行汇总

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{error, info};

use crate::browser;
use crate::clients::LocalHostBridge;
use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::models::load_registry;
use crate::orchestrator::autofill_pipeline::{AutofillPipeline, RunReport};
use crate::services::PlatformDetector;
use crate::utils::logging::{init_log_file, log_startup, print_run_summary};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
    pipeline: AutofillPipeline,
    bridge: LocalHostBridge,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置不合法")?;
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let registry = Arc::new(load_registry(config.registry_file.as_deref()).await?);
        let detector = PlatformDetector::new(registry).context("平台 URL 模式无法编译")?;

        // 连接浏览器，优先选择受支持平台的标签页
        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            config.target_url.as_deref(),
            |url| detector.detect(url).is_some(),
        )
        .await?;

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);
        let bridge = LocalHostBridge::new(&config).context("初始化主机通信失败")?;
        let pipeline = AutofillPipeline::new(detector, config.engine_settings());

        Ok(Self {
            config,
            _browser: browser,
            executor,
            pipeline,
            bridge,
        })
    }

    /// 对当前页面执行一次自动填表
    pub async fn run(&self) -> Result<RunReport> {
        info!("🔍 开始识别当前页面");
        let report = match self.pipeline.run(&self.executor, &self.bridge).await {
            Ok(report) => report,
            Err(e) => {
                error!("❌ 自动填表失败: {}", e);
                return Err(e.into());
            }
        };

        print_run_summary(&report, &self.config.output_log_file);
        Ok(report)
    }
}
