//! # ATS Autofill
//!
//! 一个在招聘平台（ATS）申请页上自动填写表单的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageHost` - 页面接口（查询元素、读取状态、执行 DOM 操作）
//! - `JsExecutor` - 唯一的 page owner，通过 eval() 实现 `PageHost`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `PlatformDetector` - 按 URL 识别平台
//! - `PageDataExtractor` - 抽取职位信息
//! - `ProfileTailor` - 按职位定制简历资料
//! - `ElementLocator` - 定位元素与轮询等待
//! - `ActionExecutor` - 填充策略与动作序列
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张表单"的处理流程
//! - `FieldCtx` - 上下文封装（平台 + 字段序号）
//! - `FormFillCoordinator` - 逐字段填写
//! - `FileUploadCoordinator` - 简历上传
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理浏览器资源
//! - `orchestrator/autofill_pipeline` - 单次运行流水线
//!
//! 另有 `models/`（注册表、资料与结果数据）和 `clients/`（主机通信、投递跟踪）。
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use clients::{HostBridge, LocalHostBridge, RunStatus};
pub use config::{Config, EngineSettings, TailorSettings};
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, PageHost};
pub use models::{FormFillResult, JobPosting, PlatformRegistry, TailoredProfile};
pub use orchestrator::{App, AutofillPipeline, Detection, RunReport};
pub use services::{PlatformDetector, ProfileTailor};
pub use workflow::{FileUploadCoordinator, FormFillCoordinator};
