//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次自动填表运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 加载平台注册表
//! - 管理浏览器资源（Browser、JsExecutor）
//! - 输出运行汇总
//!
//! ### `autofill_pipeline` - 单次运行流水线
//! - 识别平台、抽取职位、定制资料
//! - 依次调用表单填写与简历上传
//! - 运行守卫：同一页面同时只允许一次运行
//! - 失败时一条用户提示 + 一条失败遥测
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser / JsExecutor / HostBridge)
//!     ↓
//! autofill_pipeline (一次运行)
//!     ↓
//! workflow::FormFillCoordinator / FileUploadCoordinator
//!     ↓
//! services (能力层：detect / extract / tailor / locate / execute)
//!     ↓
//! infrastructure (基础设施：PageHost / JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 Browser 和 JsExecutor
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和汇总，不做具体填写判断

pub mod app;
pub mod autofill_pipeline;

// 重新导出主要类型
pub use app::App;
pub use autofill_pipeline::{AutofillPipeline, Detection, RunReport};
