//! 表单填写流程 - 流程层
//!
//! 核心职责：按平台声明的字段顺序逐个填写
//!
//! 单个字段的流程：
//! 1. 取值，缺失则跳过（不触碰任何定位器）
//! 2. 依次尝试定位规格：定位 → 值转换 → 填充策略或动作序列
//! 3. 全部规格失败则跳过，不报错

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::PageHost;
use crate::models::value_transform;
use crate::models::{
    FieldConfig, FieldOutcome, FieldValue, FillMethod, FormFillResult, LocatorSpec,
    PlatformConfig, SkipReason, TailoredProfile,
};
use crate::services::{ActionExecutor, SequenceOutcome, SequenceScope};
use crate::workflow::fill_ctx::FieldCtx;

/// 单个规格的尝试结果
enum Attempt {
    Filled,
    /// 找到元素但未能完成
    Aborted(String),
    /// 没有候选定位器命中
    NotFound,
}

/// 表单填写流程
///
/// - 字段严格按声明顺序串行填写
/// - 字段级失败只影响该字段
/// - 不点击提交按钮
pub struct FormFillCoordinator {
    executor: ActionExecutor,
}

impl FormFillCoordinator {
    pub fn new(executor: ActionExecutor) -> Self {
        Self { executor }
    }

    /// 填写平台声明的全部字段
    pub async fn fill_all(
        &self,
        page: &dyn PageHost,
        platform: &PlatformConfig,
        profile: &TailoredProfile,
    ) -> AppResult<FormFillResult> {
        let mut result = FormFillResult::default();
        info!(
            "[平台 {}] ✍️ 开始填写 {} 个字段",
            platform.name,
            platform.fields.len()
        );

        for (idx, field) in platform.fields.iter().enumerate() {
            let ctx = FieldCtx::new(&platform.name, idx + 1, &field.name);
            let outcome = self
                .fill_field(page, &ctx, field, platform.fill_method, profile.value(&field.name))
                .await?;
            result.record(&field.name, outcome);
        }

        info!(
            "[平台 {}] ✓ 填写完成: 成功 {} / 跳过 {}",
            platform.name, result.filled_count, result.skip_count
        );
        Ok(result)
    }

    /// 填写单个字段；定位失败与动作超时都只产生跳过
    pub async fn fill_field(
        &self,
        page: &dyn PageHost,
        ctx: &FieldCtx,
        field: &FieldConfig,
        default_method: FillMethod,
        value: Option<&FieldValue>,
    ) -> AppResult<FieldOutcome> {
        let Some(value) = value.filter(|v| v.is_fillable()) else {
            debug!("{} 资料中没有值, 跳过", ctx);
            return Ok(FieldOutcome::skipped(SkipReason::NoValue));
        };

        let mut last_abort: Option<String> = None;
        for (idx, spec) in field.specs.iter().enumerate() {
            match self.try_spec(page, ctx, spec, default_method, value).await? {
                (Attempt::Filled, Some(locator)) => {
                    info!("{} ✓ 已填写 ({})", ctx, locator);
                    return Ok(FieldOutcome::Filled { locator });
                }
                (Attempt::Aborted(reason), _) => {
                    warn!("{} 规格 #{} 未完成: {}", ctx, idx + 1, reason);
                    last_abort = Some(reason);
                }
                _ => debug!("{} 规格 #{} 没有命中元素", ctx, idx + 1),
            }
        }

        let cause = match last_abort {
            Some(reason) => SkipReason::ActionAborted(reason),
            None => SkipReason::NoElement,
        };
        info!("{} ⚠️ 未能填写, 跳过", ctx);
        Ok(FieldOutcome::skipped(cause))
    }

    async fn try_spec(
        &self,
        page: &dyn PageHost,
        ctx: &FieldCtx,
        spec: &LocatorSpec,
        default_method: FillMethod,
        value: &FieldValue,
    ) -> AppResult<(Attempt, Option<String>)> {
        let Some(found) = self
            .executor
            .locator()
            .find_first(page, &spec.locators)
            .await?
        else {
            return Ok((Attempt::NotFound, None));
        };

        let value = match &spec.transform {
            Some(table) => FieldValue::Text(value_transform::apply(table, &value.as_text())),
            None => value.clone(),
        };
        let method = spec.method_or(default_method);
        debug!("{} 命中 {} (策略 {})", ctx, found.locator, method);

        let attempt = if spec.actions.is_empty() {
            self.executor
                .apply_strategy(page, found.handle, method, &value)
                .await
                .map(|_| Attempt::Filled)
        } else {
            let text = value.as_text();
            let scope = SequenceScope {
                base_locator: &found.locator,
                value: &text,
                method,
            };
            self.executor
                .run_sequence(page, scope, Some(found.handle), &spec.actions)
                .await
                .map(|outcome| match outcome {
                    SequenceOutcome::Completed { .. } => Attempt::Filled,
                    SequenceOutcome::Aborted { step, reason } => {
                        Attempt::Aborted(format!("动作 #{}: {}", step, reason))
                    }
                })
        };

        match attempt {
            Ok(attempt) => Ok((attempt, Some(found.locator))),
            // 元素在操作过程中被重新渲染
            Err(AppError::Browser(BrowserError::StaleHandle { handle })) => Ok((
                Attempt::Aborted(format!("元素 #{} 已失效", handle)),
                Some(found.locator),
            )),
            // 页面脚本在该元素上抛错，只影响当前字段
            Err(AppError::Browser(BrowserError::ScriptExecutionFailed { source })) => Ok((
                Attempt::Aborted(format!("页面脚本失败: {}", source)),
                Some(found.locator),
            )),
            Err(e) => Err(e),
        }
    }

    /// 提交按钮是否存在，只用于报告，从不点击
    pub async fn find_submit_control(
        &self,
        page: &dyn PageHost,
        platform: &PlatformConfig,
    ) -> AppResult<Option<String>> {
        Ok(self
            .executor
            .locator()
            .find_first(page, &platform.submit)
            .await?
            .map(|found| found.locator))
    }
}
