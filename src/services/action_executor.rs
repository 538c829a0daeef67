//! 动作执行服务 - 业务能力层
//!
//! 两部分能力：
//! - 填充策略：把一个值写进一个元素（框架感知赋值 / 普通赋值 / 点击 / 复选框）
//! - 动作序列：按平台配置逐步执行点击、赋值、键盘鼠标事件与等待

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::{DomEvent, DomOp, ElementHandle, PageHost};
use crate::models::platform::{BASE_PLACEHOLDER, VALUE_PLACEHOLDER};
use crate::models::{Action, ActionStep, FieldValue, FillMethod};
use crate::services::element_locator::ElementLocator;

/// 动作序列执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// 全部完成；`current` 为最后绑定的元素
    Completed { current: Option<ElementHandle> },
    /// 某一步的必需元素没有出现
    Aborted { step: usize, reason: String },
}

/// 动作序列的定位上下文
#[derive(Debug, Clone, Copy)]
pub struct SequenceScope<'a> {
    /// `%BASE%` 的替换值
    pub base_locator: &'a str,
    /// `%VALUE%` 的替换值
    pub value: &'a str,
    /// 字段的填充策略，决定 `set_value` 的写法
    pub method: FillMethod,
}

impl SequenceScope<'_> {
    fn substitute(&self, raw: &str) -> String {
        raw.replace(BASE_PLACEHOLDER, self.base_locator)
            .replace(VALUE_PLACEHOLDER, self.value)
    }
}

/// 动作执行服务
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionExecutor {
    locator: ElementLocator,
}

impl ActionExecutor {
    pub fn new(locator: ElementLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    /// 框架感知赋值：原型 setter + 带标记的 input + change
    pub async fn framework_set(
        &self,
        page: &dyn PageHost,
        el: ElementHandle,
        text: &str,
    ) -> AppResult<()> {
        page.perform(el, &DomOp::NativeSetValue(text.to_string())).await?;
        page.perform(el, &DomOp::Dispatch(DomEvent::Input { programmatic: true }))
            .await?;
        page.perform(el, &DomOp::Dispatch(DomEvent::Change)).await
    }

    /// 普通赋值：focus → 清空 → 赋值 → input → change → 可选 blur
    pub async fn plain_set(
        &self,
        page: &dyn PageHost,
        el: ElementHandle,
        text: &str,
        blur: bool,
    ) -> AppResult<()> {
        page.perform(el, &DomOp::Focus).await?;
        page.perform(el, &DomOp::ClearValue).await?;
        page.perform(el, &DomOp::AssignValue(text.to_string())).await?;
        page.perform(el, &DomOp::Dispatch(DomEvent::Input { programmatic: false }))
            .await?;
        page.perform(el, &DomOp::Dispatch(DomEvent::Change)).await?;
        if blur {
            page.perform(el, &DomOp::Blur).await?;
        }
        Ok(())
    }

    /// 按填充策略把值写入元素
    pub async fn apply_strategy(
        &self,
        page: &dyn PageHost,
        el: ElementHandle,
        method: FillMethod,
        value: &FieldValue,
    ) -> AppResult<()> {
        match method {
            FillMethod::FrameworkSet => self.framework_set(page, el, &value.as_text()).await,
            FillMethod::PlainSet => self.plain_set(page, el, &value.as_text(), false).await,
            FillMethod::Click => page.perform(el, &DomOp::Click).await,
            FillMethod::Checkbox => {
                let wanted = value.is_truthy();
                if page.is_checked(el).await? != wanted {
                    page.perform(el, &DomOp::Click).await?;
                } else {
                    debug!("复选框已处于目标状态 ({}), 跳过点击", wanted);
                }
                Ok(())
            }
        }
    }

    async fn perform_step(
        &self,
        page: &dyn PageHost,
        el: ElementHandle,
        step: &ActionStep,
        scope: &SequenceScope<'_>,
    ) -> AppResult<()> {
        match step {
            ActionStep::Click => page.perform(el, &DomOp::Click).await,
            ActionStep::SetValue { blur } => match scope.method {
                FillMethod::FrameworkSet => {
                    self.framework_set(page, el, scope.value).await?;
                    if *blur {
                        page.perform(el, &DomOp::Blur).await?;
                    }
                    Ok(())
                }
                _ => self.plain_set(page, el, scope.value, *blur).await,
            },
            ActionStep::ClearValue => page.perform(el, &DomOp::ClearValue).await,
            ActionStep::Focus => page.perform(el, &DomOp::Focus).await,
            ActionStep::Blur => page.perform(el, &DomOp::Blur).await,
            ActionStep::Key(opts) => page.perform(el, &DomOp::Key(opts.clone())).await,
            ActionStep::Mouse(kind) => page.perform(el, &DomOp::Mouse(*kind)).await,
        }
    }

    /// 执行动作序列
    ///
    /// `start` 为字段已命中的元素；没有 `target` 的动作作用于当前元素，
    /// `wait_for` 命中后当前元素重新绑定为新出现的元素。
    pub async fn run_sequence(
        &self,
        page: &dyn PageHost,
        scope: SequenceScope<'_>,
        start: Option<ElementHandle>,
        actions: &[Action],
    ) -> AppResult<SequenceOutcome> {
        let mut current = start;

        for (idx, action) in actions.iter().enumerate() {
            let step_no = idx + 1;

            if let Some(delay) = action.delay {
                sleep(delay).await;
            }

            let target = match &action.target {
                Some(raw) => {
                    let resolved = scope.substitute(raw);
                    self.locator
                        .wait_for(page, &[resolved.clone()], action.target_timeout())
                        .await?
                        .map(|found| found.handle)
                        .ok_or(resolved)
                }
                None => current.ok_or_else(|| "<当前元素>".to_string()),
            };

            let el = match target {
                Ok(el) => el,
                Err(missing) if action.allow_failure => {
                    debug!("动作 #{} 目标不存在, 已跳过: {}", step_no, missing);
                    continue;
                }
                Err(missing) => {
                    return Ok(SequenceOutcome::Aborted {
                        step: step_no,
                        reason: format!("动作目标不存在: {}", missing),
                    });
                }
            };

            let waited: Vec<String> = action
                .wait_for
                .iter()
                .map(|raw| scope.substitute(raw))
                .collect();
            // 动作之前已经存在的命中元素不算数
            let existing = if waited.is_empty() {
                Vec::new()
            } else {
                self.locator.snapshot(page, &waited).await?
            };

            self.perform_step(page, el, &action.step, &scope).await?;
            if action.target.is_some() {
                current = Some(el);
            }

            if waited.is_empty() {
                continue;
            }

            match self
                .locator
                .wait_for_new(page, &waited, action.wait_timeout(), &existing)
                .await?
            {
                Some(found) => current = Some(found.handle),
                None if action.allow_failure => {
                    warn!(
                        "动作 #{} 等待的元素未出现 ({:?}), 继续执行",
                        step_no,
                        action.wait_timeout()
                    );
                }
                None => {
                    return Ok(SequenceOutcome::Aborted {
                        step: step_no,
                        reason: format!("等待元素超时: {}", waited.join(" | ")),
                    });
                }
            }
        }

        Ok(SequenceOutcome::Completed { current })
    }
}
