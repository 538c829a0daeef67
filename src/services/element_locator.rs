//! 元素定位服务 - 业务能力层
//!
//! 把定位器字符串解析为页面元素，提供轮询等待能力

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::{ElementHandle, Locator, PageHost};

/// 命中的元素及命中它的定位器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub handle: ElementHandle,
    pub locator: String,
}

/// 元素定位服务
///
/// 职责：
/// - XPath / CSS 自动识别
/// - 候选定位器按顺序尝试，命中第一个即停止
/// - 轮询等待元素出现
#[derive(Debug, Clone, Copy)]
pub struct ElementLocator {
    poll_interval: Duration,
}

impl ElementLocator {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn find(&self, page: &dyn PageHost, raw: &str) -> AppResult<Option<ElementHandle>> {
        page.query(&Locator::parse(raw)).await
    }

    pub async fn find_all(&self, page: &dyn PageHost, raw: &str) -> AppResult<Vec<ElementHandle>> {
        page.query_all(&Locator::parse(raw)).await
    }

    /// 依次尝试候选定位器，返回第一个命中的元素
    pub async fn find_first(
        &self,
        page: &dyn PageHost,
        candidates: &[String],
    ) -> AppResult<Option<Found>> {
        for raw in candidates {
            if let Some(handle) = self.find(page, raw).await? {
                return Ok(Some(Found {
                    handle,
                    locator: raw.clone(),
                }));
            }
        }
        Ok(None)
    }

    /// 所有匹配且可见的元素
    pub async fn find_visible(
        &self,
        page: &dyn PageHost,
        raw: &str,
    ) -> AppResult<Vec<ElementHandle>> {
        let mut visible = Vec::new();
        for handle in self.find_all(page, raw).await? {
            match page.visibility(handle).await {
                Ok(v) if v.is_visible() => visible.push(handle),
                Ok(_) => {}
                // 查询与读取样式之间元素被移除
                Err(AppError::Browser(BrowserError::StaleHandle { .. })) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(visible)
    }

    /// 轮询直到任一候选定位器命中或超时
    ///
    /// 每个轮询周期按顺序尝试所有候选；超时为零时只检查一次。
    pub async fn wait_for(
        &self,
        page: &dyn PageHost,
        candidates: &[String],
        timeout: Duration,
    ) -> AppResult<Option<Found>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = self.find_first(page, candidates).await? {
                return Ok(Some(found));
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("等待元素超时 ({:?}): {:?}", timeout, candidates);
                return Ok(None);
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// 所有候选定位器当前命中的元素
    pub async fn snapshot(
        &self,
        page: &dyn PageHost,
        candidates: &[String],
    ) -> AppResult<Vec<ElementHandle>> {
        let mut handles = Vec::new();
        for raw in candidates {
            handles.extend(self.find_all(page, raw).await?);
        }
        Ok(handles)
    }

    /// 轮询直到出现一个不在 `existing` 中的命中元素或超时
    ///
    /// 同一个节点的句柄不变，重新渲染出的节点算作新元素。
    pub async fn wait_for_new(
        &self,
        page: &dyn PageHost,
        candidates: &[String],
        timeout: Duration,
        existing: &[ElementHandle],
    ) -> AppResult<Option<Found>> {
        let deadline = Instant::now() + timeout;
        loop {
            for raw in candidates {
                let fresh = self
                    .find_all(page, raw)
                    .await?
                    .into_iter()
                    .find(|h| !existing.contains(h));
                if let Some(handle) = fresh {
                    return Ok(Some(Found {
                        handle,
                        locator: raw.clone(),
                    }));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("等待新元素超时 ({:?}): {:?}", timeout, candidates);
                return Ok(None);
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

impl Default for ElementLocator {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
