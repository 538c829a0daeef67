use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

/// 连接到已开启远程调试的浏览器并选择页面
///
/// 选择顺序：
/// 1. URL 与 `target_url` 相同的标签页
/// 2. URL 被 `is_supported` 接受的第一个标签页
/// 3. 指定了 `target_url` 时新建标签页并导航过去
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
    is_supported: impl Fn(&str) -> bool,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await.context("获取标签页列表失败")?;
    debug!("获取到 {} 个页面", pages.len());

    let mut supported: Option<Page> = None;
    for p in pages.iter() {
        let Ok(Some(url)) = p.url().await else {
            continue;
        };
        debug!("检查页面: {}", url);
        if target_url.is_some_and(|t| same_page(t, &url)) {
            info!("✓ 找到目标页面: {}", url);
            return Ok((browser, p.clone()));
        }
        if supported.is_none() && is_supported(&url) {
            supported = Some(p.clone());
        }
    }

    if target_url.is_none() {
        if let Some(page) = supported {
            info!("✓ 找到受支持平台的页面");
            return Ok((browser, page));
        }
    }

    let Some(url) = target_url else {
        error!("没有打开任何受支持平台的页面");
        return Err(AppError::from(BrowserError::NoPage).into());
    };

    debug!("创建新页面并导航到: {}", url);
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;
    page.goto(url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", url, e);
        e
    })?;
    page.wait_for_navigation().await?;
    info!("已导航到: {}", url);

    Ok((browser, page))
}

/// 忽略结尾斜杠与片段比较两个 URL
fn same_page(a: &str, b: &str) -> bool {
    fn normalize(u: &str) -> &str {
        let u = u.split('#').next().unwrap_or(u);
        u.trim_end_matches('/')
    }
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_page() {
        assert!(same_page(
            "https://jobs.lever.co/acme/1/apply/",
            "https://jobs.lever.co/acme/1/apply#form"
        ));
        assert!(!same_page(
            "https://jobs.lever.co/acme/1",
            "https://jobs.lever.co/acme/2"
        ));
    }
}
