//! 平台识别服务 - 业务能力层
//!
//! URL glob 模式在构造时统一编译为正则，识别时只做匹配

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::{AppError, AppResult, RegistryError};
use crate::infrastructure::PageHost;
use crate::models::{PlatformConfig, PlatformRegistry};
use crate::services::element_locator::ElementLocator;

/// glob → 不区分大小写、整串锚定的正则
///
/// `*` 匹配任意序列，`?` 匹配单个字符，其余字符按字面匹配。
pub fn glob_to_regex(pattern: &str) -> AppResult<Regex> {
    let mut source = String::with_capacity(pattern.len() * 2 + 2);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            AppError::from(RegistryError::BadPattern {
                pattern: pattern.to_string(),
                source: e,
            })
        })
}

/// 单次匹配，不缓存编译结果
pub fn matches(url: &str, pattern: &str) -> AppResult<bool> {
    Ok(glob_to_regex(pattern)?.is_match(url))
}

struct CompiledPlatform {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl CompiledPlatform {
    fn accepts(&self, url: &str) -> bool {
        self.include.iter().any(|r| r.is_match(url)) && !self.exclude.iter().any(|r| r.is_match(url))
    }
}

/// 平台识别服务
pub struct PlatformDetector {
    registry: Arc<PlatformRegistry>,
    compiled: Vec<CompiledPlatform>,
}

impl PlatformDetector {
    pub fn new(registry: Arc<PlatformRegistry>) -> AppResult<Self> {
        let compiled = registry
            .platforms()
            .iter()
            .map(|p| {
                Ok(CompiledPlatform {
                    include: p.urls.iter().map(|u| glob_to_regex(u)).collect::<AppResult<_>>()?,
                    exclude: p
                        .exclude
                        .iter()
                        .map(|u| glob_to_regex(u))
                        .collect::<AppResult<_>>()?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { registry, compiled })
    }

    pub fn registry(&self) -> &Arc<PlatformRegistry> {
        &self.registry
    }

    /// 按注册顺序返回第一个接受该 URL 的平台
    pub fn detect(&self, url: &str) -> Option<&PlatformConfig> {
        let found = self
            .registry
            .platforms()
            .iter()
            .zip(&self.compiled)
            .find(|(_, compiled)| compiled.accepts(url))
            .map(|(platform, _)| platform);

        match found {
            Some(p) => debug!("识别到平台 {}: {}", p.name, url),
            None => debug!("未识别的页面: {}", url),
        }
        found
    }

    /// 页面上是否已有提交成功标识
    pub async fn is_already_submitted(
        &self,
        page: &dyn PageHost,
        locator: &ElementLocator,
        platform: &PlatformConfig,
    ) -> AppResult<bool> {
        if platform.success.is_empty() {
            return Ok(false);
        }
        Ok(locator.find_first(page, &platform.success).await?.is_some())
    }
}
