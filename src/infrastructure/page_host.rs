//! 页面能力接口
//!
//! 引擎对 DOM 的全部访问都经过 `PageHost`：查询元素、读取状态、执行一次 DOM 操作。
//! 浏览器实现见 `JsExecutor`，测试使用内存中的假页面。

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{KeyEventOptions, MouseEventKind, ResumeFile};

/// 页面内元素句柄，只在所属页面内有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct ElementHandle(pub u64);

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 元素定位器：XPath 或 CSS 选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    /// 以 `.//`、`//` 或 `(` 开头的视为 XPath，其余为 CSS
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with(".//") || trimmed.starts_with("//") || trimmed.starts_with('(') {
            Locator::XPath(trimmed.to_string())
        } else {
            Locator::Css(trimmed.to_string())
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Locator::XPath(s) | Locator::Css(s) => s,
        }
    }

    pub fn is_xpath(&self) -> bool {
        matches!(self, Locator::XPath(_))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw())
    }
}

/// 计算样式中与可见性相关的部分
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedVisibility {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    pub has_offset_parent: bool,
}

impl ComputedVisibility {
    pub fn visible() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            has_offset_parent: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            display: "none".to_string(),
            ..Self::visible()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.display != "none"
            && self.visibility != "hidden"
            && self.opacity > 0.0
            && self.has_offset_parent
    }
}

/// 当前文档位置
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageLocation {
    pub href: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub title: String,
}

/// 合成 DOM 事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    /// `programmatic` 为真时在事件上打 `simulated` 标记
    Input { programmatic: bool },
    Change,
}

/// 对单个元素的一次原子操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomOp {
    Click,
    Focus,
    Blur,
    ClearValue,
    /// 直接赋值 `.value`
    AssignValue(String),
    /// 通过原型上的原生 setter 赋值，绕过框架对 `.value` 的拦截
    NativeSetValue(String),
    Dispatch(DomEvent),
    Key(KeyEventOptions),
    Mouse(MouseEventKind),
    /// 通过 `DataTransfer` 设置文件输入框的文件列表
    SetFiles(ResumeFile),
}

/// 页面能力
#[async_trait]
pub trait PageHost: Send + Sync {
    async fn location(&self) -> AppResult<PageLocation>;

    /// 第一个匹配的元素
    async fn query(&self, locator: &Locator) -> AppResult<Option<ElementHandle>>;

    /// 所有匹配的元素，按文档顺序
    async fn query_all(&self, locator: &Locator) -> AppResult<Vec<ElementHandle>>;

    async fn visibility(&self, element: ElementHandle) -> AppResult<ComputedVisibility>;

    /// 规整前的文本内容
    async fn text(&self, element: ElementHandle) -> AppResult<String>;

    /// `<meta property=..>` 或 `<meta name=..>` 的 content
    async fn meta_content(&self, property: &str) -> AppResult<Option<String>>;

    async fn is_checked(&self, element: ElementHandle) -> AppResult<bool>;

    async fn perform(&self, element: ElementHandle, op: &DomOp) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind_detection() {
        assert!(Locator::parse("//input[@id='a']").is_xpath());
        assert!(Locator::parse(".//li").is_xpath());
        assert!(Locator::parse("(//li)[2]").is_xpath());
        assert!(!Locator::parse("#first_name").is_xpath());
        assert!(!Locator::parse("input[name='x']").is_xpath());
        assert_eq!(Locator::parse("  #a ").raw(), "#a");
    }

    #[test]
    fn test_visibility_rule() {
        assert!(ComputedVisibility::visible().is_visible());
        assert!(!ComputedVisibility::hidden().is_visible());

        let transparent = ComputedVisibility {
            opacity: 0.0,
            ..ComputedVisibility::visible()
        };
        assert!(!transparent.is_visible());

        let detached = ComputedVisibility {
            has_offset_parent: false,
            ..ComputedVisibility::visible()
        };
        assert!(!detached.is_visible());
    }
}
