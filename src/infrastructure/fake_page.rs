//! 内存中的假页面，仅用于测试
//!
//! 元素按"能被哪些定位器字符串命中"来声明，不解析选择器。

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppResult, BrowserError};
use crate::infrastructure::page_host::{
    ComputedVisibility, DomOp, ElementHandle, Locator, PageHost, PageLocation,
};

/// 元素何时出现在文档中
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Always,
    /// 页面收到 n 次查询之后出现（模拟异步渲染）
    AfterQueries(usize),
    /// 下标为 idx 的元素被点击后出现（模拟下拉菜单）
    RevealedBy(usize),
    /// 在文档中被移除
    Detached,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub locators: Vec<String>,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub visibility: ComputedVisibility,
    pub presence: Presence,
    /// 设置后，对该元素的任何操作都以页面脚本异常失败
    pub script_error: Option<String>,
}

impl FakeElement {
    pub fn new(locators: &[&str]) -> Self {
        Self {
            locators: locators.iter().map(|s| s.to_string()).collect(),
            text: String::new(),
            value: String::new(),
            checked: false,
            visibility: ComputedVisibility::visible(),
            presence: Presence::Always,
            script_error: None,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = ComputedVisibility::hidden();
        self
    }

    pub fn presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn throwing(mut self, message: &str) -> Self {
        self.script_error = Some(message.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct State {
    elements: Vec<FakeElement>,
    ops: Vec<(usize, DomOp)>,
    clicked: Vec<usize>,
    queries: usize,
}

impl State {
    fn is_present(&self, idx: usize) -> bool {
        match &self.elements[idx].presence {
            Presence::Always => true,
            Presence::AfterQueries(n) => self.queries > *n,
            Presence::RevealedBy(by) => self.clicked.contains(by),
            Presence::Detached => false,
        }
    }

    fn matching(&self, locator: &Locator) -> Vec<usize> {
        (0..self.elements.len())
            .filter(|&i| self.elements[i].locators.iter().any(|l| l == locator.raw()))
            .filter(|&i| self.is_present(i))
            .collect()
    }

    fn element(&self, handle: ElementHandle) -> AppResult<&FakeElement> {
        let idx = handle.0 as usize;
        if idx >= self.elements.len() || !self.is_present(idx) {
            return Err(BrowserError::StaleHandle { handle: handle.0 }.into());
        }
        Ok(&self.elements[idx])
    }
}

pub struct FakePage {
    location: PageLocation,
    meta: HashMap<String, String>,
    state: Mutex<State>,
}

impl FakePage {
    pub fn new(href: &str) -> Self {
        let hostname = url::Url::parse(href)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            location: PageLocation {
                href: href.to_string(),
                hostname,
                title: String::new(),
            },
            meta: HashMap::new(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.location.title = title.to_string();
        self
    }

    pub fn with_meta(mut self, property: &str, content: &str) -> Self {
        self.meta.insert(property.to_string(), content.to_string());
        self
    }

    /// 添加元素，句柄即添加顺序
    pub fn with(self, element: FakeElement) -> Self {
        self.state.lock().unwrap().elements.push(element);
        self
    }

    pub fn handle(idx: usize) -> ElementHandle {
        ElementHandle(idx as u64)
    }

    pub fn ops(&self) -> Vec<(usize, DomOp)> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn ops_on(&self, idx: usize) -> Vec<DomOp> {
        self.ops()
            .into_iter()
            .filter(|(i, _)| *i == idx)
            .map(|(_, op)| op)
            .collect()
    }

    pub fn value_of(&self, idx: usize) -> String {
        self.state.lock().unwrap().elements[idx].value.clone()
    }

    pub fn is_checked_at(&self, idx: usize) -> bool {
        self.state.lock().unwrap().elements[idx].checked
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().unwrap().queries
    }
}

#[async_trait]
impl PageHost for FakePage {
    async fn location(&self) -> AppResult<PageLocation> {
        Ok(self.location.clone())
    }

    async fn query(&self, locator: &Locator) -> AppResult<Option<ElementHandle>> {
        let mut state = self.state.lock().unwrap();
        state.queries += 1;
        Ok(state.matching(locator).first().map(|&i| FakePage::handle(i)))
    }

    async fn query_all(&self, locator: &Locator) -> AppResult<Vec<ElementHandle>> {
        let mut state = self.state.lock().unwrap();
        state.queries += 1;
        Ok(state.matching(locator).into_iter().map(FakePage::handle).collect())
    }

    async fn visibility(&self, element: ElementHandle) -> AppResult<ComputedVisibility> {
        let state = self.state.lock().unwrap();
        Ok(state.element(element)?.visibility.clone())
    }

    async fn text(&self, element: ElementHandle) -> AppResult<String> {
        let state = self.state.lock().unwrap();
        Ok(state.element(element)?.text.clone())
    }

    async fn meta_content(&self, property: &str) -> AppResult<Option<String>> {
        Ok(self.meta.get(property).cloned())
    }

    async fn is_checked(&self, element: ElementHandle) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.element(element)?.checked)
    }

    async fn perform(&self, element: ElementHandle, op: &DomOp) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.element(element)?.script_error {
            return Err(BrowserError::ScriptExecutionFailed {
                source: message.clone().into(),
            }
            .into());
        }
        let idx = element.0 as usize;
        state.ops.push((idx, op.clone()));
        match op {
            DomOp::Click => {
                state.clicked.push(idx);
                let el = &mut state.elements[idx];
                el.checked = !el.checked;
            }
            DomOp::ClearValue => state.elements[idx].value.clear(),
            DomOp::AssignValue(v) | DomOp::NativeSetValue(v) => {
                state.elements[idx].value = v.clone();
            }
            DomOp::SetFiles(file) => state.elements[idx].value = file.file_name.clone(),
            _ => {}
        }
        Ok(())
    }
}
