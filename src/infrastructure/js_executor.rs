//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，把 `PageHost` 的每个能力翻译成一段页面内脚本。
//! 元素句柄是页面内注册表 `window.__atsAutofill.handles` 的下标。

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::{AppResult, BrowserError};
use crate::infrastructure::page_host::{
    ComputedVisibility, DomEvent, DomOp, ElementHandle, Locator, PageHost, PageLocation,
};

/// 句柄注册表，所有脚本共用
const REGISTRY_PRELUDE: &str = r#"
const reg = (window.__atsAutofill = window.__atsAutofill || { handles: [] });
const keep = (node) => {
  let i = reg.handles.indexOf(node);
  if (i < 0) { reg.handles.push(node); i = reg.handles.length - 1; }
  return i;
};
const lookup = (h) => {
  const node = reg.handles[h];
  return node && node.isConnected ? node : null;
};
"#;

const QUERY_BODY: &str = r#"
let nodes = [];
try {
  if (args.xpath) {
    if (args.first) {
      const r = document.evaluate(args.expr, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null);
      if (r.singleNodeValue) nodes.push(r.singleNodeValue);
    } else {
      const snap = document.evaluate(args.expr, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
      for (let i = 0; i < snap.snapshotLength; i++) nodes.push(snap.snapshotItem(i));
    }
  } else if (args.first) {
    const node = document.querySelector(args.expr);
    if (node) nodes.push(node);
  } else {
    nodes = Array.from(document.querySelectorAll(args.expr));
  }
} catch (e) {
  return { handles: [], error: String(e) };
}
return { handles: nodes.filter((n) => n && n.nodeType === 1).map(keep) };
"#;

const ELEMENT_GUARD: &str = r#"
const el = lookup(args.handle);
if (!el) return { stale: true };
"#;

const VISIBILITY_BODY: &str = r#"
const s = window.getComputedStyle(el);
return { stale: false, value: {
  display: s.display,
  visibility: s.visibility,
  opacity: parseFloat(s.opacity || "1"),
  hasOffsetParent: el.offsetParent !== null,
} };
"#;

const TEXT_BODY: &str = r#"
return { stale: false, value: el.innerText || el.textContent || "" };
"#;

const CHECKED_BODY: &str = r#"
return { stale: false, value: !!el.checked };
"#;

const CLICK_BODY: &str = r#"
el.click();
return { stale: false };
"#;

const FOCUS_BODY: &str = r#"
if (typeof el.focus === "function") el.focus();
return { stale: false };
"#;

const BLUR_BODY: &str = r#"
if (typeof el.blur === "function") el.blur();
return { stale: false };
"#;

const ASSIGN_BODY: &str = r#"
el.value = args.value;
return { stale: false };
"#;

const NATIVE_SET_BODY: &str = r#"
const proto = el instanceof HTMLTextAreaElement
  ? HTMLTextAreaElement.prototype
  : el instanceof HTMLSelectElement
    ? HTMLSelectElement.prototype
    : el instanceof HTMLInputElement
      ? HTMLInputElement.prototype
      : null;
const desc = proto && Object.getOwnPropertyDescriptor(proto, "value");
if (desc && desc.set) { desc.set.call(el, args.value); } else { el.value = args.value; }
return { stale: false };
"#;

const DISPATCH_BODY: &str = r#"
const ev = new Event(args.name, { bubbles: true, cancelable: true });
if (args.programmatic) ev.simulated = true;
el.dispatchEvent(ev);
return { stale: false };
"#;

const KEY_BODY: &str = r#"
const init = { key: args.key, bubbles: true, cancelable: true };
if (args.code) init.code = args.code;
if (args.keyCode !== null) { init.keyCode = args.keyCode; init.which = args.keyCode; }
el.dispatchEvent(new KeyboardEvent(args.name, init));
return { stale: false };
"#;

const MOUSE_BODY: &str = r#"
el.dispatchEvent(new MouseEvent(args.name, { bubbles: true, cancelable: true, view: window }));
return { stale: false };
"#;

const SET_FILES_BODY: &str = r#"
const bin = atob(args.data);
const bytes = new Uint8Array(bin.length);
for (let i = 0; i < bin.length; i++) bytes[i] = bin.charCodeAt(i);
const file = new File([bytes], args.fileName, { type: args.mimeType });
const dt = new DataTransfer();
dt.items.add(file);
el.files = dt.files;
return { stale: false };
"#;

const LOCATION_BODY: &str = r#"
return { href: location.href, hostname: location.hostname, title: document.title || "" };
"#;

const META_BODY: &str = r#"
const meta = Array.from(document.querySelectorAll("meta")).find(
  (m) => m.getAttribute("property") === args.property || m.getAttribute("name") === args.property
);
return { value: meta ? meta.getAttribute("content") : null };
"#;

#[derive(Debug, Deserialize)]
struct QueryReply {
    handles: Vec<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElementReply<T> {
    stale: bool,
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct MetaReply {
    value: Option<String>,
}

/// 包装成立即执行的函数，`args` 以 JSON 字面量注入
fn script(body: &str, args: JsonValue) -> String {
    format!(
        "(() => {{\nconst args = {};\n{}\n{}\n}})()",
        args, REGISTRY_PRELUDE, body
    )
}

fn element_script(handle: ElementHandle, body: &str, mut args: JsonValue) -> String {
    args["handle"] = json!(handle.0);
    script(&format!("{}{}", ELEMENT_GUARD, body), args)
}

/// DOM 操作对应的脚本片段与参数
fn op_script(op: &DomOp) -> (&'static str, JsonValue) {
    match op {
        DomOp::Click => (CLICK_BODY, json!({})),
        DomOp::Focus => (FOCUS_BODY, json!({})),
        DomOp::Blur => (BLUR_BODY, json!({})),
        DomOp::ClearValue => (ASSIGN_BODY, json!({ "value": "" })),
        DomOp::AssignValue(value) => (ASSIGN_BODY, json!({ "value": value })),
        DomOp::NativeSetValue(value) => (NATIVE_SET_BODY, json!({ "value": value })),
        DomOp::Dispatch(DomEvent::Input { programmatic }) => (
            DISPATCH_BODY,
            json!({ "name": "input", "programmatic": programmatic }),
        ),
        DomOp::Dispatch(DomEvent::Change) => (
            DISPATCH_BODY,
            json!({ "name": "change", "programmatic": false }),
        ),
        DomOp::Key(opts) => (
            KEY_BODY,
            json!({
                "name": opts.event.as_dom_name(),
                "key": opts.key,
                "code": opts.code,
                "keyCode": opts.key_code,
            }),
        ),
        DomOp::Mouse(kind) => (MOUSE_BODY, json!({ "name": kind.as_dom_name() })),
        DomOp::SetFiles(file) => (
            SET_FILES_BODY,
            json!({
                "data": STANDARD.encode(&file.bytes),
                "fileName": file.file_name,
                "mimeType": file.mime_type,
            }),
        ),
    }
}

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力，并以此实现 `PageHost`
/// - 不认识平台 / 字段，不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    async fn query_handles(&self, locator: &Locator, first: bool) -> AppResult<Vec<ElementHandle>> {
        let args = json!({
            "expr": locator.raw(),
            "xpath": locator.is_xpath(),
            "first": first,
        });
        let reply: QueryReply = self.eval_as(script(QUERY_BODY, args)).await?;
        if let Some(error) = reply.error {
            // 语法错误的定位器等同于未命中
            tracing::debug!("定位器执行失败 {}: {}", locator, error);
        }
        Ok(reply.handles.into_iter().map(ElementHandle).collect())
    }

    async fn element_eval<T: DeserializeOwned>(
        &self,
        handle: ElementHandle,
        body: &str,
        args: JsonValue,
    ) -> AppResult<Option<T>> {
        let reply: ElementReply<T> = self.eval_as(element_script(handle, body, args)).await?;
        if reply.stale {
            return Err(BrowserError::StaleHandle { handle: handle.0 }.into());
        }
        Ok(reply.value)
    }
}

#[async_trait]
impl PageHost for JsExecutor {
    async fn location(&self) -> AppResult<PageLocation> {
        self.eval_as(script(LOCATION_BODY, json!({}))).await
    }

    async fn query(&self, locator: &Locator) -> AppResult<Option<ElementHandle>> {
        Ok(self.query_handles(locator, true).await?.into_iter().next())
    }

    async fn query_all(&self, locator: &Locator) -> AppResult<Vec<ElementHandle>> {
        self.query_handles(locator, false).await
    }

    async fn visibility(&self, element: ElementHandle) -> AppResult<ComputedVisibility> {
        let value = self
            .element_eval::<ComputedVisibility>(element, VISIBILITY_BODY, json!({}))
            .await?;
        Ok(value.unwrap_or_else(ComputedVisibility::hidden))
    }

    async fn text(&self, element: ElementHandle) -> AppResult<String> {
        let value = self
            .element_eval::<String>(element, TEXT_BODY, json!({}))
            .await?;
        Ok(value.unwrap_or_default())
    }

    async fn meta_content(&self, property: &str) -> AppResult<Option<String>> {
        let reply: MetaReply = self
            .eval_as(script(META_BODY, json!({ "property": property })))
            .await?;
        Ok(reply.value)
    }

    async fn is_checked(&self, element: ElementHandle) -> AppResult<bool> {
        let value = self
            .element_eval::<bool>(element, CHECKED_BODY, json!({}))
            .await?;
        Ok(value.unwrap_or(false))
    }

    async fn perform(&self, element: ElementHandle, op: &DomOp) -> AppResult<()> {
        let (body, args) = op_script(op);
        self.element_eval::<JsonValue>(element, body, args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResumeFile;

    #[test]
    fn test_script_embeds_args_as_json() {
        let js = script(QUERY_BODY, json!({ "expr": "input[name='a\"b']", "xpath": false }));
        assert!(js.starts_with("(() => {"));
        assert!(js.contains(r#""expr":"input[name='a\"b']""#));
        assert!(js.contains("window.__atsAutofill"));
    }

    #[test]
    fn test_set_files_args_are_base64() {
        let op = DomOp::SetFiles(ResumeFile {
            file_name: "cv.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        });
        let (body, args) = op_script(&op);
        assert_eq!(body, SET_FILES_BODY);
        assert_eq!(args["data"], "JVBERg==");
        assert_eq!(args["mimeType"], "application/pdf");
    }

    #[test]
    fn test_native_setter_only_for_form_controls() {
        let (body, args) = op_script(&DomOp::NativeSetValue("Ada".to_string()));
        assert_eq!(body, NATIVE_SET_BODY);
        assert_eq!(args["value"], "Ada");
        // 非表单控件不借用 HTMLInputElement 的 setter
        assert!(body.contains("el instanceof HTMLInputElement"));
        assert!(body.contains(": null;"));
        assert!(body.contains("else { el.value = args.value; }"));
    }

    #[test]
    fn test_element_script_guards_stale_handles() {
        let js = element_script(ElementHandle(7), CLICK_BODY, json!({}));
        assert!(js.contains(r#""handle":7"#));
        assert!(js.contains("if (!el) return { stale: true };"));
    }
}
