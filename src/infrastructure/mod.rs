pub mod js_executor;
pub mod page_host;

#[cfg(test)]
pub mod fake_page;

pub use js_executor::JsExecutor;
pub use page_host::{
    ComputedVisibility, DomEvent, DomOp, ElementHandle, Locator, PageHost, PageLocation,
};
