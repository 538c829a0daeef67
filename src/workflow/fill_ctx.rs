//! 字段处理上下文
//!
//! 封装"我正在处理哪个平台的第几个字段"这一信息

use std::fmt::Display;

/// 字段处理上下文，仅用于日志
#[derive(Debug, Clone)]
pub struct FieldCtx {
    /// 平台名称
    pub platform: String,

    /// 字段在平台配置中的序号（从1开始）
    pub field_index: usize,

    /// 字段名
    pub field: String,
}

impl FieldCtx {
    pub fn new(platform: impl Into<String>, field_index: usize, field: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            field_index,
            field: field.into(),
        }
    }
}

impl Display for FieldCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[平台 {} 字段#{} {}]",
            self.platform, self.field_index, self.field
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = FieldCtx::new("Lever", 3, "first_name");
        assert_eq!(ctx.to_string(), "[平台 Lever 字段#3 first_name]");
    }
}
