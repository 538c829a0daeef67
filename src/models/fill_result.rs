use serde::Serialize;

/// 字段跳过原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// 资料中没有值
    NoValue,
    /// 所有候选定位器都未命中
    NoElement,
    /// 找到元素但动作序列中的必需等待超时
    ActionAborted(String),
}

/// 单个字段的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum FieldOutcome {
    Filled { locator: String },
    Skipped { cause: SkipReason },
}

impl FieldOutcome {
    pub fn skipped(cause: SkipReason) -> Self {
        FieldOutcome::Skipped { cause }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, FieldOutcome::Filled { .. })
    }
}

/// 字段报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: String,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
}

/// 表单填写结果，只用于展示
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFillResult {
    pub filled_count: usize,
    pub skip_count: usize,
    #[serde(skip)]
    pub fields: Vec<FieldReport>,
}

impl FormFillResult {
    pub fn record(&mut self, field: impl Into<String>, outcome: FieldOutcome) {
        if outcome.is_filled() {
            self.filled_count += 1;
        } else {
            self.skip_count += 1;
        }
        self.fields.push(FieldReport {
            field: field.into(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.filled_count + self.skip_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut result = FormFillResult::default();
        result.record("first_name", FieldOutcome::Filled { locator: "#a".into() });
        result.record("phone", FieldOutcome::skipped(SkipReason::NoValue));
        result.record("state", FieldOutcome::skipped(SkipReason::NoElement));
        assert_eq!(result.filled_count, 1);
        assert_eq!(result.skip_count, 2);
        assert_eq!(result.total(), 3);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"filledCount": 1, "skipCount": 2}));
    }
}
