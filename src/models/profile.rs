//! 简历 / 个人资料数据模型
//!
//! `StoredResume` 与 `StoredProfile` 由持久化协作方以 JSON 形式提供，
//! 本模块只负责反序列化，不做任何持久化。

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 简历中的联系方式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeContact {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

/// 工作经历
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub highlights: Vec<String>,
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year regex"))
}

impl ExperienceEntry {
    /// 开始年份；无法解析时为 `None`
    pub fn start_year(&self) -> Option<i32> {
        year_regex()
            .find(&self.start_date)
            .and_then(|m| m.as_str().parse().ok())
    }

    /// 用于相关度评分的文本（标题 + 描述 + 要点），小写
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.description);
        for h in &self.highlights {
            text.push(' ');
            text.push_str(h);
        }
        text.to_lowercase()
    }
}

/// 教育经历
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
}

impl EducationEntry {
    pub fn graduation_year(&self) -> Option<i32> {
        year_regex()
            .find(&self.end_date)
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// 存储的简历文件（base64，可带 data URL 头）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeFilePayload {
    pub file_name: String,
    pub data: String,
    pub mime_type: Option<String>,
}

/// 存储的简历
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredResume {
    pub contact: ResumeContact,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub file: Option<ResumeFilePayload>,
}

/// 存储的个人资料：显式覆盖项 + EEO / 工作许可
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredProfile {
    pub first_name: String,
    pub last_name: String,
    pub preferred_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
    pub website: String,
    pub current_company: String,
    pub current_title: String,
    pub salary_expectation: String,
    pub notice_period: String,
    pub years_of_experience: Option<u32>,
    // --- EEO ---
    pub gender: String,
    pub race: String,
    pub hispanic_latino: Option<bool>,
    pub veteran_status: String,
    pub disability_status: String,
    // --- 工作许可 ---
    pub authorized_to_work: Option<bool>,
    pub requires_sponsorship: Option<bool>,
    /// 平台自定义问题等其他字段，原样透传
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// 表单字段值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// 是否值得填写：只有空字符串视为缺失，空白、`0` / `false` 都是有效值
    pub fn is_fillable(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Number(n) => !n.is_nan(),
            FieldValue::Bool(_) => true,
        }
    }

    /// 复选框语义下的真值：`true` / `"true"` / `"1"` / `"yes"`
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n == 1.0,
            FieldValue::Text(s) => {
                matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
            }
        }
    }

    /// 写入输入框时使用的文本
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
        }
    }

    /// 从任意 JSON 值转换；数组 / 对象 / null 不可填写
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(FieldValue::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(FieldValue::Number),
            JsonValue::String(s) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// 按职位定制后的资料，每次运行重新计算，不持久化
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailoredProfile {
    pub fields: BTreeMap<String, FieldValue>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
}

impl TailoredProfile {
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}
