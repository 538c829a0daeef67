use chrono::{DateTime, Utc};

/// 从页面抽取的职位信息，每次页面加载重新抽取，不持久化
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub url: String,
    pub extracted_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

impl std::fmt::Display for JobPosting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = if self.title.is_empty() { "未知职位" } else { &self.title };
        let company = if self.company.is_empty() { "未知公司" } else { &self.company };
        write!(f, "{} @ {}", title, company)
    }
}
