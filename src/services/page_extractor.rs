//! 职位信息抽取服务 - 业务能力层
//!
//! 尽力而为：平台选择器 → 通用选择器 → meta / 文档标题 → URL 结构，
//! 全部失败时返回空字符串，从不报错。

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::AppResult;
use crate::infrastructure::PageHost;
use crate::models::{JobPosting, PlatformConfig};
use crate::services::element_locator::ElementLocator;

/// 职位描述最大字符数
pub const MAX_DESCRIPTION_CHARS: usize = 5_000;

const COMMON_TITLE: &[&str] = &[
    "h1.job-title",
    ".job-title",
    "[class*='job-title']",
    "[data-testid*='job-title']",
    "[itemprop='title']",
    "h1",
];

const COMMON_COMPANY: &[&str] = &[
    ".company-name",
    "[class*='company-name']",
    "[data-testid*='company']",
    "[itemprop='hiringOrganization'] [itemprop='name']",
];

const COMMON_DESCRIPTION: &[&str] = &[
    ".job-description",
    "#job-description",
    "[class*='job-description']",
    "[itemprop='description']",
    "[class*='description']",
    "article",
];

const COMMON_LOCATION: &[&str] = &[
    ".job-location",
    ".location",
    "[class*='location']",
    "[itemprop='jobLocation']",
];

/// 文档标题中会被去掉的平台名后缀
const ATS_LABELS: &[&str] = &[
    "greenhouse",
    "lever",
    "workday",
    "ashby",
    "ashbyhq",
    "smartrecruiters",
    "workable",
    "icims",
    "bamboohr",
    "jobvite",
    "taleo",
    "careers",
    "jobs",
    "job board",
];

/// 公司名在 URL 路径第一段的站点
const PATH_COMPANY_HOSTS: &[&str] = &[
    "jobs.lever.co",
    "boards.greenhouse.io",
    "job-boards.greenhouse.io",
    "jobs.ashbyhq.com",
    "apply.workable.com",
    "jobs.smartrecruiters.com",
    "careers.smartrecruiters.com",
    "jobs.jobvite.com",
];

/// 公司名在子域名的站点
const SUBDOMAIN_COMPANY_SUFFIXES: &[&str] = &[
    ".myworkdayjobs.com",
    ".myworkdaysite.com",
    ".bamboohr.com",
    ".icims.com",
    ".taleo.net",
];

fn title_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+[|\-–—·]\s+").expect("title separator regex"))
}

/// 折叠空白
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 折叠空白并截断到 `MAX_DESCRIPTION_CHARS`
pub fn normalize_description(raw: &str) -> String {
    let text = normalize_text(raw);
    match text.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

fn is_ats_label(segment: &str) -> bool {
    let lower = segment.trim().to_lowercase();
    ATS_LABELS.iter().any(|label| lower == *label)
        || lower.ends_with(" careers")
        || lower.ends_with(" jobs")
}

/// 清理文档标题，返回 (职位名, "at 公司" 中的公司)
pub fn clean_document_title(raw: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = title_separator()
        .split(raw.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_ats_label(s))
        .collect();

    let Some(&head) = segments.first() else {
        return (String::new(), None);
    };

    let head = ["Job Application for ", "Application for ", "Apply for "]
        .iter()
        .find_map(|prefix| {
            head.get(..prefix.len())
                .filter(|p| p.eq_ignore_ascii_case(prefix))
                .map(|_| &head[prefix.len()..])
        })
        .unwrap_or(head);

    match head.rfind(" at ") {
        Some(idx) => {
            let company = head[idx + 4..].trim();
            (
                head[..idx].trim().to_string(),
                (!company.is_empty()).then(|| company.to_string()),
            )
        }
        None => (head.to_string(), None),
    }
}

fn title_case(slug: &str) -> String {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 从已知平台的 URL 结构推断公司名
pub fn company_from_url(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?.to_lowercase();

    let slug = if PATH_COMPANY_HOSTS.contains(&host.as_str()) {
        url.path_segments()?.find(|s| !s.is_empty())?.to_string()
    } else if SUBDOMAIN_COMPANY_SUFFIXES.iter().any(|s| host.ends_with(s)) {
        let label = host.split('.').next()?;
        label.strip_prefix("careers-").unwrap_or(label).to_string()
    } else {
        return None;
    };

    let name = title_case(&slug);
    (!name.is_empty()).then_some(name)
}

/// 职位信息抽取服务
#[derive(Debug, Clone, Copy, Default)]
pub struct PageDataExtractor {
    locator: ElementLocator,
}

impl PageDataExtractor {
    pub fn new(locator: ElementLocator) -> Self {
        Self { locator }
    }

    /// 抽取职位信息，页面访问失败时对应项为空
    pub async fn extract(&self, page: &dyn PageHost, platform: &PlatformConfig) -> JobPosting {
        let location = match page.location().await {
            Ok(loc) => loc,
            Err(e) => {
                debug!("读取页面位置失败: {}", e);
                Default::default()
            }
        };
        let (title_from_doc, company_from_doc) = clean_document_title(&location.title);

        let mut title = self.first_text(page, &platform.extract.title, COMMON_TITLE).await;
        if title.is_empty() {
            title = title_from_doc;
        }

        let mut company = self
            .first_text(page, &platform.extract.company, COMMON_COMPANY)
            .await;
        if company.is_empty() {
            company = self.meta_site_name(page).await.unwrap_or_default();
        }
        if company.is_empty() {
            company = company_from_doc.unwrap_or_default();
        }
        if company.is_empty() {
            company = company_from_url(&location.href).unwrap_or_default();
        }

        let description = normalize_description(
            &self
                .first_text(page, &platform.extract.description, COMMON_DESCRIPTION)
                .await,
        );
        let job_location = self
            .first_text(page, &platform.extract.location, COMMON_LOCATION)
            .await;

        let posting = JobPosting {
            title,
            company,
            description,
            location: job_location,
            url: location.href,
            extracted_at: Utc::now(),
        };
        debug!(
            "抽取职位信息: {} (描述 {} 字符)",
            posting,
            posting.description.chars().count()
        );
        posting
    }

    async fn meta_site_name(&self, page: &dyn PageHost) -> Option<String> {
        match page.meta_content("og:site_name").await {
            Ok(v) => v.map(|s| normalize_text(&s)).filter(|s| !s.is_empty()),
            Err(e) => {
                debug!("读取 og:site_name 失败: {}", e);
                None
            }
        }
    }

    /// 平台选择器优先，其次通用选择器；第一个非空文本胜出
    async fn first_text(&self, page: &dyn PageHost, configured: &[String], common: &[&str]) -> String {
        let candidates = configured
            .iter()
            .map(String::as_str)
            .chain(common.iter().copied());
        for raw in candidates {
            match self.text_of(page, raw).await {
                Ok(Some(text)) => return text,
                Ok(None) => {}
                Err(e) => debug!("抽取 {} 失败: {}", raw, e),
            }
        }
        String::new()
    }

    async fn text_of(&self, page: &dyn PageHost, raw: &str) -> AppResult<Option<String>> {
        let Some(el) = self.locator.find(page, raw).await? else {
            return Ok(None);
        };
        let text = normalize_text(&page.text(el).await?);
        Ok((!text.is_empty()).then_some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake_page::{FakeElement, FakePage};
    use crate::models::PlatformRegistry;

    fn lever() -> PlatformConfig {
        PlatformRegistry::builtin().unwrap().get("Lever").unwrap().clone()
    }

    #[test]
    fn test_clean_document_title() {
        assert_eq!(
            clean_document_title("Job Application for Backend Engineer at Acme | Greenhouse"),
            ("Backend Engineer".to_string(), Some("Acme".to_string()))
        );
        assert_eq!(
            clean_document_title("Senior SRE - Lever"),
            ("Senior SRE".to_string(), None)
        );
        assert_eq!(clean_document_title("Workday"), (String::new(), None));
    }

    #[test]
    fn test_company_from_url_shapes() {
        assert_eq!(
            company_from_url("https://jobs.lever.co/acme-corp/123").as_deref(),
            Some("Acme Corp")
        );
        assert_eq!(
            company_from_url("https://boards.greenhouse.io/initech/jobs/42").as_deref(),
            Some("Initech")
        );
        assert_eq!(
            company_from_url("https://globex.wd5.myworkdayjobs.com/en-US/External").as_deref(),
            Some("Globex")
        );
        assert_eq!(company_from_url("https://example.com/jobs/1"), None);
        assert_eq!(company_from_url("not a url"), None);
    }

    #[test]
    fn test_description_is_collapsed_and_capped() {
        let raw = format!("  a \n\n b\t{}", "x".repeat(MAX_DESCRIPTION_CHARS * 2));
        let desc = normalize_description(&raw);
        assert!(desc.starts_with("a b x"));
        assert_eq!(desc.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[tokio::test]
    async fn test_extract_uses_platform_selectors_then_fallbacks() {
        let page = FakePage::new("https://jobs.lever.co/acme/123")
            .with_title("Acme - Platform Engineer")
            .with(FakeElement::new(&[".posting-headline h2"]).text("  Platform\nEngineer "))
            .with(FakeElement::new(&["[data-qa='job-description']"]).text("Go and   Kubernetes"));

        let posting = PageDataExtractor::default().extract(&page, &lever()).await;
        assert_eq!(posting.title, "Platform Engineer");
        assert_eq!(posting.description, "Go and Kubernetes");
        // 没有公司选择器命中，也没有 og:site_name，退到 URL
        assert_eq!(posting.company, "Acme");
        assert_eq!(posting.location, "");
        assert_eq!(posting.url, "https://jobs.lever.co/acme/123");
    }

    #[tokio::test]
    async fn test_extract_prefers_site_name_meta() {
        let page = FakePage::new("https://jobs.lever.co/acme/123")
            .with_meta("og:site_name", "Acme Robotics");
        let posting = PageDataExtractor::default().extract(&page, &lever()).await;
        assert_eq!(posting.company, "Acme Robotics");
        assert!(posting.title.is_empty());
    }
}
