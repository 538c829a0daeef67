//! 简历定制服务 - 业务能力层
//!
//! 把简历、个人资料和职位信息合成为一张"字段名 → 值"的表，
//! 并按职位描述重新排列工作经历与技能。纯计算，不访问页面。

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use phf::phf_set;
use regex::Regex;
use tracing::debug;

use crate::config::TailorSettings;
use crate::models::{
    ExperienceEntry, FieldValue, JobPosting, StoredProfile, StoredResume, TailoredProfile,
};

/// 关键词上限
pub const MAX_KEYWORDS: usize = 50;

/// 长度大于 3 的常见虚词与招聘套话
static STOPWORDS: phf::Set<&'static str> = phf_set! {
    "about", "above", "across", "after", "again", "also", "able", "ability", "been",
    "being", "both", "could", "does", "doing", "each", "from", "have", "having", "here",
    "into", "just", "like", "more", "most", "must", "need", "needs", "only", "other",
    "over", "same", "should", "some", "such", "than", "that", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "under", "very", "were",
    "what", "when", "where", "which", "while", "will", "with", "within", "would",
    "your", "yours", "year", "years", "work", "working", "team", "role", "including",
    "strong", "well", "plus", "preferred", "required", "requirements",
    "responsibilities", "qualifications", "skills", "company", "join", "looking",
    "help", "using", "make", "based", "want", "ideal", "candidate", "great",
};

fn years_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*\+?\s*(?:years?|yrs?)\b").expect("years regex")
    })
}

fn state_zip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2}( \d{5})?$").expect("state regex"))
}

/// 职位描述关键词，按频次降序，同频保持首次出现顺序
///
/// 只有 ASCII 字母、数字和下划线构成词，其余字符都是分隔符。
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in lower.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
        if token.chars().count() <= 3 || STOPWORDS.contains(token) {
            continue;
        }
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token.to_string(), counts.len());
                counts.push((token.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(MAX_KEYWORDS);
    counts.into_iter().map(|(word, _)| word).collect()
}

/// 第一个 "N+ years" 形式的年限
pub fn extract_years_of_experience(text: &str) -> Option<u32> {
    years_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 逗号分隔的地点
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLocation {
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// `城市, 州[ 邮编][, 国家]`；第二段不是两位州代码时原样作为州 / 地区
pub fn parse_location(raw: &str) -> ParsedLocation {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let mut parsed = ParsedLocation {
        city: parts.first().copied().unwrap_or_default().to_string(),
        ..Default::default()
    };

    if let Some(second) = parts.get(1) {
        if state_zip_regex().is_match(second) {
            parsed.state = second[..2].to_uppercase();
            parsed.postal_code = second[2..].trim().to_string();
        } else {
            parsed.state = second.to_string();
        }
    }
    if let Some(third) = parts.get(2) {
        parsed.country = third.to_string();
    }
    parsed
}

fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[derive(Default)]
struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    fn text(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.0.insert(key.to_string(), FieldValue::Text(value));
        }
    }

    fn flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.0.insert(key.to_string(), FieldValue::Bool(v));
        }
    }

    fn number(&mut self, key: &str, value: Option<f64>) {
        if let Some(v) = value {
            self.0.insert(key.to_string(), FieldValue::Number(v));
        }
    }
}

/// 简历定制服务
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileTailor {
    settings: TailorSettings,
}

impl ProfileTailor {
    pub fn new(settings: TailorSettings) -> Self {
        Self { settings }
    }

    /// 按相关度排列经历；分差不超过阈值的视为并列，按开始年份倒序
    ///
    /// 两两规则不可传递。每轮取第一条没有其他剩余经历必须排在它前面的经历，
    /// 只有规则成环时才按原顺序取第一条。
    pub fn prioritize_experience(
        &self,
        experience: &[ExperienceEntry],
        keywords: &[String],
    ) -> Vec<ExperienceEntry> {
        let mut remaining: Vec<((i64, Option<i32>), &ExperienceEntry)> = experience
            .iter()
            .map(|entry| {
                let text = entry.searchable_text();
                let score = keywords.iter().filter(|k| text.contains(k.as_str())).count() as i64;
                ((score, entry.start_year()), entry)
            })
            .collect();

        let mut ordered = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let pick = (0..remaining.len())
                .find(|&i| {
                    !remaining
                        .iter()
                        .enumerate()
                        .any(|(j, (other, _))| j != i && self.precedes(other, &remaining[i].0))
                })
                .unwrap_or(0);
            ordered.push(remaining.remove(pick).1.clone());
        }
        ordered
    }

    /// `a` 是否必须排在 `b` 前面
    fn precedes(&self, a: &(i64, Option<i32>), b: &(i64, Option<i32>)) -> bool {
        if (a.0 - b.0).abs() <= self.settings.experience_tie_threshold {
            a.1.unwrap_or(i32::MIN) > b.1.unwrap_or(i32::MIN)
        } else {
            a.0 > b.0
        }
    }

    /// 出现在职位描述中的技能排在前面，其余保持原顺序
    pub fn prioritize_skills(&self, skills: &[String], description: &str) -> Vec<String> {
        let description = description.to_lowercase();
        let mut scored: Vec<(i64, &String)> = skills
            .iter()
            .map(|s| {
                let hit = !s.trim().is_empty() && description.contains(&s.trim().to_lowercase());
                (if hit { self.settings.skill_match_score } else { 0 }, s)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, s)| s.clone()).collect()
    }

    /// 合成字段表；没有职位描述时经历与技能保持原顺序
    pub fn tailor(
        &self,
        resume: &StoredResume,
        profile: &StoredProfile,
        posting: Option<&JobPosting>,
    ) -> TailoredProfile {
        let description = posting
            .filter(|p| p.has_description())
            .map(|p| p.description.as_str());

        let (keywords, experience, skills) = match description {
            Some(desc) => {
                let keywords = extract_keywords(desc);
                let experience = self.prioritize_experience(&resume.experience, &keywords);
                let skills = self.prioritize_skills(&resume.skills, desc);
                (keywords, experience, skills)
            }
            None => (Vec::new(), resume.experience.clone(), resume.skills.clone()),
        };

        let fields = self.build_fields(resume, profile, &skills);
        debug!(
            "定制完成: {} 个字段, {} 个关键词, {} 段经历, {} 项技能",
            fields.len(),
            keywords.len(),
            experience.len(),
            skills.len()
        );

        TailoredProfile {
            fields,
            experience,
            skills,
            keywords,
        }
    }

    fn build_fields(
        &self,
        resume: &StoredResume,
        profile: &StoredProfile,
        skills: &[String],
    ) -> BTreeMap<String, FieldValue> {
        let contact = &resume.contact;
        let mut name_parts = contact.name.split_whitespace();
        let name_first = name_parts.next().unwrap_or_default();
        let name_last = name_parts.last().unwrap_or_default();

        let first_name = first_non_empty(&[profile.first_name.as_str(), contact.first_name.as_str(), name_first]);
        let last_name = first_non_empty(&[profile.last_name.as_str(), contact.last_name.as_str(), name_last]);
        let joined = format!("{} {}", first_name, last_name);
        let full_name = first_non_empty(&[joined.as_str(), contact.name.as_str()]);

        let location = first_non_empty(&[profile.location.as_str(), contact.location.as_str()]);
        let parsed = parse_location(&location);
        let website = first_non_empty(&[profile.website.as_str(), contact.website.as_str()]);
        let current = resume.experience.first();
        let education = resume.education.first();

        let mut map = FieldMap::default();
        map.text("first_name", first_name);
        map.text("last_name", last_name);
        map.text("full_name", full_name);
        map.text("preferred_name", profile.preferred_name.as_str());
        map.text("email", first_non_empty(&[profile.email.as_str(), contact.email.as_str()]));
        map.text("phone", first_non_empty(&[profile.phone.as_str(), contact.phone.as_str()]));
        map.text("linkedin", first_non_empty(&[profile.linkedin.as_str(), contact.linkedin.as_str()]));
        map.text("github", first_non_empty(&[profile.github.as_str(), contact.github.as_str()]));
        map.text("portfolio", first_non_empty(&[profile.portfolio.as_str(), website.as_str()]));
        map.text("website", website);
        map.text("location", location.as_str());
        map.text("address", profile.address.as_str());
        map.text("city", first_non_empty(&[profile.city.as_str(), parsed.city.as_str()]));
        map.text("state", first_non_empty(&[profile.state.as_str(), parsed.state.as_str()]));
        map.text(
            "postal_code",
            first_non_empty(&[profile.postal_code.as_str(), parsed.postal_code.as_str()]),
        );
        map.text("country", first_non_empty(&[profile.country.as_str(), parsed.country.as_str()]));

        map.text(
            "current_company",
            first_non_empty(&[
                profile.current_company.as_str(),
                current.map(|e| e.company.as_str()).unwrap_or_default(),
            ]),
        );
        map.text(
            "current_title",
            first_non_empty(&[
                profile.current_title.as_str(),
                current.map(|e| e.title.as_str()).unwrap_or_default(),
            ]),
        );
        map.number(
            "years_of_experience",
            profile.years_of_experience.map(f64::from),
        );
        map.text("salary_expectation", profile.salary_expectation.as_str());
        map.text("notice_period", profile.notice_period.as_str());
        map.text("summary", resume.summary.as_str());
        map.text("skills", skills.join(", "));

        if let Some(edu) = education {
            map.text("school", edu.school.as_str());
            map.text("degree", edu.degree.as_str());
            map.text("field_of_study", edu.field_of_study.as_str());
            map.text("gpa", edu.gpa.as_str());
            map.number("graduation_year", edu.graduation_year().map(f64::from));
        }

        map.text("gender", profile.gender.as_str());
        map.text("race", profile.race.as_str());
        map.flag("hispanic_latino", profile.hispanic_latino);
        map.text("veteran_status", profile.veteran_status.as_str());
        map.text("disability_status", profile.disability_status.as_str());
        map.flag("authorized_to_work", profile.authorized_to_work);
        map.flag("requires_sponsorship", profile.requires_sponsorship);

        // 自定义问题不覆盖已解析字段
        for (key, value) in &profile.extra {
            let key = camel_to_snake(key);
            if map.0.contains_key(&key) {
                continue;
            }
            if let Some(v) = FieldValue::from_json(value) {
                map.0.insert(key, v);
            }
        }

        map.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EducationEntry, ResumeContact};
    use chrono::Utc;

    fn entry(title: &str, description: &str, start: &str) -> ExperienceEntry {
        ExperienceEntry {
            title: title.to_string(),
            description: description.to_string(),
            start_date: start.to_string(),
            ..Default::default()
        }
    }

    fn posting(description: &str) -> JobPosting {
        JobPosting {
            title: "Platform Engineer".to_string(),
            company: "Acme".to_string(),
            description: description.to_string(),
            location: String::new(),
            url: "https://jobs.lever.co/acme/1".to_string(),
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_go_kubernetes_scenario() {
        let text = "We need 5+ years of Go and Kubernetes experience";
        assert_eq!(extract_years_of_experience(text), Some(5));

        let keywords = extract_keywords(text);
        assert_eq!(keywords, vec!["kubernetes", "experience"]);
    }

    #[test]
    fn test_keywords_split_on_non_ascii() {
        // "Zürich" 在 ü 处断开，只剩 "rich"
        assert_eq!(extract_keywords("Zürich office, Zürich based"), vec!["rich", "office"]);
        assert!(extract_keywords("café résumé").is_empty());
    }

    #[test]
    fn test_keyword_properties() {
        let text = "Rust rust RUST tokio tokio async systems with the and for ".repeat(3)
            + &(0..80).map(|i| format!("word{:03} ", i)).collect::<String>();
        let first = extract_keywords(&text);
        assert_eq!(first, extract_keywords(&text));
        assert!(first.len() <= MAX_KEYWORDS);
        assert_eq!(&first[..4], &["rust", "tokio", "async", "systems"]);
        for k in &first {
            assert!(k.chars().count() > 3, "{}", k);
            assert!(!STOPWORDS.contains(k.as_str()), "{}", k);
        }
    }

    #[test]
    fn test_years_first_match_wins() {
        assert_eq!(extract_years_of_experience("3 yrs Python, 10+ years total"), Some(3));
        assert_eq!(extract_years_of_experience("no requirement"), None);
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(
            parse_location("San Francisco, CA 94105, USA"),
            ParsedLocation {
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                postal_code: "94105".to_string(),
                country: "USA".to_string(),
            }
        );
        let berlin = parse_location("Berlin, Berlin State");
        assert_eq!(berlin.state, "Berlin State");
        assert_eq!(berlin.postal_code, "");
        assert_eq!(parse_location("Remote").city, "Remote");
    }

    #[test]
    fn test_experience_ties_prefer_recent() {
        let keywords: Vec<String> = (0..12).map(|i| format!("kw{}", i)).collect();
        let ten = keywords[..10].join(" ");
        let eight = keywords[..8].join(" ");

        let a = entry("A", &ten, "2015");
        let b = entry("B", &eight, "2020");
        let c = entry("C", "nothing relevant", "2022");

        let ordered = ProfileTailor::default().prioritize_experience(&[a, b, c], &keywords);
        let titles: Vec<_> = ordered.iter().map(|e| e.title.as_str()).collect();
        // A/B 分差 2 视为并列，按开始年份；C 分差超过阈值
        assert_eq!(titles, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_experience_threshold_is_configurable() {
        let keywords: Vec<String> = (0..12).map(|i| format!("kw{}", i)).collect();
        let a = entry("A", &keywords[..10].join(" "), "2015");
        let b = entry("B", &keywords[..8].join(" "), "2020");

        let strict = ProfileTailor::new(TailorSettings {
            experience_tie_threshold: 0,
            ..Default::default()
        });
        let ordered = strict.prioritize_experience(&[a, b], &keywords);
        assert_eq!(ordered[0].title, "A");
    }

    fn scored(rows: &[(&'static str, usize, &'static str)]) -> (Vec<ExperienceEntry>, Vec<String>) {
        let keywords: Vec<String> = (0..20).map(|i| format!("kw{:02}", i)).collect();
        let entries = rows
            .iter()
            .map(|(title, score, start)| entry(title, &keywords[..*score].join(" "), start))
            .collect();
        (entries, keywords)
    }

    #[test]
    fn test_experience_respects_indirect_order() {
        // Y 领先 K 超过阈值，K 与 P 并列但更新；Y 与 P 并列且同年
        let (entries, keywords) = scored(&[("P", 3, "2020"), ("Y", 8, "2020"), ("K", 2, "2021")]);
        let ordered = ProfileTailor::default().prioritize_experience(&entries, &keywords);
        let titles: Vec<_> = ordered.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Y", "K", "P"]);
    }

    #[test]
    fn test_experience_no_pair_out_of_order() {
        let rows = [
            ("E1", 3, "2020"),
            ("E2", 8, "2020"),
            ("E3", 2, "2021"),
            ("E4", 15, "2010"),
            ("E5", 9, "2023"),
        ];
        let (entries, keywords) = scored(&rows);
        let tailor = ProfileTailor::default();
        let ordered = tailor.prioritize_experience(&entries, &keywords);

        let key = |title: &str| {
            let (_, score, start) = rows.iter().find(|r| r.0 == title).unwrap();
            (*score as i64, start.parse::<i32>().ok())
        };
        for i in 0..ordered.len() {
            for j in i + 1..ordered.len() {
                let (earlier, later) = (key(&ordered[i].title), key(&ordered[j].title));
                assert!(
                    !tailor.precedes(&later, &earlier),
                    "{} 应排在 {} 前面",
                    ordered[j].title,
                    ordered[i].title
                );
            }
        }
        let titles: Vec<_> = ordered.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["E4", "E5", "E2", "E3", "E1"]);
    }

    #[test]
    fn test_skills_are_stable_permutation() {
        let skills: Vec<String> = ["Java", "Go", "Kubernetes", "Python", "Terraform"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ordered =
            ProfileTailor::default().prioritize_skills(&skills, "terraform and kubernetes on aws");
        assert_eq!(ordered, vec!["Kubernetes", "Terraform", "Java", "Go", "Python"]);

        let mut sorted_in = skills.clone();
        let mut sorted_out = ordered.clone();
        sorted_in.sort();
        sorted_out.sort();
        assert_eq!(sorted_in, sorted_out);
    }

    #[test]
    fn test_tailor_prefers_profile_overrides() {
        let resume = StoredResume {
            contact: ResumeContact {
                name: "Ada King Lovelace".to_string(),
                email: "ada@resume.dev".to_string(),
                location: "London, Greater London, UK".to_string(),
                ..Default::default()
            },
            experience: vec![ExperienceEntry {
                company: "Analytical Engines".to_string(),
                title: "Engineer".to_string(),
                ..Default::default()
            }],
            education: vec![EducationEntry {
                school: "Home".to_string(),
                end_date: "2015".to_string(),
                ..Default::default()
            }],
            skills: vec!["Math".to_string(), "Go".to_string()],
            ..Default::default()
        };
        let mut profile = StoredProfile {
            email: "ada@profile.dev".to_string(),
            authorized_to_work: Some(false),
            ..Default::default()
        };
        profile
            .extra
            .insert("howDidYouHear".to_string(), serde_json::json!("Referral"));

        let tailored = ProfileTailor::default().tailor(&resume, &profile, Some(&posting("Go services")));
        let text = |k: &str| tailored.value(k).map(|v| v.as_text());

        assert_eq!(text("first_name").as_deref(), Some("Ada"));
        assert_eq!(text("last_name").as_deref(), Some("Lovelace"));
        assert_eq!(text("email").as_deref(), Some("ada@profile.dev"));
        assert_eq!(text("city").as_deref(), Some("London"));
        assert_eq!(text("state").as_deref(), Some("Greater London"));
        assert_eq!(text("country").as_deref(), Some("UK"));
        assert_eq!(text("current_company").as_deref(), Some("Analytical Engines"));
        assert_eq!(text("graduation_year").as_deref(), Some("2015"));
        assert_eq!(text("skills").as_deref(), Some("Go, Math"));
        assert_eq!(text("how_did_you_hear").as_deref(), Some("Referral"));
        assert_eq!(tailored.value("authorized_to_work"), Some(&FieldValue::Bool(false)));
        assert!(tailored.value("phone").is_none());
    }

    #[test]
    fn test_no_description_passes_through() {
        let resume = StoredResume {
            skills: vec!["B".to_string(), "A".to_string()],
            experience: vec![entry("old", "", "2010"), entry("new", "", "2020")],
            ..Default::default()
        };
        let tailored = ProfileTailor::default().tailor(&resume, &StoredProfile::default(), None);
        assert_eq!(tailored.skills, resume.skills);
        assert_eq!(tailored.experience, resume.experience);
        assert!(tailored.keywords.is_empty());
    }
}
