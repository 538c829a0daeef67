use ats_autofill::browser::connect_to_browser_and_page;
use ats_autofill::config::Config;
use ats_autofill::models::{
    load_registry, ExperienceEntry, FieldValue, JobPosting, ResumeFilePayload, StoredProfile,
    StoredResume,
};
use ats_autofill::services::{extract_years_of_experience, PlatformDetector, ProfileTailor};
use ats_autofill::utils::logging;
use ats_autofill::workflow::decode_resume_payload;
use ats_autofill::{App, Detection, TailorSettings};
use std::sync::Arc;

fn posting(description: &str) -> JobPosting {
    JobPosting {
        title: "Senior Platform Engineer".to_string(),
        company: "Acme".to_string(),
        description: description.to_string(),
        location: "Remote".to_string(),
        url: "https://jobs.lever.co/acme/123/apply".to_string(),
        extracted_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn test_builtin_registry_detection() {
    let registry = load_registry(None).await.expect("内置注册表应该合法");
    assert!(registry.len() >= 10);

    let detector = PlatformDetector::new(Arc::new(registry)).expect("URL 模式应该可以编译");

    let cases = [
        ("https://jobs.lever.co/acme/123/apply", Some("Lever")),
        ("https://jobs.lever.co/acme/123/thanks", None),
        ("https://boards.greenhouse.io/acme/jobs/42", Some("Greenhouse")),
        ("https://acme.wd5.myworkdayjobs.com/en-US/careers/job/x", Some("Workday")),
        ("https://jobs.ashbyhq.com/acme/abc/application", Some("Ashby")),
        ("https://example.com/careers", None),
    ];
    for (url, expected) in cases {
        assert_eq!(
            detector.detect(url).map(|p| p.name.as_str()),
            expected,
            "URL: {}",
            url
        );
    }
}

#[tokio::test]
async fn test_registry_file_override() {
    let path = std::env::temp_dir().join(format!("ats_registry_{}.toml", std::process::id()));
    tokio::fs::write(
        &path,
        r#"
version = 1

[[platforms]]
name = "Internal"
urls = ["*://careers.internal.test/*"]

[[platforms.fields]]
name = "email"
specs = ["input[name='email']"]
"#,
    )
    .await
    .unwrap();

    let registry = load_registry(path.to_str()).await.expect("自定义注册表应该合法");
    assert_eq!(registry.len(), 1);
    assert!(registry.get("Internal").is_some());

    tokio::fs::remove_file(&path).await.unwrap();

    let missing = load_registry(Some("/nonexistent/registry.toml")).await;
    assert!(missing.is_err());
}

#[test]
fn test_tailor_go_kubernetes_posting() {
    let resume = StoredResume {
        skills: vec![
            "Photoshop".to_string(),
            "Kubernetes".to_string(),
            "Go".to_string(),
        ],
        experience: vec![
            ExperienceEntry {
                title: "Designer".to_string(),
                description: "Brand design".to_string(),
                start_date: "2021-01".to_string(),
                ..Default::default()
            },
            ExperienceEntry {
                title: "Platform Engineer".to_string(),
                description: "Ran Go services on Kubernetes clusters".to_string(),
                start_date: "2017-03".to_string(),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let description = "We need 5+ years of Go and Kubernetes experience.";

    let tailored = ProfileTailor::new(TailorSettings::default()).tailor(
        &resume,
        &StoredProfile::default(),
        Some(&posting(description)),
    );

    assert_eq!(extract_years_of_experience(description), Some(5));
    assert!(tailored.keywords.contains(&"kubernetes".to_string()));
    // 分差在阈值内，按开始年份倒序
    assert_eq!(tailored.experience[0].title, "Designer");
    assert_eq!(tailored.skills.last().map(String::as_str), Some("Photoshop"));
    assert_eq!(
        tailored.value("skills"),
        Some(&FieldValue::text(tailored.skills.join(", ")))
    );
}

#[test]
fn test_decode_stored_resume() {
    let payload = ResumeFilePayload {
        file_name: "resume.pdf".to_string(),
        data: "data:application/pdf;base64,JVBERi0xLjc=".to_string(),
        mime_type: None,
    };
    let file = decode_resume_payload(&payload).expect("应该能够解码");
    assert_eq!(file.bytes, b"%PDF-1.7");
    assert_eq!(file.mime_type, "application/pdf");
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器连接
    let result = connect_to_browser_and_page(
        config.browser_debug_port,
        config.target_url.as_deref(),
        |_| true,
    )
    .await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_autofill_current_page() {
    // 初始化日志
    logging::init(true);

    // 加载配置：需要 TARGET_URL 指向一个申请页，RESUME_FILE 指向简历载荷
    let config = Config::from_env();

    let app = App::initialize(config).await.expect("初始化失败");
    let report = app.run().await.expect("自动填表失败");

    println!("识别结果: {:?}", report.detection);
    if let Detection::Ready { .. } = report.detection {
        let fill = report.fill.expect("应该有填写结果");
        println!("已填写 {}/{}", fill.filled_count, fill.total());
    }
}
