//! 简历上传流程 - 流程层
//!
//! 流程顺序：
//! 1. 解码存储的 base64 简历（可带 data URL 头）
//! 2. 执行平台声明的前置动作
//! 3. 等待文件输入框出现，通过 DataTransfer 设置文件并派发 input / change
//! 4. 等待成功标识（未出现只记警告）

use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{info, warn};

use crate::error::{AppResult, UploadError};
use crate::infrastructure::{DomEvent, DomOp, PageHost};
use crate::models::{
    FillMethod, PlatformConfig, ResumeFile, ResumeFilePayload, StoredResume, UploadOutcome,
};
use crate::services::{ActionExecutor, SequenceOutcome, SequenceScope};

/// 没有文件名时使用的名称
const FALLBACK_FILE_NAME: &str = "resume";

/// 按扩展名推断 MIME 类型
pub fn infer_mime_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        "odt" => "application/vnd.oasis.opendocument.text",
        _ => "application/octet-stream",
    }
}

/// 拆分 `data:<mime>;base64,<data>`，返回 (头部中的 MIME, base64 正文)
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let trimmed = data.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (None, trimmed);
    };
    match rest.split_once(',') {
        Some((header, body)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, body)
        }
        None => (None, rest),
    }
}

/// 解码存储的简历文件
///
/// MIME 优先级：载荷显式声明 > data URL 头 > 扩展名推断
pub fn decode_resume_payload(payload: &ResumeFilePayload) -> AppResult<ResumeFile> {
    let file_name = if payload.file_name.trim().is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        payload.file_name.trim().to_string()
    };

    let (header_mime, body) = split_data_url(&payload.data);
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| UploadError::DecodeFailed {
            file_name: file_name.clone(),
            source,
        })?;
    if bytes.is_empty() {
        return Err(UploadError::EmptyFile { file_name }.into());
    }

    let mime_type = payload
        .mime_type
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .or(header_mime)
        .unwrap_or_else(|| infer_mime_type(&file_name))
        .to_string();

    Ok(ResumeFile {
        file_name,
        mime_type,
        bytes,
    })
}

/// 简历上传流程
pub struct FileUploadCoordinator {
    executor: ActionExecutor,
    success_timeout: Duration,
}

impl FileUploadCoordinator {
    pub fn new(executor: ActionExecutor, success_timeout: Duration) -> Self {
        Self {
            executor,
            success_timeout,
        }
    }

    /// 上传简历；解码失败返回错误，其余情况都以 `UploadOutcome` 表示
    pub async fn upload(
        &self,
        page: &dyn PageHost,
        platform: &PlatformConfig,
        resume: &StoredResume,
    ) -> AppResult<UploadOutcome> {
        let Some(config) = &platform.upload else {
            return Ok(UploadOutcome::NotConfigured);
        };
        let Some(payload) = &resume.file else {
            return Ok(UploadOutcome::NoResumeFile);
        };
        let file = decode_resume_payload(payload)?;
        info!(
            "[平台 {}] 📎 准备上传 {} ({}, {} 字节)",
            platform.name,
            file.file_name,
            file.mime_type,
            file.bytes.len()
        );

        if !config.pre_actions.is_empty() {
            let scope = SequenceScope {
                base_locator: config.locators.first().map(String::as_str).unwrap_or_default(),
                value: &file.file_name,
                method: FillMethod::PlainSet,
            };
            let outcome = self
                .executor
                .run_sequence(page, scope, None, &config.pre_actions)
                .await?;
            if let SequenceOutcome::Aborted { step, reason } = outcome {
                warn!("[平台 {}] 上传前置动作 #{} 失败: {}", platform.name, step, reason);
                return Ok(UploadOutcome::Aborted {
                    reason: format!("前置动作 #{}: {}", step, reason),
                });
            }
        }

        let locator = self.executor.locator();
        let Some(input) = locator
            .wait_for(page, &config.locators, config.locate_timeout)
            .await?
        else {
            warn!("[平台 {}] 未找到上传控件", platform.name);
            return Ok(UploadOutcome::NoUploadTarget);
        };

        let file_name = file.file_name.clone();
        page.perform(input.handle, &DomOp::SetFiles(file)).await?;
        page.perform(input.handle, &DomOp::Dispatch(DomEvent::Input { programmatic: false }))
            .await?;
        page.perform(input.handle, &DomOp::Dispatch(DomEvent::Change))
            .await?;

        let acknowledged = if config.success.is_empty() {
            None
        } else {
            let seen = locator
                .wait_for(page, &config.success, self.success_timeout)
                .await?
                .is_some();
            if !seen {
                warn!(
                    "[平台 {}] ⚠️ {:?} 内未等到上传成功标识",
                    platform.name, self.success_timeout
                );
            }
            Some(seen)
        };

        let outcome = UploadOutcome::Uploaded {
            file_name,
            acknowledged,
        };
        info!("[平台 {}] {}", platform.name, outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake_page::{FakeElement, FakePage};
    use crate::models::PlatformRegistry;
    use crate::services::ElementLocator;

    const REGISTRY: &str = r##"
version = 1

[[platforms]]
name = "Acme"
urls = ["*://jobs.acme.test/*"]

[platforms.upload]
locators = ["#resume"]
success = [".file-name"]
locate_timeout_ms = 20

[[platforms.upload.pre_actions]]
type = "click"
target = "#remove-existing"
allow_failure = true
"##;

    fn platform() -> PlatformConfig {
        PlatformRegistry::from_toml_str(REGISTRY)
            .unwrap()
            .get("Acme")
            .unwrap()
            .clone()
    }

    fn coordinator() -> FileUploadCoordinator {
        FileUploadCoordinator::new(
            ActionExecutor::new(ElementLocator::new(Duration::from_millis(5))),
            Duration::from_millis(20),
        )
    }

    fn resume_with(data: String, file_name: &str) -> StoredResume {
        StoredResume {
            file: Some(ResumeFilePayload {
                file_name: file_name.to_string(),
                data,
                mime_type: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_data_url_keeps_bytes_and_mime() {
        let bytes = b"%PDF-1.7 fake resume".to_vec();
        let payload = ResumeFilePayload {
            file_name: "cv.bin".to_string(),
            data: format!("data:application/pdf;base64,{}", STANDARD.encode(&bytes)),
            mime_type: None,
        };

        let file = decode_resume_payload(&payload).unwrap();
        assert_eq!(file.bytes, bytes);
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.file_name, "cv.bin");
    }

    #[test]
    fn test_decode_plain_base64_infers_mime() {
        let encoded = STANDARD.encode(b"docx bytes");
        // 换行分段的 base64 也能解码
        let wrapped = format!("{}\n{}", &encoded[..4], &encoded[4..]);
        let payload = ResumeFilePayload {
            file_name: "Resume.DOCX".to_string(),
            data: wrapped,
            mime_type: None,
        };
        let file = decode_resume_payload(&payload).unwrap();
        assert_eq!(file.bytes, b"docx bytes");
        assert_eq!(
            file.mime_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn test_decode_failures_are_upload_errors() {
        let bad = ResumeFilePayload {
            file_name: "cv.pdf".to_string(),
            data: "not base64!!".to_string(),
            mime_type: None,
        };
        assert!(decode_resume_payload(&bad).unwrap_err().is_upload_error());

        let empty = ResumeFilePayload {
            data: "data:application/pdf;base64,".to_string(),
            ..bad
        };
        assert!(decode_resume_payload(&empty).unwrap_err().is_upload_error());
    }

    #[tokio::test]
    async fn test_upload_sets_files_and_waits_for_ack() {
        let page = FakePage::new("https://jobs.acme.test/1")
            .with(FakeElement::new(&["#resume"]))
            .with(FakeElement::new(&[".file-name"]));
        let resume = resume_with(STANDARD.encode(b"pdf"), "cv.pdf");

        let outcome = coordinator().upload(&page, &platform(), &resume).await.unwrap();
        assert_eq!(
            outcome,
            UploadOutcome::Uploaded {
                file_name: "cv.pdf".to_string(),
                acknowledged: Some(true),
            }
        );

        let ops = page.ops_on(0);
        assert!(matches!(&ops[0], DomOp::SetFiles(f) if f.mime_type == "application/pdf"));
        assert_eq!(ops[2], DomOp::Dispatch(DomEvent::Change));
        assert_eq!(page.value_of(0), "cv.pdf");
    }

    #[tokio::test]
    async fn test_missing_ack_is_soft() {
        let page = FakePage::new("https://jobs.acme.test/1").with(FakeElement::new(&["#resume"]));
        let resume = resume_with(STANDARD.encode(b"pdf"), "cv.pdf");

        let outcome = coordinator().upload(&page, &platform(), &resume).await.unwrap();
        assert!(matches!(
            outcome,
            UploadOutcome::Uploaded {
                acknowledged: Some(false),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_upload_short_circuits() {
        let page = FakePage::new("https://jobs.acme.test/1");
        let coordinator = coordinator();

        let no_file = coordinator
            .upload(&page, &platform(), &StoredResume::default())
            .await
            .unwrap();
        assert_eq!(no_file, UploadOutcome::NoResumeFile);

        let resume = resume_with(STANDARD.encode(b"pdf"), "cv.pdf");
        let no_target = coordinator.upload(&page, &platform(), &resume).await.unwrap();
        assert_eq!(no_target, UploadOutcome::NoUploadTarget);

        let mut bare = platform();
        bare.upload = None;
        let not_configured = coordinator.upload(&page, &bare, &resume).await.unwrap();
        assert_eq!(not_configured, UploadOutcome::NotConfigured);
    }
}
