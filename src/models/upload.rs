/// 解码后的简历文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// 上传步骤结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 平台没有上传配置
    NotConfigured,
    /// 没有存储的简历文件
    NoResumeFile,
    /// 上传控件未出现
    NoUploadTarget,
    /// 前置动作中的必需等待超时
    Aborted { reason: String },
    /// 已设置文件；`acknowledged` 为成功标识的等待结果，`None` 表示未配置标识
    Uploaded {
        file_name: String,
        acknowledged: Option<bool>,
    },
}

impl std::fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadOutcome::NotConfigured => write!(f, "平台未配置上传"),
            UploadOutcome::NoResumeFile => write!(f, "没有存储的简历文件"),
            UploadOutcome::NoUploadTarget => write!(f, "未找到上传控件"),
            UploadOutcome::Aborted { reason } => write!(f, "上传中止: {}", reason),
            UploadOutcome::Uploaded {
                file_name,
                acknowledged,
            } => match acknowledged {
                Some(true) => write!(f, "已上传 {} (平台已确认)", file_name),
                Some(false) => write!(f, "已上传 {} (未等到平台确认)", file_name),
                None => write!(f, "已上传 {}", file_name),
            },
        }
    }
}
