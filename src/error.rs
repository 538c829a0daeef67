use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器 / 页面相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 平台注册表错误
    #[error("注册表错误: {0}")]
    Registry(#[from] RegistryError),
    /// 简历 / 个人资料载荷错误
    #[error("载荷错误: {0}")]
    Payload(#[from] PayloadError),
    /// 简历上传错误
    #[error("上传错误: {0}")]
    Upload(#[from] UploadError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 运行流程错误
    #[error("运行错误: {0}")]
    Run(#[from] RunError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 没有可用页面
    #[error("没有找到可用的页面")]
    NoPage,
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 元素句柄已失效
    #[error("元素句柄 #{handle} 已失效")]
    StaleHandle { handle: u64 },
}

/// 平台注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    /// TOML 解析失败
    #[error("注册表解析失败: {source}")]
    ParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 版本不受支持
    #[error("不支持的注册表版本: {found} (支持: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    /// 平台定义不合法
    #[error("平台 {platform} 配置不合法: {reason}")]
    InvalidPlatform { platform: String, reason: String },
    /// 平台名称重复
    #[error("平台名称重复: {name}")]
    DuplicatePlatform { name: String },
    /// URL 模式无法编译
    #[error("URL 模式无法编译 ({pattern}): {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// 简历 / 个人资料载荷错误
#[derive(Debug, Error)]
pub enum PayloadError {
    /// 读取失败
    #[error("读取载荷失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
    /// 载荷缺失
    #[error("载荷缺失: {what}")]
    Missing { what: String },
}

/// 简历上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    /// Base64 解码失败
    #[error("简历文件解码失败 ({file_name}): {source}")]
    DecodeFailed {
        file_name: String,
        #[source]
        source: base64::DecodeError,
    },
    /// 解码后为空
    #[error("简历文件为空: {file_name}")]
    EmptyFile { file_name: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置项取值不合法
    #[error("配置项 {name} 不合法 ('{value}'): {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// 运行流程错误
#[derive(Debug, Error)]
pub enum RunError {
    /// 已有一次自动填表正在进行
    #[error("已有自动填表任务正在进行")]
    AlreadyRunning,
    /// 主机通信失败
    #[error("主机通信失败 ({message_type}): {reason}")]
    HostBridgeFailed {
        message_type: String,
        reason: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Payload(PayloadError::JsonParseFailed(err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Registry(RegistryError::ParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(format!("IO错误: {}", err))
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::Upload(UploadError::DecodeFailed {
            file_name: String::new(),
            source: err,
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Run(RunError::HostBridgeFailed {
            message_type: "http".to_string(),
            reason: err.to_string(),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建平台配置不合法错误
    pub fn invalid_platform(platform: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Registry(RegistryError::InvalidPlatform {
            platform: platform.into(),
            reason: reason.into(),
        })
    }

    /// 创建载荷读取错误
    pub fn payload_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Payload(PayloadError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建主机通信错误
    pub fn host_bridge_failed(message_type: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Run(RunError::HostBridgeFailed {
            message_type: message_type.into(),
            reason: reason.into(),
        })
    }

    /// 是否为上传步骤内部的错误（只中止上传步骤）
    pub fn is_upload_error(&self) -> bool {
        matches!(self, AppError::Upload(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_error() {
        let err = AppError::invalid_platform("Lever", "缺少 URL 模式");
        assert_eq!(
            err.to_string(),
            "注册表错误: 平台 Lever 配置不合法: 缺少 URL 模式"
        );
    }

    #[test]
    fn test_upload_error_classification() {
        let err = AppError::Upload(UploadError::EmptyFile {
            file_name: "cv.pdf".to_string(),
        });
        assert!(err.is_upload_error());
        assert!(!AppError::Run(RunError::AlreadyRunning).is_upload_error());
    }
}
