use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标URL（为空时从已打开的标签页中查找受支持的平台）
    pub target_url: Option<String>,
    /// 自定义平台注册表 TOML 文件（为空时使用内置注册表）
    pub registry_file: Option<String>,
    /// 简历载荷 JSON 文件
    pub resume_file: String,
    /// 个人资料载荷 JSON 文件
    pub profile_file: String,
    /// 投递跟踪接口（为空时只写日志）
    pub tracking_endpoint: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- 引擎参数 ---
    /// 元素轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 上传成功标识等待时间（毫秒）
    pub upload_success_timeout_ms: u64,
    /// 经历相关度视为并列的分差阈值
    pub experience_tie_threshold: i64,
    /// 技能命中职位描述时的得分
    pub skill_match_score: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: None,
            registry_file: None,
            resume_file: "data/resume.json".to_string(),
            profile_file: "data/profile.json".to_string(),
            tracking_endpoint: None,
            verbose_logging: false,
            output_log_file: "autofill.log".to_string(),
            poll_interval_ms: 100,
            upload_success_timeout_ms: 10_000,
            experience_tie_threshold: DEFAULT_EXPERIENCE_TIE_THRESHOLD,
            skill_match_score: DEFAULT_SKILL_MATCH_SCORE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").ok().filter(|v| !v.is_empty()).or(default.target_url),
            registry_file: std::env::var("REGISTRY_FILE").ok().filter(|v| !v.is_empty()).or(default.registry_file),
            resume_file: std::env::var("RESUME_FILE").unwrap_or(default.resume_file),
            profile_file: std::env::var("PROFILE_FILE").unwrap_or(default.profile_file),
            tracking_endpoint: std::env::var("TRACKING_ENDPOINT").ok().filter(|v| !v.is_empty()).or(default.tracking_endpoint),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_ms),
            upload_success_timeout_ms: std::env::var("UPLOAD_SUCCESS_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.upload_success_timeout_ms),
            experience_tie_threshold: std::env::var("EXPERIENCE_TIE_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.experience_tie_threshold),
            skill_match_score: std::env::var("SKILL_MATCH_SCORE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.skill_match_score),
        }
    }

    /// 检查取值是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(invalid("POLL_INTERVAL_MS", "0", "轮询间隔必须大于 0"));
        }
        if self.experience_tie_threshold < 0 {
            return Err(invalid(
                "EXPERIENCE_TIE_THRESHOLD",
                &self.experience_tie_threshold.to_string(),
                "阈值不能为负数",
            ));
        }
        if let Some(endpoint) = &self.tracking_endpoint {
            match url::Url::parse(endpoint) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => {}
                Ok(_) => return Err(invalid("TRACKING_ENDPOINT", endpoint, "只支持 http / https")),
                Err(e) => return Err(invalid("TRACKING_ENDPOINT", endpoint, &e.to_string())),
            }
        }
        Ok(())
    }

    /// 引擎运行参数
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval_ms: self.poll_interval_ms,
            upload_success_timeout_ms: self.upload_success_timeout_ms,
            tailor: TailorSettings {
                experience_tie_threshold: self.experience_tie_threshold,
                skill_match_score: self.skill_match_score,
            },
        }
    }
}

/// 引擎运行参数（与进程环境无关，便于测试中直接构造）
#[derive(Clone, Copy, Debug)]
pub struct EngineSettings {
    pub poll_interval_ms: u64,
    pub upload_success_timeout_ms: u64,
    pub tailor: TailorSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Config::default().engine_settings()
    }
}

/// 简历定制参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TailorSettings {
    /// 分差不超过该值的经历视为并列，按开始年份倒序
    pub experience_tie_threshold: i64,
    /// 技能出现在职位描述中时的得分
    pub skill_match_score: i64,
}

impl Default for TailorSettings {
    fn default() -> Self {
        Self {
            experience_tie_threshold: DEFAULT_EXPERIENCE_TIE_THRESHOLD,
            skill_match_score: DEFAULT_SKILL_MATCH_SCORE,
        }
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub const DEFAULT_EXPERIENCE_TIE_THRESHOLD: i64 = 5;
pub const DEFAULT_SKILL_MATCH_SCORE: i64 = 10;
