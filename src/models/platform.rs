//! 平台注册表数据模型
//!
//! TOML 中的原始定义（`*Def`）在加载时一次性校验并转换为不可变的类型化配置，
//! 执行阶段不再做任何字段合法性判断。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, RegistryError};
use crate::models::value_transform;

/// 当前支持的注册表版本
pub const REGISTRY_VERSION: u32 = 1;

/// `wait_for` 未指定超时时的默认等待时间
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// 上传控件默认定位等待时间
pub const DEFAULT_UPLOAD_LOCATE_TIMEOUT_MS: u64 = 3_000;

/// 动作目标定位器中的占位符，替换为字段自身命中的定位器
pub const BASE_PLACEHOLDER: &str = "%BASE%";

/// 动作目标定位器中的占位符，替换为转换后的字段值
pub const VALUE_PLACEHOLDER: &str = "%VALUE%";

/// 填充策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    /// 原生 setter + 合成 input/change，适配 React 等受控输入框
    #[default]
    #[serde(alias = "react", alias = "framework")]
    FrameworkSet,
    /// focus → 清空 → 赋值 → input/change
    #[serde(alias = "native", alias = "default")]
    PlainSet,
    /// 仅点击
    Click,
    /// 复选框 / 单选框：状态不一致时才点击
    #[serde(alias = "radio")]
    Checkbox,
}

impl std::fmt::Display for FillMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FillMethod::FrameworkSet => "framework_set",
            FillMethod::PlainSet => "plain_set",
            FillMethod::Click => "click",
            FillMethod::Checkbox => "checkbox",
        };
        f.write_str(name)
    }
}

/// 键盘事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventType {
    #[default]
    Keydown,
    Keyup,
    Keypress,
}

impl KeyEventType {
    pub fn as_dom_name(self) -> &'static str {
        match self {
            KeyEventType::Keydown => "keydown",
            KeyEventType::Keyup => "keyup",
            KeyEventType::Keypress => "keypress",
        }
    }
}

/// 合成键盘事件参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEventOptions {
    pub event: KeyEventType,
    pub key: String,
    pub code: Option<String>,
    pub key_code: Option<u32>,
}

/// 合成鼠标事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseEventKind {
    Mousedown,
    Mouseup,
    Mouseover,
    Mouseenter,
    Click,
}

impl MouseEventKind {
    pub fn as_dom_name(self) -> &'static str {
        match self {
            MouseEventKind::Mousedown => "mousedown",
            MouseEventKind::Mouseup => "mouseup",
            MouseEventKind::Mouseover => "mouseover",
            MouseEventKind::Mouseenter => "mouseenter",
            MouseEventKind::Click => "click",
        }
    }
}

/// 动作步骤：每种动作只携带自己需要的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStep {
    Click,
    SetValue { blur: bool },
    ClearValue,
    Focus,
    Blur,
    Key(KeyEventOptions),
    Mouse(MouseEventKind),
}

/// 校验后的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub step: ActionStep,
    /// 目标定位器覆盖（可含 `%BASE%` / `%VALUE%`）
    pub target: Option<String>,
    /// 执行前延迟
    pub delay: Option<Duration>,
    /// 动作执行后需要出现的新元素，出现后成为当前元素
    pub wait_for: Vec<String>,
    /// 等待超时。有 `wait_for` 时作用于 `wait_for`，否则作用于目标定位
    pub timeout: Option<Duration>,
    pub allow_failure: bool,
}

impl Action {
    /// 目标定位可用的等待时间
    pub fn target_timeout(&self) -> Duration {
        if self.wait_for.is_empty() {
            self.timeout.unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }

    /// `wait_for` 的等待时间
    pub fn wait_timeout(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS))
    }
}

/// 字段定位规格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSpec {
    /// 候选定位器，按顺序尝试，命中第一个即停止
    pub locators: Vec<String>,
    /// 显式填充策略，覆盖平台默认值
    pub method: Option<FillMethod>,
    /// 值转换表名称
    pub transform: Option<String>,
    pub actions: Vec<Action>,
}

impl LocatorSpec {
    /// 裸定位器：使用平台默认策略，无动作
    pub fn bare(locator: impl Into<String>) -> Self {
        Self {
            locators: vec![locator.into()],
            method: None,
            transform: None,
            actions: Vec::new(),
        }
    }

    pub fn method_or(&self, default: FillMethod) -> FillMethod {
        self.method.unwrap_or(default)
    }
}

/// 单个字段的定位配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    pub name: String,
    pub specs: Vec<LocatorSpec>,
}

/// 职位信息抽取选择器
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractSelectors {
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub description: Vec<String>,
    pub location: Vec<String>,
}

/// 简历上传配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub locators: Vec<String>,
    pub pre_actions: Vec<Action>,
    pub success: Vec<String>,
    pub locate_timeout: Duration,
}

/// 平台配置，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub name: String,
    pub urls: Vec<String>,
    pub exclude: Vec<String>,
    pub fill_method: FillMethod,
    /// 按声明顺序排列，顺序即填写顺序
    pub fields: Vec<FieldConfig>,
    pub submit: Vec<String>,
    pub success: Vec<String>,
    pub extract: ExtractSelectors,
    pub upload: Option<UploadConfig>,
}

impl PlatformConfig {
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ========== TOML 原始定义 ==========

/// 单个或多个字符串
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::None => Vec::new(),
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Click,
    SetValue,
    ClearValue,
    Focus,
    Blur,
    KeyEvent,
    MouseEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionDef {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub wait_for: OneOrMany,
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
    #[serde(default)]
    pub allow_failure: bool,
    #[serde(default)]
    pub blur: Option<bool>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub key_code: Option<u32>,
    #[serde(default)]
    pub key_event: Option<KeyEventType>,
    #[serde(default)]
    pub mouse_event: Option<MouseEventKind>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocatorSpecDef {
    Bare(String),
    Detailed {
        locators: OneOrMany,
        #[serde(default)]
        method: Option<FillMethod>,
        #[serde(default)]
        transform: Option<String>,
        #[serde(default)]
        actions: Vec<ActionDef>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub specs: Vec<LocatorSpecDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadDef {
    pub locators: OneOrMany,
    #[serde(default)]
    pub pre_actions: Vec<ActionDef>,
    #[serde(default)]
    pub success: OneOrMany,
    #[serde(default)]
    pub locate_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformDef {
    pub name: String,
    pub urls: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub fill_method: FillMethod,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub submit: OneOrMany,
    #[serde(default)]
    pub success: OneOrMany,
    #[serde(default)]
    pub extract: ExtractSelectors,
    #[serde(default)]
    pub upload: Option<UploadDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryDef {
    pub version: u32,
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
}

// ========== 校验 ==========

fn non_empty_locators(platform: &str, what: &str, locators: Vec<String>) -> AppResult<Vec<String>> {
    if locators.iter().any(|l| l.trim().is_empty()) {
        return Err(AppError::invalid_platform(
            platform,
            format!("{} 中存在空定位器", what),
        ));
    }
    Ok(locators)
}

impl ActionDef {
    pub fn validate(self, platform: &str, field: &str) -> AppResult<Action> {
        let where_ = format!("字段 {} 的 {:?} 动作", field, self.kind);

        if self.blur.is_some() && self.kind != ActionType::SetValue {
            return Err(AppError::invalid_platform(
                platform,
                format!("{}: 只有 set_value 支持 blur", where_),
            ));
        }

        let step = match self.kind {
            ActionType::Click => ActionStep::Click,
            ActionType::SetValue => ActionStep::SetValue {
                blur: self.blur.unwrap_or(false),
            },
            ActionType::ClearValue => ActionStep::ClearValue,
            ActionType::Focus => ActionStep::Focus,
            ActionType::Blur => ActionStep::Blur,
            ActionType::KeyEvent => {
                let key = self.key.filter(|k| !k.is_empty()).ok_or_else(|| {
                    AppError::invalid_platform(platform, format!("{}: 缺少 key", where_))
                })?;
                ActionStep::Key(KeyEventOptions {
                    event: self.key_event.unwrap_or_default(),
                    key,
                    code: self.code,
                    key_code: self.key_code,
                })
            }
            ActionType::MouseEvent => {
                let kind = self.mouse_event.ok_or_else(|| {
                    AppError::invalid_platform(platform, format!("{}: 缺少 mouse_event", where_))
                })?;
                ActionStep::Mouse(kind)
            }
        };

        let wait_for = non_empty_locators(platform, &where_, self.wait_for.into_vec())?;
        if let Some(target) = &self.target {
            if target.trim().is_empty() {
                return Err(AppError::invalid_platform(
                    platform,
                    format!("{}: target 为空", where_),
                ));
            }
        }
        if self.wait_timeout_ms.is_some() && wait_for.is_empty() && self.target.is_none() {
            return Err(AppError::invalid_platform(
                platform,
                format!("{}: wait_timeout_ms 需要 wait_for 或 target", where_),
            ));
        }

        Ok(Action {
            step,
            target: self.target,
            delay: self.delay_ms.map(Duration::from_millis),
            wait_for,
            timeout: self.wait_timeout_ms.map(Duration::from_millis),
            allow_failure: self.allow_failure,
        })
    }
}

impl LocatorSpecDef {
    pub fn validate(self, platform: &str, field: &str) -> AppResult<LocatorSpec> {
        match self {
            LocatorSpecDef::Bare(locator) => {
                let locators = non_empty_locators(platform, field, vec![locator])?;
                Ok(LocatorSpec {
                    locators,
                    method: None,
                    transform: None,
                    actions: Vec::new(),
                })
            }
            LocatorSpecDef::Detailed {
                locators,
                method,
                transform,
                actions,
            } => {
                let locators = non_empty_locators(platform, field, locators.into_vec())?;
                if locators.is_empty() {
                    return Err(AppError::invalid_platform(
                        platform,
                        format!("字段 {} 的定位规格没有候选定位器", field),
                    ));
                }
                if let Some(name) = &transform {
                    if !value_transform::is_known(name) {
                        return Err(AppError::invalid_platform(
                            platform,
                            format!("字段 {} 使用了未知的值转换表 {}", field, name),
                        ));
                    }
                }
                let actions = actions
                    .into_iter()
                    .map(|a| a.validate(platform, field))
                    .collect::<AppResult<Vec<_>>>()?;
                Ok(LocatorSpec {
                    locators,
                    method,
                    transform,
                    actions,
                })
            }
        }
    }
}

impl PlatformDef {
    pub fn validate(self) -> AppResult<PlatformConfig> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::invalid_platform("<unnamed>", "平台名称为空"));
        }
        if self.urls.is_empty() || self.urls.iter().any(|u| u.trim().is_empty()) {
            return Err(AppError::invalid_platform(&name, "缺少 URL 模式"));
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            if fields.iter().any(|f: &FieldConfig| f.name == field.name) {
                return Err(AppError::invalid_platform(
                    &name,
                    format!("字段 {} 重复声明", field.name),
                ));
            }
            let specs = field
                .specs
                .into_iter()
                .map(|s| s.validate(&name, &field.name))
                .collect::<AppResult<Vec<_>>>()?;
            fields.push(FieldConfig {
                name: field.name,
                specs,
            });
        }

        let upload = match self.upload {
            Some(def) => {
                let locators = non_empty_locators(&name, "upload", def.locators.into_vec())?;
                if locators.is_empty() {
                    return Err(AppError::invalid_platform(&name, "upload 缺少定位器"));
                }
                let pre_actions = def
                    .pre_actions
                    .into_iter()
                    .map(|a| a.validate(&name, "upload"))
                    .collect::<AppResult<Vec<_>>>()?;
                Some(UploadConfig {
                    locators,
                    pre_actions,
                    success: non_empty_locators(&name, "upload.success", def.success.into_vec())?,
                    locate_timeout: Duration::from_millis(
                        def.locate_timeout_ms
                            .unwrap_or(DEFAULT_UPLOAD_LOCATE_TIMEOUT_MS),
                    ),
                })
            }
            None => None,
        };

        Ok(PlatformConfig {
            submit: non_empty_locators(&name, "submit", self.submit.into_vec())?,
            success: non_empty_locators(&name, "success", self.success.into_vec())?,
            name,
            urls: self.urls,
            exclude: self.exclude,
            fill_method: self.fill_method,
            fields,
            extract: self.extract,
            upload,
        })
    }
}

/// 平台注册表：一次构造，之后只读共享
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRegistry {
    version: u32,
    platforms: Vec<PlatformConfig>,
}

const BUILTIN_REGISTRY: &str = include_str!("../../config/platforms.toml");

impl PlatformRegistry {
    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let def: RegistryDef = toml::from_str(content)?;
        Self::from_def(def)
    }

    pub fn from_def(def: RegistryDef) -> AppResult<Self> {
        if def.version != REGISTRY_VERSION {
            return Err(RegistryError::UnsupportedVersion {
                found: def.version,
                supported: REGISTRY_VERSION,
            }
            .into());
        }

        let mut platforms: Vec<PlatformConfig> = Vec::with_capacity(def.platforms.len());
        for platform in def.platforms {
            let platform = platform.validate()?;
            if platforms
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&platform.name))
            {
                return Err(RegistryError::DuplicatePlatform {
                    name: platform.name,
                }
                .into());
            }
            platforms.push(platform);
        }

        Ok(Self {
            version: def.version,
            platforms,
        })
    }

    /// 内置注册表
    pub fn builtin() -> AppResult<Self> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// 按注册顺序返回所有平台
    pub fn platforms(&self) -> &[PlatformConfig] {
        &self.platforms
    }

    pub fn get(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
