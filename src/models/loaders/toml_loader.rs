use crate::models::platform::PlatformRegistry;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载并校验平台注册表
pub async fn load_registry_file(toml_file_path: &Path) -> Result<PlatformRegistry> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取注册表文件: {}", toml_file_path.display()))?;

    let registry = PlatformRegistry::from_toml_str(&content)
        .with_context(|| format!("无法解析注册表文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载注册表 v{}: {} 个平台",
        registry.version(),
        registry.len()
    );

    Ok(registry)
}

/// 加载注册表：指定文件优先，否则使用内置注册表
pub async fn load_registry(registry_file: Option<&str>) -> Result<PlatformRegistry> {
    match registry_file {
        Some(path) => {
            tracing::info!("正在加载自定义注册表: {}", path);
            load_registry_file(Path::new(path)).await
        }
        None => {
            let registry = PlatformRegistry::builtin().context("内置注册表不合法")?;
            tracing::info!("使用内置注册表: {} 个平台", registry.len());
            Ok(registry)
        }
    }
}
