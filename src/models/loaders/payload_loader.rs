use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

/// 读取并反序列化 JSON 载荷文件
pub async fn load_json_payload<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::payload_read_failed(path.display().to_string(), e))?;

    let payload = serde_json::from_str(&content)?;
    tracing::debug!("已读取载荷: {} ({} 字节)", path.display(), content.len());
    Ok(payload)
}
