use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::{Detection, RunReport};

/// 初始化 tracing 订阅器
///
/// `RUST_LOG` 优先；否则 `verbose` 时为 debug，默认 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（如测试中）时忽略
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n自动填表日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - ATS 自动填表");
    info!("🌐 浏览器调试端口: {}", config.browser_debug_port);
    if let Some(url) = &config.target_url {
        info!("🎯 目标页面: {}", url);
    }
    info!(
        "📋 注册表: {}",
        config.registry_file.as_deref().unwrap_or("内置")
    );
    info!("{}", "=".repeat(60));
}

/// 打印一次运行的汇总，并追加到日志文件
///
/// # 参数
/// - `report`: 运行汇总
/// - `log_file_path`: 日志文件路径
pub fn print_run_summary(report: &RunReport, log_file_path: &str) {
    let lines = summary_lines(report);

    info!("\n{}", "=".repeat(60));
    info!("📊 运行结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for line in &lines {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));

    let mut content = lines.join("\n");
    content.push('\n');
    match fs::OpenOptions::new().append(true).create(true).open(log_file_path) {
        Ok(mut file) => {
            use std::io::Write;
            if let Err(e) = file.write_all(content.as_bytes()) {
                warn!("写入日志文件失败: {}", e);
            } else {
                info!("\n日志已保存至: {}", log_file_path);
            }
        }
        Err(e) => warn!("打开日志文件失败 ({}): {}", log_file_path, e),
    }
}

/// 汇总文本，每项一行
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!("页面: {}", report.url)];
    match &report.detection {
        Detection::Unsupported => {
            lines.push("平台: 不支持".to_string());
            return lines;
        }
        Detection::AlreadySubmitted { platform } => {
            lines.push(format!("平台: {} (已提交, 未填写)", platform));
            return lines;
        }
        Detection::Ready { platform } => lines.push(format!("平台: {}", platform)),
    }

    if let Some(posting) = &report.posting {
        lines.push(format!("职位: {}", truncate_text(&posting.to_string(), 80)));
    }
    if let Some(fill) = &report.fill {
        lines.push(format!(
            "✅ 已填写: {}/{}",
            fill.filled_count,
            fill.total()
        ));
        lines.push(format!("⏭️ 跳过: {}", fill.skip_count));
        for field in fill.fields.iter().filter(|r| !r.outcome.is_filled()) {
            lines.push(format!("  - {}: {:?}", field.field, field.outcome));
        }
    }
    if let Some(upload) = &report.upload {
        lines.push(format!("📎 简历: {}", upload));
    }
    lines.push(match &report.submit_control {
        Some(locator) => format!("提交按钮: {} (请检查后手动提交)", locator),
        None => "提交按钮: 未找到".to_string(),
    });
    lines.push(format!(
        "投递跟踪: {}",
        if report.tracked { "已记录" } else { "未记录" }
    ));
    lines
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldOutcome, FormFillResult, SkipReason, UploadOutcome};

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("职位描述很长很长", 4), "职位描述...");
    }

    #[test]
    fn test_summary_lines() {
        let mut fill = FormFillResult::default();
        fill.record("first_name", FieldOutcome::Filled { locator: "#first".into() });
        fill.record("phone", FieldOutcome::skipped(SkipReason::NoValue));

        let report = RunReport {
            url: "https://jobs.lever.co/acme/1/apply".to_string(),
            detection: Detection::Ready {
                platform: "Lever".to_string(),
            },
            posting: None,
            fill: Some(fill),
            upload: Some(UploadOutcome::NoResumeFile),
            submit_control: None,
            tracked: true,
        };
        let lines = summary_lines(&report);
        assert!(lines.contains(&"平台: Lever".to_string()));
        assert!(lines.contains(&"✅ 已填写: 1/2".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("  - phone")));
        assert!(lines.contains(&"提交按钮: 未找到".to_string()));

        let unsupported = RunReport {
            detection: Detection::Unsupported,
            fill: None,
            upload: None,
            ..report
        };
        assert_eq!(summary_lines(&unsupported).len(), 2);
    }
}
