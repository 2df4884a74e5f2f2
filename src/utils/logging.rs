/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::HistoryStats;
use crate::services::EndpointStatus;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 当前配置（不输出 API Key）
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🤖 Study Assistant 启动");
    info!(
        "🔵 分析服务: {}",
        config.analysis_url().unwrap_or("(未配置)")
    );
    info!("🟢 问答服务: {}", config.rag_url().unwrap_or("(未配置)"));
    info!("{}", "=".repeat(60));
}

/// 记录服务在线状态
pub fn log_endpoint_status(status: &EndpointStatus) {
    info!(
        "📡 状态 - 分析服务: {} | 问答服务: {}",
        status_icon(status.analysis_online),
        status_icon(status.rag_online)
    );
}

/// 打印会话统计信息
pub fn log_stats(stats: &HistoryStats) {
    info!("\n{}", "─".repeat(60));
    info!("📈 本次会话统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "总计: {} | 分析: {} | 问答: {}",
        stats.total, stats.analysis_count, stats.rag_count
    );
    info!("{}", "─".repeat(60));
}

fn status_icon(online: bool) -> &'static str {
    if online {
        "🟢"
    } else {
        "🔴"
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
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

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        // 按字符截断，不会切断多字节字符
        assert_eq!(truncate_text("你好世界", 2), "你好...");
    }
}
