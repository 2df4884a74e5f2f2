//! 结果导出服务
//!
//! 把分析 / 问答结果序列化成 UTF-8 JSON 文档，供用户另存

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{AnalysisMode, EndpointResult, HistoryEntry, HistoryPayload};

/// 序列化结果内容（即历史记录中的 payload）
pub fn payload_to_json(payload: &HistoryPayload) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(payload)?)
}

/// 解析导出的 payload
pub fn payload_from_json(json: &str) -> AppResult<HistoryPayload> {
    Ok(serde_json::from_str(json)?)
}

/// 带 `"status": "success"` 的完整结果文档（与远程服务的返回外形一致）
pub fn result_document(payload: &HistoryPayload) -> AppResult<String> {
    let document: EndpointResult<&HistoryPayload> = EndpointResult::Success(payload);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// 分析结果下载文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis: String,
    pub mode: AnalysisMode,
    pub keywords: String,
    pub file: String,
    pub timestamp: String,
    pub text_length: usize,
}

impl AnalysisReport {
    /// 由分析记录生成；问答记录返回 None
    ///
    /// 服务未返回 `text_length` 时使用记录中的提取字符数
    pub fn from_entry(entry: &HistoryEntry) -> Option<Self> {
        let HistoryPayload::Analysis(analysis) = &entry.payload else {
            return None;
        };

        Some(Self {
            analysis: analysis.analysis.clone(),
            mode: entry.mode?,
            keywords: entry.keywords.clone().unwrap_or_default(),
            file: entry.source_file_name.clone().unwrap_or_default(),
            timestamp: entry.timestamp.clone(),
            text_length: analysis
                .text_length
                .or(entry.extracted_chars)
                .unwrap_or(0),
        })
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `analysis_{mode}_{unix}.json`
pub fn analysis_file_name(mode: AnalysisMode, unix_secs: i64) -> String {
    format!("analysis_{}_{}.json", mode.as_str(), unix_secs)
}

/// `rag_{unix}.json`
pub fn rag_file_name(unix_secs: i64) -> String {
    format!("rag_{}.json", unix_secs)
}

/// `history_{n}.json`，`n` 从 1 开始
pub fn history_file_name(index: usize) -> String {
    format!("history_{}.json", index)
}

/// 写入导出目录（目录不存在时自动创建）
pub async fn write_document(dir: &Path, file_name: &str, contents: &str) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::file_write_failed(dir.display().to_string(), e))?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, contents.as_bytes())
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    info!("📥 已导出: {}", path.display());
    Ok(path)
}
