//! 请求相关的数据类型：输入类型、分析模式、上传文件

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, FileError};

/// 上传文件的类型（对应提取服务的 `input_type` 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Pdf,
    Audio,
    Video,
}

impl InputType {
    pub const ALL: [InputType; 3] = [InputType::Pdf, InputType::Audio, InputType::Video];

    /// 发送给远程服务的值
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Pdf => "pdf",
            InputType::Audio => "audio",
            InputType::Video => "video",
        }
    }

    /// 该类型可接受的文件扩展名
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            InputType::Pdf => &["pdf"],
            InputType::Audio => &["mp3", "wav", "m4a", "ogg"],
            InputType::Video => &["mp4", "avi", "mov", "mkv"],
        }
    }

    /// 文件名的扩展名是否属于该类型（不区分大小写）
    pub fn accepts(self, file_name: &str) -> bool {
        extension_of(file_name)
            .map(|ext| self.extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(InputType::Pdf),
            "audio" => Ok(InputType::Audio),
            "video" => Ok(InputType::Video),
            other => Err(format!("未知的文件类型: {} (可选: pdf / audio / video)", other)),
        }
    }
}

/// 分析模式（原样转发为 `analysis_type`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// 简要摘要
    Brief,
    /// 详细分析
    Detailed,
    /// 主要话题
    MainTopics,
    /// 关键词聚焦
    KeywordsFocus,
    /// 要点列表
    BulletPoints,
    /// 问答格式
    QuestionAnswer,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 6] = [
        AnalysisMode::Brief,
        AnalysisMode::Detailed,
        AnalysisMode::MainTopics,
        AnalysisMode::KeywordsFocus,
        AnalysisMode::BulletPoints,
        AnalysisMode::QuestionAnswer,
    ];

    /// 线上的取值
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Brief => "brief",
            AnalysisMode::Detailed => "detailed",
            AnalysisMode::MainTopics => "main_topics",
            AnalysisMode::KeywordsFocus => "keywords_focus",
            AnalysisMode::BulletPoints => "bullet_points",
            AnalysisMode::QuestionAnswer => "question_answer",
        }
    }

    /// 展示名称
    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::Brief => "📝 Brief Summary",
            AnalysisMode::Detailed => "📚 Detailed Analysis",
            AnalysisMode::MainTopics => "🎯 Main Topics",
            AnalysisMode::KeywordsFocus => "🔑 Keywords Focus",
            AnalysisMode::BulletPoints => "📌 Bullet Points",
            AnalysisMode::QuestionAnswer => "❓ Q&A Format",
        }
    }

    /// 一句话说明
    pub fn description(self) -> &'static str {
        match self {
            AnalysisMode::Brief => "Quick 2-3 sentence overview",
            AnalysisMode::Detailed => "Comprehensive analysis",
            AnalysisMode::MainTopics => "Extract key topics",
            AnalysisMode::KeywordsFocus => "Focus on your keywords",
            AnalysisMode::BulletPoints => "Key points as bullets",
            AnalysisMode::QuestionAnswer => "Q&A summary format",
        }
    }

    /// 该模式是否建议配合关键词使用（只是提示，不做校验）
    pub fn recommends_keywords(self) -> bool {
        matches!(self, AnalysisMode::KeywordsFocus)
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("未知的分析模式: {}", s))
    }
}

/// 待上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// 原始文件名
    pub file_name: String,
    /// 声明的媒体类型
    pub media_type: String,
    /// 文件内容
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// 由内存数据创建，媒体类型按扩展名推断
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let media_type = guess_media_type(&file_name).to_string();
        Self {
            file_name,
            media_type,
            bytes,
        }
    }

    /// 读取本地文件，并检查扩展名是否符合所选类型
    pub async fn from_path(path: &Path, input_type: InputType) -> AppResult<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if !input_type.accepts(&file_name) {
            return Err(AppError::File(FileError::UnsupportedExtension {
                file_name,
                input_type: input_type.to_string(),
            }));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        Ok(Self::new(file_name, bytes))
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// 按扩展名推断媒体类型
pub fn guess_media_type(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}
