//! 会话历史记录

use serde::{Deserialize, Serialize};

use crate::models::request::AnalysisMode;
use crate::models::result::{Analysis, Answer};

/// 时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Analysis,
    Rag,
}

impl HistoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryKind::Analysis => "analysis",
            HistoryKind::Rag => "rag",
        }
    }
}

/// 记录内容：分析结果或问答结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryPayload {
    Analysis(Analysis),
    Answer(Answer),
}

impl HistoryPayload {
    pub fn kind(&self) -> HistoryKind {
        match self {
            HistoryPayload::Analysis(_) => HistoryKind::Analysis,
            HistoryPayload::Answer(_) => HistoryKind::Rag,
        }
    }
}

/// 一次成功完成的流程记录，追加后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 创建时间（`YYYY-MM-DD HH:MM:SS`）
    pub timestamp: String,
    pub kind: HistoryKind,
    /// 分析模式（问答记录为空）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnalysisMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_name: Option<String>,
    /// 提问内容（仅问答记录）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// 提取到的文本字符数（分析服务未返回 `text_length` 时导出用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_chars: Option<usize>,
    pub payload: HistoryPayload,
}

impl HistoryEntry {
    /// 创建分析记录，空关键词记为 None
    pub fn analysis(
        mode: AnalysisMode,
        keywords: &str,
        source_file_name: Option<&str>,
        analysis: Analysis,
    ) -> Self {
        Self {
            timestamp: now_timestamp(),
            kind: HistoryKind::Analysis,
            mode: Some(mode),
            keywords: Some(keywords.to_string()).filter(|k| !k.is_empty()),
            source_file_name: source_file_name.map(str::to_string),
            question: None,
            extracted_chars: None,
            payload: HistoryPayload::Analysis(analysis),
        }
    }

    /// 附带提取文本的字符数，payload 保持不变
    pub fn with_extracted_chars(mut self, chars: usize) -> Self {
        self.extracted_chars = Some(chars);
        self
    }

    /// 创建问答记录
    pub fn rag(question: &str, source_file_name: Option<&str>, answer: Answer) -> Self {
        Self {
            timestamp: now_timestamp(),
            kind: HistoryKind::Rag,
            mode: None,
            keywords: None,
            source_file_name: source_file_name.map(str::to_string),
            question: Some(question.to_string()),
            extracted_chars: None,
            payload: HistoryPayload::Answer(answer),
        }
    }

    /// 列表中显示的标题，`index` 从 1 开始
    pub fn title(&self, index: usize) -> String {
        format!(
            "#{} - {} - {}",
            index,
            self.kind.as_str().to_uppercase(),
            self.timestamp
        )
    }
}

/// 按类型过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Analysis,
    Rag,
}

impl HistoryFilter {
    pub fn matches(self, entry: &HistoryEntry) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Analysis => entry.kind == HistoryKind::Analysis,
            HistoryFilter::Rag => entry.kind == HistoryKind::Rag,
        }
    }
}

/// 排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// 历史统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub analysis_count: usize,
    pub rag_count: usize,
}

fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis() -> Analysis {
        Analysis {
            analysis: "A short summary.".to_string(),
            text_length: Some(11),
        }
    }

    #[test]
    fn test_timestamp_format() {
        let entry = HistoryEntry::analysis(AnalysisMode::Brief, "", None, sample_analysis());
        assert!(chrono::NaiveDateTime::parse_from_str(&entry.timestamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(entry.timestamp.len(), 19);
    }

    #[test]
    fn test_empty_keywords_are_absent() {
        let entry =
            HistoryEntry::analysis(AnalysisMode::KeywordsFocus, "", None, sample_analysis());
        assert_eq!(entry.keywords, None);

        let entry = HistoryEntry::analysis(
            AnalysisMode::KeywordsFocus,
            "AI, climate",
            Some("paper.pdf"),
            sample_analysis(),
        );
        assert_eq!(entry.keywords.as_deref(), Some("AI, climate"));
        assert_eq!(entry.source_file_name.as_deref(), Some("paper.pdf"));
        assert_eq!(entry.kind, HistoryKind::Analysis);
    }

    #[test]
    fn test_payload_json_round_trip() {
        let payloads = vec![
            HistoryPayload::Analysis(sample_analysis()),
            HistoryPayload::Answer(Answer {
                answer: "Paris".to_string(),
                sources: vec!["France's capital is Paris.".to_string()],
                num_chunks: 3,
            }),
        ];

        for payload in payloads {
            let json = serde_json::to_string(&payload).unwrap();
            let parsed: HistoryPayload = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, payload);
            assert_eq!(parsed.kind(), payload.kind());
        }
    }

    #[test]
    fn test_entry_serializes_kind_and_mode_as_wire_strings() {
        let entry = HistoryEntry::analysis(AnalysisMode::MainTopics, "x", None, sample_analysis());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["kind"], "analysis");
        assert_eq!(value["mode"], "main_topics");
        assert!(value.get("question").is_none());
    }

    #[test]
    fn test_filter_and_title() {
        let rag = HistoryEntry::rag(
            "What?",
            None,
            Answer {
                answer: "That.".to_string(),
                sources: vec![],
                num_chunks: 0,
            },
        );
        assert!(HistoryFilter::All.matches(&rag));
        assert!(HistoryFilter::Rag.matches(&rag));
        assert!(!HistoryFilter::Analysis.matches(&rag));
        assert!(rag.title(2).starts_with("#2 - RAG - "));
    }
}
