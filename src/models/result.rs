//! 远程服务返回的结果类型
//!
//! 所有接口都使用同一种外形：
//!
//! ```text
//! {"status": "success", ...具体字段}
//! {"status": "error", "message": "..."}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// 失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// 连接失败、DNS 失败、超时
    Network,
    /// 服务可达，但返回非 200 或 `status: "error"`
    #[default]
    Remote,
    /// 本地前置条件不满足，未发出任何请求
    Validation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => f.write_str("network"),
            FailureKind::Remote => f.write_str("remote"),
            FailureKind::Validation => f.write_str("validation"),
        }
    }
}

/// 失败结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFailure {
    /// 人类可读的错误信息，保证非空
    pub message: String,
    /// 本地附加的失败类别，不参与序列化
    #[serde(skip)]
    pub kind: FailureKind,
}

impl EndpointFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            format!("{} error without message", kind)
        } else {
            message
        };
        Self { message, kind }
    }
}

/// 统一的远程调用结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EndpointResult<T> {
    Success(T),
    Error(EndpointFailure),
}

impl<T> EndpointResult<T> {
    pub fn network(message: impl Into<String>) -> Self {
        EndpointResult::Error(EndpointFailure::new(FailureKind::Network, message))
    }

    pub fn remote(message: impl Into<String>) -> Self {
        EndpointResult::Error(EndpointFailure::new(FailureKind::Remote, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EndpointResult::Success(_))
    }

    /// 错误信息（成功时为 None）
    pub fn message(&self) -> Option<&str> {
        match self {
            EndpointResult::Success(_) => None,
            EndpointResult::Error(failure) => Some(&failure.message),
        }
    }

    pub fn into_result(self) -> Result<T, EndpointFailure> {
        match self {
            EndpointResult::Success(value) => Ok(value),
            EndpointResult::Error(failure) => Err(failure),
        }
    }

    /// 补齐空的错误信息（远程可能返回 `"message": ""`）
    pub(crate) fn normalized(self) -> Self {
        match self {
            EndpointResult::Error(failure) => {
                EndpointResult::Error(EndpointFailure::new(failure.kind, failure.message))
            }
            success => success,
        }
    }
}

/// 文本提取结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
}

/// 文本分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub analysis: String,
    /// 远程可能不返回，此时由编排层用提取文本的字符数补齐
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

/// 问答结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
    pub num_chunks: usize,
}

pub type ExtractionResult = EndpointResult<Extraction>;
pub type AnalysisResult = EndpointResult<Analysis>;
pub type AnswerResult = EndpointResult<Answer>;
