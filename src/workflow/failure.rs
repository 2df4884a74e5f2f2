//! 流程失败信息
//!
//! 在远程失败的基础上标注"哪一步失败"

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::{EndpointFailure, FailureKind};

/// 流程中的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Analyze,
    Answer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract => f.write_str("extract"),
            Stage::Analyze => f.write_str("analyze"),
            Stage::Answer => f.write_str("answer"),
        }
    }
}

/// 流程失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("[{stage}] {message}")]
pub struct WorkflowFailure {
    /// 失败的步骤
    pub stage: Stage,
    pub kind: FailureKind,
    /// 原样转发的错误信息
    pub message: String,
    /// 提取已成功时的文本字符数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_chars: Option<usize>,
}

impl WorkflowFailure {
    /// 本地校验失败（未发出任何请求）
    pub fn validation(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: FailureKind::Validation,
            message: message.into(),
            extracted_chars: None,
        }
    }

    /// 远程调用失败
    pub fn from_endpoint(stage: Stage, failure: EndpointFailure) -> Self {
        Self {
            stage,
            kind: failure.kind,
            message: failure.message,
            extracted_chars: None,
        }
    }

    pub fn with_extracted_chars(mut self, chars: usize) -> Self {
        self.extracted_chars = Some(chars);
        self
    }

    pub fn is_validation(&self) -> bool {
        self.kind == FailureKind::Validation
    }
}
