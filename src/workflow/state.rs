//! 单次流程调用的状态机
//!
//! ```text
//! 分析:       Idle → Extracting → Analyzing → Done
//! 问答:       Idle → Answering → Done
//! 文件问答:   Idle → Extracting → Answering → Done
//! 仅提取:     Idle → Extracting → Done
//! 任意步骤失败 → Failed（终态）
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Extracting,
    Analyzing,
    Answering,
    Done,
    Failed,
}

impl WorkflowState {
    /// 是否为终态（Done / Failed 之后只能重新从 Idle 开始）
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Failed)
    }

    /// 状态转换是否合法
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;

        match (self, next) {
            // 新的一次调用总是从 Idle 开始
            (_, Idle) => true,
            (Idle, Extracting) | (Idle, Answering) => true,
            (Extracting, Analyzing) | (Extracting, Answering) => true,
            (Extracting, Done) | (Analyzing, Done) | (Answering, Done) => true,
            (Idle | Extracting | Analyzing | Answering, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Extracting => "extracting",
            WorkflowState::Analyzing => "analyzing",
            WorkflowState::Answering => "answering",
            WorkflowState::Done => "done",
            WorkflowState::Failed => "failed",
        };
        f.write_str(name)
    }
}
