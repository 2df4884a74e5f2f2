//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把单个远程调用组合成完整流程，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `console` - 控制台编排器
//! - 分析流程（extract → analyze）
//! - 问答流程（answer / extract → answer）
//! - 决定哪些结果写入会话历史
//! - 维护单次调用的状态机，串行化并发调用
//!
//! ### `app` - 命令行外壳
//! - 解析命令行参数，加载配置
//! - 调用编排器并输出结果、导出 JSON
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行)
//!     ↓
//! console::Orchestrator (流程编排)
//!     ↓
//! services (健康检查 / 导出)   session (会话存储)
//!     ↓
//! clients (HTTP 调用)
//! ```

pub mod app;
pub mod console;

// 重新导出主要类型
pub use app::{App, Cli, Command};
pub use console::{AnalysisRequest, Orchestrator};
