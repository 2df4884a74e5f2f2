//! # Study Assistant
//!
//! 文档 / 音视频学习助手的控制台核心：上传文件、提取文本、按模式分析、基于文本问答
//!
//! ## 架构设计
//!
//! 本系统采用分层架构，远程服务只通过 HTTP 访问：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 调用分析服务与问答服务，把所有结果归一化为 success / error
//! - `EndpointClient` - 客户端抽象，便于测试时替换
//!
//! ### ② 业务能力层（Services / Session）
//! - `services/` - 健康检查缓存、结果导出
//! - `session/` - 会话存储：配置、历史、缓存文本、最近结果
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 单次调用的状态机与失败描述
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/console` - 分析流程、问答流程、历史写入
//! - `orchestrator/app` - 命令行外壳
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use clients::{EndpointClient, HttpEndpointClient};
pub use config::{Config, ConfigPatch};
pub use error::{AppError, AppResult};
pub use models::{
    Analysis, AnalysisMode, Answer, EndpointResult, HistoryEntry, HistoryFilter, InputType,
    SortOrder, UploadFile,
};
pub use orchestrator::{AnalysisRequest, App, Orchestrator};
pub use session::SessionStore;
pub use workflow::{Stage, WorkflowFailure, WorkflowState};
