//! 控制台编排器 - 编排层
//!
//! ## 职责
//!
//! 把远程调用组合成完整流程，并决定哪些结果写入会话历史：
//!
//! 1. **分析流程**：extract → analyze → 记录
//! 2. **问答流程**：answer → 记录
//! 3. **文件问答**：extract → answer → 记录
//!
//! ## 设计特点
//!
//! - 每次调用都从会话存储读取配置，但从不修改配置
//! - 任一步骤失败立即终止，不重试，后续步骤不会发出请求
//! - 只有流程最后一步成功才写入历史（全有或全无）
//! - 同一时间只运行一个流程，并发调用会排队

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::clients::EndpointClient;
use crate::config::Config;
use crate::models::{Analysis, AnalysisMode, Answer, HistoryEntry, InputType, UploadFile};
use crate::services::{EndpointStatus, HealthMonitor};
use crate::session::SessionStore;
use crate::utils::truncate_text;
use crate::workflow::{Stage, WorkflowFailure, WorkflowState};

/// 日志中文本预览的最大字符数
const PREVIEW_CHARS: usize = 500;

/// 分析请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub input_type: InputType,
    /// 未上传文件时为 None
    pub file: Option<UploadFile>,
    pub mode: AnalysisMode,
    /// 可为空，对任何模式都合法
    pub keywords: String,
}

impl AnalysisRequest {
    pub fn new(input_type: InputType, file: UploadFile, mode: AnalysisMode) -> Self {
        Self {
            input_type,
            file: Some(file),
            mode,
            keywords: String::new(),
        }
    }

    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }
}

/// 控制台编排器
///
/// 会话存储由调用方创建后注入，客户端通过 `EndpointClient` 抽象
pub struct Orchestrator<C: EndpointClient> {
    client: C,
    store: Arc<SessionStore>,
    health: HealthMonitor,
    state: Mutex<WorkflowState>,
    gate: tokio::sync::Mutex<()>,
}

impl<C: EndpointClient> Orchestrator<C> {
    /// 创建编排器
    pub fn new(client: C, store: Arc<SessionStore>) -> Self {
        Self {
            client,
            store,
            health: HealthMonitor::new(),
            state: Mutex::new(WorkflowState::Idle),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// 最近一次流程的当前状态
    pub fn state(&self) -> WorkflowState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 两个服务的在线状态（按配置缓存，`force` 为 true 时重新探测）
    pub async fn endpoint_status(&self, force: bool) -> EndpointStatus {
        let config = self.store.config();
        self.health.status(&self.client, &config, force).await
    }

    // ========== 分析流程 ==========

    /// 运行分析流程：提取文本 → 分析 → 写入历史
    ///
    /// # 参数
    /// - `request`: 文件、输入类型、分析模式、关键词
    ///
    /// # 返回
    /// - `Ok(Analysis)`: 分析服务返回的原始结果
    /// - `Err(WorkflowFailure)`: 标注了失败步骤；分析失败时带有已提取的字符数
    pub async fn run_analysis_workflow(
        &self,
        request: AnalysisRequest,
    ) -> Result<Analysis, WorkflowFailure> {
        let _guard = self.gate.lock().await;
        self.transition(WorkflowState::Idle);

        let config = self.store.config();
        let result = self.analysis_steps(&config, &request).await;
        self.finish(&result);
        result
    }

    async fn analysis_steps(
        &self,
        config: &Config,
        request: &AnalysisRequest,
    ) -> Result<Analysis, WorkflowFailure> {
        let base_url = require_analysis_url(config)?;
        let file = request
            .file
            .as_ref()
            .ok_or_else(|| WorkflowFailure::validation(Stage::Extract, "请先上传文件"))?;

        let text = self
            .extract(base_url, &config.api_key, request.input_type, file)
            .await?;
        let chars = text.chars().count();

        self.transition(WorkflowState::Analyzing);
        info!("🔍 正在以 {} 模式分析...", request.mode);
        if request.mode.recommends_keywords() && request.keywords.is_empty() {
            debug!("{} 模式未提供关键词，按空字符串转发", request.mode);
        }

        let analysis = self
            .client
            .analyze_text(
                base_url,
                &config.api_key,
                &text,
                request.mode,
                &request.keywords,
            )
            .await
            .into_result()
            .map_err(|failure| {
                WorkflowFailure::from_endpoint(Stage::Analyze, failure).with_extracted_chars(chars)
            })?;

        self.record(
            HistoryEntry::analysis(
                request.mode,
                &request.keywords,
                Some(&file.file_name),
                analysis.clone(),
            )
            .with_extracted_chars(chars),
        );
        info!("✅ 分析完成，已保存到历史记录");

        Ok(analysis)
    }

    // ========== 问答流程 ==========

    /// 运行问答流程：对给定文本提问 → 写入历史
    ///
    /// 文本或问题为空时直接返回校验错误，不发出任何请求
    pub async fn run_question_answer_workflow(
        &self,
        text: &str,
        question: &str,
    ) -> Result<Answer, WorkflowFailure> {
        let _guard = self.gate.lock().await;
        self.transition(WorkflowState::Idle);

        let config = self.store.config();
        let result = self.answer_steps(&config, text, question, None).await;
        self.finish(&result);
        result
    }

    /// 使用缓存的提取文本提问
    pub async fn run_cached_question_answer(
        &self,
        question: &str,
    ) -> Result<Answer, WorkflowFailure> {
        let _guard = self.gate.lock().await;
        self.transition(WorkflowState::Idle);

        // 必须在持有流程锁之后读取缓存
        let text = self.store.cached_text().unwrap_or_default();
        let config = self.store.config();
        let result = self.answer_steps(&config, &text, question, None).await;
        self.finish(&result);
        result
    }

    /// 只提取文本并缓存，供后续问答使用（不写入历史）
    pub async fn extract_for_question_answer(
        &self,
        input_type: InputType,
        file: Option<&UploadFile>,
    ) -> Result<String, WorkflowFailure> {
        let _guard = self.gate.lock().await;
        self.transition(WorkflowState::Idle);

        let config = self.store.config();
        let result = self.extract_and_cache(&config, input_type, file).await;
        self.finish(&result);
        result
    }

    /// 文件问答：提取文本 → 提问 → 写入历史
    pub async fn run_document_question_workflow(
        &self,
        input_type: InputType,
        file: Option<&UploadFile>,
        question: &str,
    ) -> Result<Answer, WorkflowFailure> {
        let _guard = self.gate.lock().await;
        self.transition(WorkflowState::Idle);

        let config = self.store.config();
        let result = self
            .document_question_steps(&config, input_type, file, question)
            .await;
        self.finish(&result);
        result
    }

    async fn document_question_steps(
        &self,
        config: &Config,
        input_type: InputType,
        file: Option<&UploadFile>,
        question: &str,
    ) -> Result<Answer, WorkflowFailure> {
        // 提取前先检查问答所需的前置条件，避免白白提取
        require_rag_url(config)?;
        if question.trim().is_empty() {
            return Err(WorkflowFailure::validation(Stage::Answer, "请输入问题"));
        }

        let text = self.extract_and_cache(config, input_type, file).await?;
        let file_name = file.map(|f| f.file_name.as_str());

        self.answer_steps(config, &text, question, file_name)
            .await
            .map_err(|failure| failure.with_extracted_chars(text.chars().count()))
    }

    async fn extract_and_cache(
        &self,
        config: &Config,
        input_type: InputType,
        file: Option<&UploadFile>,
    ) -> Result<String, WorkflowFailure> {
        let base_url = require_analysis_url(config)?;
        let file =
            file.ok_or_else(|| WorkflowFailure::validation(Stage::Extract, "请先上传文件"))?;

        let text = self
            .extract(base_url, &config.api_key, input_type, file)
            .await?;
        self.store.set_cached_text(text.clone());

        Ok(text)
    }

    async fn answer_steps(
        &self,
        config: &Config,
        text: &str,
        question: &str,
        source_file_name: Option<&str>,
    ) -> Result<Answer, WorkflowFailure> {
        let base_url = require_rag_url(config)?;
        if text.trim().is_empty() {
            return Err(WorkflowFailure::validation(Stage::Answer, "请提供文本"));
        }
        if question.trim().is_empty() {
            return Err(WorkflowFailure::validation(Stage::Answer, "请输入问题"));
        }

        self.transition(WorkflowState::Answering);
        info!("💡 正在检索答案...");

        let answer = self
            .client
            .answer_question(base_url, &config.api_key, text, question)
            .await
            .into_result()
            .map_err(|failure| WorkflowFailure::from_endpoint(Stage::Answer, failure))?;

        info!("✅ 已检索 {} 个片段", answer.num_chunks);
        self.record(HistoryEntry::rag(question, source_file_name, answer.clone()));

        Ok(answer)
    }

    // ========== 内部辅助 ==========

    async fn extract(
        &self,
        base_url: &str,
        api_key: &str,
        input_type: InputType,
        file: &UploadFile,
    ) -> Result<String, WorkflowFailure> {
        self.transition(WorkflowState::Extracting);
        info!("📄 正在提取文本: {} ({})", file.file_name, input_type);

        let extraction = self
            .client
            .extract_text(base_url, api_key, input_type, file)
            .await
            .into_result()
            .map_err(|failure| WorkflowFailure::from_endpoint(Stage::Extract, failure))?;

        info!("✅ 已提取 {} 个字符", extraction.text.chars().count());
        debug!("文本预览: {}", truncate_text(&extraction.text, PREVIEW_CHARS));

        Ok(extraction.text)
    }

    fn record(&self, entry: HistoryEntry) {
        self.store.set_last_result(entry.payload.clone());
        self.store.append(entry);
    }

    fn transition(&self, next: WorkflowState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            warn!("⚠️ 非法的流程状态转换: {} → {}", *state, next);
        }
        debug!("流程状态: {} → {}", *state, next);
        *state = next;
    }

    fn finish<T>(&self, result: &Result<T, WorkflowFailure>) {
        match result {
            Ok(_) => self.transition(WorkflowState::Done),
            Err(failure) => {
                warn!("❌ 流程失败: {}", failure);
                self.transition(WorkflowState::Failed);
            }
        }
    }
}

fn require_analysis_url(config: &Config) -> Result<&str, WorkflowFailure> {
    config
        .analysis_url()
        .ok_or_else(|| WorkflowFailure::validation(Stage::Extract, "未配置分析服务地址"))
}

fn require_rag_url(config: &Config) -> Result<&str, WorkflowFailure> {
    config
        .rag_url()
        .ok_or_else(|| WorkflowFailure::validation(Stage::Answer, "未配置问答服务地址"))
}
