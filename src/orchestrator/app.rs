//! 命令行外壳
//!
//! 负责参数解析、结果输出和导出，不包含任何流程判断

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::clients::HttpEndpointClient;
use crate::config::{Config, ConfigPatch};
use crate::models::{AnalysisMode, Answer, HistoryFilter, InputType, SortOrder, UploadFile};
use crate::orchestrator::console::{AnalysisRequest, Orchestrator};
use crate::services::exporter::{self, AnalysisReport};
use crate::session::SessionStore;
use crate::utils::logging::{log_endpoint_status, log_startup, log_stats};
use crate::utils::truncate_text;
use crate::workflow::WorkflowFailure;

/// 来源片段显示的最大字符数
const SOURCE_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Parser)]
#[command(
    name = "study-assistant",
    version,
    about = "Study Assistant: 文档 / 音视频分析与问答控制台"
)]
pub struct Cli {
    /// TOML 配置文件路径
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 分析服务地址（覆盖配置）
    #[arg(long, global = true)]
    pub analysis_url: Option<String>,

    /// 问答服务地址（覆盖配置）
    #[arg(long, global = true)]
    pub rag_url: Option<String>,

    /// 共享 API Key（覆盖配置）
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// 命令行上给出的配置项
    pub fn config_patch(&self) -> ConfigPatch {
        ConfigPatch {
            analysis_endpoint_url: self.analysis_url.clone(),
            rag_endpoint_url: self.rag_url.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 检查两个服务是否在线
    Status,
    /// 列出所有分析模式
    Modes,
    /// 上传文件，提取文本并分析
    Analyze {
        /// 待分析的文件
        #[arg(long)]
        file: PathBuf,
        /// 文件类型: pdf / audio / video
        #[arg(long, default_value = "pdf")]
        input_type: InputType,
        /// 分析模式
        #[arg(long, default_value = "brief")]
        mode: AnalysisMode,
        /// 关键词（可选，推荐用于 keywords_focus 模式）
        #[arg(long, default_value = "")]
        keywords: String,
        /// 导出 JSON 到导出目录
        #[arg(long)]
        export: bool,
    },
    /// 对文本或文件提问
    Ask {
        /// 问题
        #[arg(long)]
        question: String,
        /// 直接给出的文本
        #[arg(long, conflicts_with_all = ["text_file", "file"])]
        text: Option<String>,
        /// 从文本文件读取
        #[arg(long, conflicts_with = "file")]
        text_file: Option<PathBuf>,
        /// 先经分析服务提取文本的文件
        #[arg(long)]
        file: Option<PathBuf>,
        /// `--file` 的类型: pdf / audio / video
        #[arg(long, default_value = "pdf")]
        input_type: InputType,
        /// 导出 JSON 到导出目录
        #[arg(long)]
        export: bool,
    },
}

/// 应用主结构
pub struct App {
    orchestrator: Orchestrator<HttpEndpointClient>,
    export_dir: PathBuf,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, overrides: ConfigPatch) -> Self {
        let client = HttpEndpointClient::new(&config);
        let export_dir = PathBuf::from(&config.export_dir);

        let store = Arc::new(SessionStore::new(config));
        store.set_config(overrides);
        log_startup(&store.config());

        Self {
            orchestrator: Orchestrator::new(client, store),
            export_dir,
        }
    }

    /// 执行一个命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Status => {
                let status = self.orchestrator.endpoint_status(true).await;
                log_endpoint_status(&status);
            }
            Command::Modes => print_modes(),
            Command::Analyze {
                file,
                input_type,
                mode,
                keywords,
                export,
            } => self.analyze(file, input_type, mode, keywords, export).await?,
            Command::Ask {
                question,
                text,
                text_file,
                file,
                input_type,
                export,
            } => {
                self.ask(question, text, text_file, file, input_type, export)
                    .await?
            }
        }

        log_stats(&self.orchestrator.store().stats());
        Ok(())
    }

    async fn analyze(
        &self,
        path: PathBuf,
        input_type: InputType,
        mode: AnalysisMode,
        keywords: String,
        export: bool,
    ) -> Result<()> {
        let file = UploadFile::from_path(&path, input_type).await?;
        if mode.recommends_keywords() && keywords.is_empty() {
            warn!("⚠️ {} 模式建议提供 --keywords", mode.label());
        }

        let request = AnalysisRequest::new(input_type, file, mode).keywords(keywords.clone());
        let analysis = self
            .orchestrator
            .run_analysis_workflow(request)
            .await
            .map_err(report_failure)?;

        info!(
            "Mode Used: {}{}",
            mode.label(),
            if keywords.is_empty() {
                String::new()
            } else {
                format!(" | Keywords: {}", keywords)
            }
        );
        println!("{}", analysis.analysis);

        if export {
            let entry = self
                .orchestrator
                .store()
                .list(HistoryFilter::Analysis, SortOrder::NewestFirst)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("历史记录中没有分析结果"))?;
            let report = AnalysisReport::from_entry(&entry)
                .ok_or_else(|| anyhow!("无法生成分析报告"))?;

            let file_name = exporter::analysis_file_name(mode, unix_now());
            exporter::write_document(&self.export_dir, &file_name, &report.to_json()?).await?;
        }

        Ok(())
    }

    async fn ask(
        &self,
        question: String,
        text: Option<String>,
        text_file: Option<PathBuf>,
        file: Option<PathBuf>,
        input_type: InputType,
        export: bool,
    ) -> Result<()> {
        let result = match (text, text_file, file) {
            (_, _, Some(path)) => {
                let upload = UploadFile::from_path(&path, input_type).await?;
                self.orchestrator
                    .run_document_question_workflow(input_type, Some(&upload), &question)
                    .await
            }
            (_, Some(path), None) => {
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("无法读取文本文件: {}", path.display()))?;
                self.orchestrator
                    .run_question_answer_workflow(&text, &question)
                    .await
            }
            (text, None, None) => {
                self.orchestrator
                    .run_question_answer_workflow(text.as_deref().unwrap_or_default(), &question)
                    .await
            }
        };

        let answer = result.map_err(report_failure)?;
        print_answer(&answer);

        if export {
            let payload = self
                .orchestrator
                .store()
                .last_result()
                .ok_or_else(|| anyhow!("没有可导出的结果"))?;
            let document = exporter::result_document(&payload)?;
            let file_name = exporter::rag_file_name(unix_now());
            exporter::write_document(&self.export_dir, &file_name, &document).await?;
        }

        Ok(())
    }
}

// ========== 输出辅助函数 ==========

fn report_failure(failure: WorkflowFailure) -> anyhow::Error {
    if let Some(chars) = failure.extracted_chars {
        info!("✅ 已提取 {} 个字符，但后续步骤失败", chars);
    }
    error!("❌ {} 步骤失败 ({}): {}", failure.stage, failure.kind, failure.message);
    anyhow::Error::new(failure)
}

fn print_modes() {
    for mode in AnalysisMode::ALL {
        println!("{:<16} {:<24} {}", mode.as_str(), mode.label(), mode.description());
    }
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);
    for (i, source) in answer.sources.iter().enumerate() {
        println!("\nSource {}:", i + 1);
        println!("{}", truncate_text(source, SOURCE_PREVIEW_CHARS));
    }
    info!("Searched {} chunks", answer.num_chunks);
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
