//! 单元测试用的客户端替身：返回预设结果，并记录调用次数与参数

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::clients::EndpointClient;
use crate::models::{
    Analysis, AnalysisMode, AnalysisResult, Answer, AnswerResult, EndpointResult, Extraction,
    ExtractionResult, InputType, UploadFile,
};

/// 一次 analyze 调用收到的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeCall {
    pub base_url: String,
    pub api_key: String,
    pub text: String,
    pub mode: AnalysisMode,
    pub keywords: String,
}

/// 一次 answer 调用收到的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCall {
    pub base_url: String,
    pub text: String,
    pub question: String,
}

pub struct ScriptedClient {
    online: HashSet<String>,
    extraction: ExtractionResult,
    analysis: AnalysisResult,
    answer: AnswerResult,
    extract_delay: Option<Duration>,
    pub health_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub answer_calls: AtomicUsize,
    pub analyze_args: Mutex<Vec<AnalyzeCall>>,
    pub answer_args: Mutex<Vec<AnswerCall>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            online: HashSet::new(),
            extraction: EndpointResult::Success(Extraction {
                text: "Hello world".to_string(),
            }),
            analysis: EndpointResult::Success(Analysis {
                analysis: "A short summary.".to_string(),
                text_length: Some(11),
            }),
            answer: EndpointResult::Success(Answer {
                answer: "An answer.".to_string(),
                sources: vec!["source one".to_string()],
                num_chunks: 2,
            }),
            extract_delay: None,
            health_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            analyze_calls: AtomicUsize::new(0),
            answer_calls: AtomicUsize::new(0),
            analyze_args: Mutex::new(Vec::new()),
            answer_args: Mutex::new(Vec::new()),
        }
    }

    pub fn online(mut self, base_url: &str) -> Self {
        self.online.insert(base_url.to_string());
        self
    }

    pub fn extraction(mut self, result: ExtractionResult) -> Self {
        self.extraction = result;
        self
    }

    pub fn analysis(mut self, result: AnalysisResult) -> Self {
        self.analysis = result;
        self
    }

    pub fn answer(mut self, result: AnswerResult) -> Self {
        self.answer = result;
        self
    }

    /// 提取前先等待，模拟耗时的远程调用
    pub fn extract_delay(mut self, delay: Duration) -> Self {
        self.extract_delay = Some(delay);
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn network_calls(&self) -> usize {
        Self::count(&self.extract_calls)
            + Self::count(&self.analyze_calls)
            + Self::count(&self.answer_calls)
    }
}

#[async_trait]
impl EndpointClient for ScriptedClient {
    async fn check_health(&self, base_url: &str) -> bool {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.online.contains(base_url)
    }

    async fn extract_text(
        &self,
        _base_url: &str,
        _api_key: &str,
        _input_type: InputType,
        _file: &UploadFile,
    ) -> ExtractionResult {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.extract_delay {
            tokio::time::sleep(delay).await;
        }
        self.extraction.clone()
    }

    async fn analyze_text(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        mode: AnalysisMode,
        keywords: &str,
    ) -> AnalysisResult {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analyze_args.lock().unwrap().push(AnalyzeCall {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            text: text.to_string(),
            mode,
            keywords: keywords.to_string(),
        });
        self.analysis.clone()
    }

    async fn answer_question(
        &self,
        base_url: &str,
        _api_key: &str,
        text: &str,
        question: &str,
    ) -> AnswerResult {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        self.answer_args.lock().unwrap().push(AnswerCall {
            base_url: base_url.to_string(),
            text: text.to_string(),
            question: question.to_string(),
        });
        self.answer.clone()
    }
}
