/// 推理服务 HTTP 客户端
///
/// 封装健康检查、文本提取、文本分析、问答四个远程调用。
/// 任何失败都不会以 `Err` 抛给调用方，而是折叠成 `EndpointResult::Error`。
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    AnalysisMode, AnalysisResult, AnswerResult, EndpointResult, ExtractionResult, InputType,
    UploadFile,
};

/// 远程服务调用能力
///
/// 编排层只依赖这个 trait，测试里可以换成计数的替身实现。
#[async_trait]
pub trait EndpointClient: Send + Sync {
    /// GET `{base_url}/health`，当且仅当返回 200 时为 true
    async fn check_health(&self, base_url: &str) -> bool;

    /// POST `{base_url}/extract`（multipart）
    async fn extract_text(
        &self,
        base_url: &str,
        api_key: &str,
        input_type: InputType,
        file: &UploadFile,
    ) -> ExtractionResult;

    /// POST `{base_url}/analyze`（form）
    async fn analyze_text(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        mode: AnalysisMode,
        keywords: &str,
    ) -> AnalysisResult;

    /// POST `{base_url}/rag`（form）
    async fn answer_question(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        question: &str,
    ) -> AnswerResult;
}

#[async_trait]
impl<T: EndpointClient + ?Sized> EndpointClient for Arc<T> {
    async fn check_health(&self, base_url: &str) -> bool {
        (**self).check_health(base_url).await
    }

    async fn extract_text(
        &self,
        base_url: &str,
        api_key: &str,
        input_type: InputType,
        file: &UploadFile,
    ) -> ExtractionResult {
        (**self).extract_text(base_url, api_key, input_type, file).await
    }

    async fn analyze_text(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        mode: AnalysisMode,
        keywords: &str,
    ) -> AnalysisResult {
        (**self)
            .analyze_text(base_url, api_key, text, mode, keywords)
            .await
    }

    async fn answer_question(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        question: &str,
    ) -> AnswerResult {
        (**self).answer_question(base_url, api_key, text, question).await
    }
}

/// 基于 reqwest 的实现
///
/// 只发一次请求，不重试
#[derive(Debug, Clone)]
pub struct HttpEndpointClient {
    http: reqwest::Client,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl HttpEndpointClient {
    /// 按配置中的超时时间创建客户端
    pub fn new(config: &Config) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            config.health_timeout(),
            config.request_timeout(),
        )
    }

    /// 使用已有的 reqwest 客户端（共享连接池）
    pub fn with_client(
        http: reqwest::Client,
        health_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            health_timeout,
            request_timeout,
        }
    }

    /// 发送请求并把各种结果统一成 `EndpointResult`
    async fn send_and_normalize<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> EndpointResult<T> {
        let response = match request.timeout(self.request_timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("❌ 请求 {} 失败: {}", endpoint, e);
                return EndpointResult::network(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("❌ 读取 {} 响应失败: {}", endpoint, e);
                return EndpointResult::network(e.to_string());
            }
        };

        if status != StatusCode::OK {
            warn!("⚠️ {} 返回 HTTP {}", endpoint, status.as_u16());
            let message = if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body
            };
            return EndpointResult::remote(message);
        }

        debug!("{} 返回 200，响应长度: {} 字节", endpoint, body.len());
        parse_body(endpoint, &body)
    }
}

/// 解析 200 响应；外形不符时归为远程错误
fn parse_body<T: DeserializeOwned>(endpoint: &str, body: &str) -> EndpointResult<T> {
    match serde_json::from_str::<EndpointResult<T>>(body) {
        Ok(result) => result.normalized(),
        Err(e) => {
            warn!("⚠️ {} 响应格式无法识别: {}", endpoint, e);
            EndpointResult::remote(format!("unrecognised response from {}: {}", endpoint, e))
        }
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url, path)
}

#[async_trait]
impl EndpointClient for HttpEndpointClient {
    async fn check_health(&self, base_url: &str) -> bool {
        let url = endpoint_url(base_url, "health");
        match self.http.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => {
                let online = response.status() == StatusCode::OK;
                debug!("健康检查 {} -> HTTP {}", url, response.status().as_u16());
                online
            }
            Err(e) => {
                debug!("健康检查 {} 失败: {}", url, e);
                false
            }
        }
    }

    async fn extract_text(
        &self,
        base_url: &str,
        api_key: &str,
        input_type: InputType,
        file: &UploadFile,
    ) -> ExtractionResult {
        let url = endpoint_url(base_url, "extract");
        debug!(
            "正在提取文本: {} ({}, {} 字节)",
            file.file_name,
            input_type,
            file.bytes.len()
        );

        let part = match file_part(file) {
            Ok(part) => part,
            Err(e) => return EndpointResult::network(e.to_string()),
        };
        let form = Form::new()
            .part("file", part)
            .text("input_type", input_type.as_str());

        let request = self.http.post(&url).bearer_auth(api_key).multipart(form);
        self.send_and_normalize("/extract", request).await
    }

    async fn analyze_text(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        mode: AnalysisMode,
        keywords: &str,
    ) -> AnalysisResult {
        let url = endpoint_url(base_url, "analyze");
        debug!("正在分析文本: 模式 {}，文本 {} 字符", mode, text.chars().count());

        let request = self.http.post(&url).bearer_auth(api_key).form(&[
            ("text", text),
            ("analysis_type", mode.as_str()),
            ("keywords", keywords),
        ]);
        self.send_and_normalize("/analyze", request).await
    }

    async fn answer_question(
        &self,
        base_url: &str,
        api_key: &str,
        text: &str,
        question: &str,
    ) -> AnswerResult {
        let url = endpoint_url(base_url, "rag");
        debug!("正在问答: 文本 {} 字符", text.chars().count());

        let request = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .form(&[("text", text), ("question", question)]);
        self.send_and_normalize("/rag", request).await
    }
}

/// 构建文件 part；声明的媒体类型非法时退回 octet-stream
fn file_part(file: &UploadFile) -> reqwest::Result<Part> {
    Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.media_type)
        .or_else(|_| {
            Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str("application/octet-stream")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analysis, Answer, Extraction, FailureKind};
    use mockito::{Matcher, Server};

    fn test_client() -> HttpEndpointClient {
        HttpEndpointClient::new(&Config::default())
    }

    #[tokio::test]
    async fn test_check_health_ok() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("anything")
            .create_async()
            .await;

        assert!(test_client().check_health(&server.url()).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_health_non_200() {
        for status in [201, 404, 500] {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/health")
                .with_status(status)
                .create_async()
                .await;
            assert!(!test_client().check_health(&server.url()).await);
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_check_health_unreachable() {
        assert!(!test_client().check_health("http://127.0.0.1:9").await);
        assert!(!test_client().check_health("not a url").await);
    }

    #[tokio::test]
    async fn test_extract_sends_multipart_with_bearer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/extract")
            .match_header("authorization", "Bearer k")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="input_type""#.to_string()),
                Matcher::Regex(r#"filename="doc.pdf""#.to_string()),
                Matcher::Regex("application/pdf".to_string()),
                Matcher::Regex("%PDF-fake".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"status":"success","text":"Hello world"}"#)
            .create_async()
            .await;

        let file = UploadFile::new("doc.pdf", b"%PDF-fake".to_vec());
        let result = test_client()
            .extract_text(&server.url(), "k", InputType::Pdf, &file)
            .await;

        mock.assert_async().await;
        assert_eq!(
            result,
            EndpointResult::Success(Extraction {
                text: "Hello world".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_extract_non_200_uses_body_as_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/extract")
            .with_status(401)
            .with_body("Invalid API key")
            .create_async()
            .await;

        let file = UploadFile::new("doc.pdf", vec![1, 2, 3]);
        let result = test_client()
            .extract_text(&server.url(), "wrong", InputType::Pdf, &file)
            .await;

        match result {
            EndpointResult::Error(failure) => {
                assert_eq!(failure.message, "Invalid API key");
                assert_eq!(failure.kind, FailureKind::Remote);
            }
            EndpointResult::Success(_) => panic!("应该返回错误"),
        }
    }

    #[tokio::test]
    async fn test_extract_network_failure() {
        let file = UploadFile::new("doc.pdf", vec![1]);
        let result = test_client()
            .extract_text("http://127.0.0.1:9", "k", InputType::Pdf, &file)
            .await;

        match result {
            EndpointResult::Error(failure) => {
                assert_eq!(failure.kind, FailureKind::Network);
                assert!(!failure.message.is_empty());
            }
            EndpointResult::Success(_) => panic!("应该返回错误"),
        }
    }

    #[tokio::test]
    async fn test_analyze_and_answer_network_failure() {
        let client = test_client();

        let analysis = client
            .analyze_text("http://127.0.0.1:9", "k", "text", AnalysisMode::Brief, "")
            .await;
        match analysis {
            EndpointResult::Error(failure) => {
                assert_eq!(failure.kind, FailureKind::Network);
                assert!(!failure.message.is_empty());
            }
            EndpointResult::Success(_) => panic!("应该返回错误"),
        }

        let answer = client
            .answer_question("http://127.0.0.1:9", "k", "text", "q")
            .await;
        match answer {
            EndpointResult::Error(failure) => {
                assert_eq!(failure.kind, FailureKind::Network);
                assert!(!failure.message.is_empty());
            }
            EndpointResult::Success(_) => panic!("应该返回错误"),
        }
    }

    #[tokio::test]
    async fn test_analyze_sends_form_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .match_header("authorization", "Bearer k")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r"text=Hello\+world".to_string()),
                Matcher::Regex("analysis_type=keywords_focus".to_string()),
                Matcher::Regex("keywords=$".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"status":"success","analysis":"A short summary.","text_length":11}"#)
            .create_async()
            .await;

        let result = test_client()
            .analyze_text(
                &server.url(),
                "k",
                "Hello world",
                AnalysisMode::KeywordsFocus,
                "",
            )
            .await;

        mock.assert_async().await;
        assert_eq!(
            result,
            EndpointResult::Success(Analysis {
                analysis: "A short summary.".to_string(),
                text_length: Some(11),
            })
        );
    }

    #[tokio::test]
    async fn test_analyze_remote_error_status_is_trusted() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/analyze")
            .with_status(200)
            .with_body(r#"{"status":"error","message":"model not loaded"}"#)
            .create_async()
            .await;

        let result = test_client()
            .analyze_text(&server.url(), "k", "t", AnalysisMode::Brief, "")
            .await;

        assert_eq!(result.message(), Some("model not loaded"));
    }

    #[tokio::test]
    async fn test_answer_question() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rag")
            .match_header("authorization", "Bearer k")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("text=".to_string()),
                Matcher::Regex(r"question=What%3F".to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"success","answer":"That.","sources":["s1","s2"],"num_chunks":4}"#,
            )
            .create_async()
            .await;

        let result = test_client()
            .answer_question(&server.url(), "k", "some text", "What?")
            .await;

        mock.assert_async().await;
        assert_eq!(
            result,
            EndpointResult::Success(Answer {
                answer: "That.".to_string(),
                sources: vec!["s1".to_string(), "s2".to_string()],
                num_chunks: 4,
            })
        );
    }

    #[tokio::test]
    async fn test_answer_malformed_body_is_remote_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rag")
            .with_status(200)
            .with_body("<html>ngrok error</html>")
            .create_async()
            .await;

        let result = test_client()
            .answer_question(&server.url(), "k", "text", "q")
            .await;

        match result {
            EndpointResult::Error(failure) => {
                assert_eq!(failure.kind, FailureKind::Remote);
                assert!(failure.message.contains("/rag"));
            }
            EndpointResult::Success(_) => panic!("应该返回错误"),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body_gets_status_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rag")
            .with_status(502)
            .create_async()
            .await;

        let result = test_client()
            .answer_question(&server.url(), "k", "text", "q")
            .await;

        assert!(result.message().unwrap().contains("502"));
    }
}
