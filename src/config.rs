use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};

/// 默认的共享 API Key（占位值）
pub const DEFAULT_API_KEY: &str = "123456";

/// 程序配置
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 分析服务（文本提取 + 多模式分析）地址
    pub analysis_endpoint_url: Option<String>,
    /// 问答服务（RAG）地址
    pub rag_endpoint_url: Option<String>,
    /// 两个服务共用的 Bearer Token
    pub api_key: String,
    /// 健康检查超时（秒）
    pub health_timeout_secs: u64,
    /// 提取 / 分析 / 问答请求超时（秒）
    pub request_timeout_secs: u64,
    /// 健康检查结果缓存时长（秒）
    pub health_cache_secs: u64,
    /// 导出 JSON 文档的目录
    pub export_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_endpoint_url: None,
            rag_endpoint_url: None,
            api_key: DEFAULT_API_KEY.to_string(),
            health_timeout_secs: 5,
            request_timeout_secs: 300,
            health_cache_secs: 30,
            export_dir: "exports".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（缺失的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Ok(Self::from_toml_file(path)?.with_env_overrides()),
            None => Ok(Self::from_env()),
        }
    }

    /// 解析 TOML 字符串
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: "<inline>".to_string(),
                source,
            })
        })
    }

    /// 读取 TOML 配置文件
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        toml::from_str(&content).map_err(|source| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })
        })
    }

    fn with_env_overrides(self) -> Self {
        Self {
            analysis_endpoint_url: env_string("ANALYSIS_ENDPOINT_URL")
                .or(self.analysis_endpoint_url),
            rag_endpoint_url: env_string("RAG_ENDPOINT_URL").or(self.rag_endpoint_url),
            api_key: env_string("API_KEY").unwrap_or(self.api_key),
            health_timeout_secs: env_parsed("HEALTH_TIMEOUT_SECS")
                .unwrap_or(self.health_timeout_secs),
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS")
                .unwrap_or(self.request_timeout_secs),
            health_cache_secs: env_parsed("HEALTH_CACHE_SECS").unwrap_or(self.health_cache_secs),
            export_dir: env_string("EXPORT_DIR").unwrap_or(self.export_dir),
            verbose_logging: env_parsed("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 已配置的分析服务地址（空字符串视为未配置）
    pub fn analysis_url(&self) -> Option<&str> {
        non_empty(self.analysis_endpoint_url.as_deref())
    }

    /// 已配置的问答服务地址（空字符串视为未配置）
    pub fn rag_url(&self) -> Option<&str> {
        non_empty(self.rag_endpoint_url.as_deref())
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.health_cache_secs)
    }

    /// 合并部分配置，不做任何校验
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(url) = patch.analysis_endpoint_url {
            self.analysis_endpoint_url = Some(url);
        }
        if let Some(url) = patch.rag_endpoint_url {
            self.rag_endpoint_url = Some(url);
        }
        if let Some(key) = patch.api_key {
            self.api_key = key;
        }
    }
}

/// 部分配置更新（对应界面上的输入框）
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub analysis_endpoint_url: Option<String>,
    pub rag_endpoint_url: Option<String>,
    pub api_key: Option<String>,
}

impl ConfigPatch {
    pub fn analysis_url(mut self, url: impl Into<String>) -> Self {
        self.analysis_endpoint_url = Some(url.into());
        self
    }

    pub fn rag_url(mut self, url: impl Into<String>) -> Self {
        self.rag_endpoint_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// 无法解析的值按未设置处理
fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
