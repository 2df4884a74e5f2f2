//! 健康检查服务
//!
//! 由调用方显式触发，结果按配置的时长缓存，不在每次渲染时都去探测。

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::clients::EndpointClient;
use crate::config::Config;

/// 两个服务的在线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EndpointStatus {
    pub analysis_online: bool,
    pub rag_online: bool,
}

type CacheKey = (Option<String>, Option<String>);

#[derive(Debug)]
struct CachedStatus {
    key: CacheKey,
    checked_at: Instant,
    status: EndpointStatus,
}

/// 健康检查服务
#[derive(Debug, Default)]
pub struct HealthMonitor {
    cache: Mutex<Option<CachedStatus>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取两个服务的状态
    ///
    /// # 参数
    /// - `client`: 远程调用客户端
    /// - `config`: 当前配置（地址变化时缓存自动失效）
    /// - `force`: 为 true 时忽略缓存
    ///
    /// # 返回
    /// 未配置的服务直接视为离线，不发请求
    pub async fn status<C>(&self, client: &C, config: &Config, force: bool) -> EndpointStatus
    where
        C: EndpointClient + ?Sized,
    {
        let key: CacheKey = (
            config.analysis_url().map(str::to_string),
            config.rag_url().map(str::to_string),
        );

        if !force {
            if let Some(status) = self.cached(&key, config) {
                debug!("使用缓存的健康状态: {:?}", status);
                return status;
            }
        }

        let (analysis_online, rag_online) = tokio::join!(
            probe(client, config.analysis_url()),
            probe(client, config.rag_url()),
        );
        let status = EndpointStatus {
            analysis_online,
            rag_online,
        };

        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(CachedStatus {
            key,
            checked_at: Instant::now(),
            status,
        });

        status
    }

    /// 丢弃缓存
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self, key: &CacheKey, config: &Config) -> Option<EndpointStatus> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .as_ref()
            .filter(|cached| &cached.key == key)
            .filter(|cached| cached.checked_at.elapsed() < config.health_cache_ttl())
            .map(|cached| cached.status)
    }
}

async fn probe<C>(client: &C, base_url: Option<&str>) -> bool
where
    C: EndpointClient + ?Sized,
{
    match base_url {
        Some(url) => client.check_health(url).await,
        None => false,
    }
}
