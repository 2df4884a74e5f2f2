//! 会话存储
//!
//! 持有当前配置、只追加的历史记录、缓存的提取文本和最近一次成功结果。
//! 整个状态由一把互斥锁保护，读操作返回副本，不会改变内部顺序。

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::config::{Config, ConfigPatch};
use crate::models::{
    HistoryEntry, HistoryFilter, HistoryKind, HistoryPayload, HistoryStats, SortOrder,
};

#[derive(Debug, Default)]
struct SessionState {
    config: Config,
    history: Vec<HistoryEntry>,
    cached_text: Option<String>,
    last_result: Option<HistoryPayload>,
}

/// 会话存储
///
/// 生命周期：`new` → 使用 → `clear`。由调用方创建后注入编排器，
/// 不存在全局实例。
#[derive(Debug, Default)]
pub struct SessionStore {
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// 使用给定配置创建空会话
    pub fn new(config: Config) -> Self {
        Self {
            state: Mutex::new(SessionState {
                config,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========== 配置 ==========

    /// 当前配置的副本
    pub fn config(&self) -> Config {
        self.lock().config.clone()
    }

    /// 合并部分配置，不校验 URL
    pub fn set_config(&self, patch: ConfigPatch) {
        debug!("更新配置: {:?}", patch_summary(&patch));
        self.lock().config.apply(patch);
    }

    // ========== 历史记录 ==========

    /// 追加一条记录（不去重，不限数量）
    pub fn append(&self, entry: HistoryEntry) {
        let mut state = self.lock();
        state.history.push(entry);
        debug!("历史记录 +1，当前共 {} 条", state.history.len());
    }

    /// 按类型过滤并排序，返回副本
    pub fn list(&self, filter: HistoryFilter, order: SortOrder) -> Vec<HistoryEntry> {
        let state = self.lock();
        let filtered = state.history.iter().filter(|entry| filter.matches(entry));

        match order {
            SortOrder::OldestFirst => filtered.cloned().collect(),
            SortOrder::NewestFirst => {
                let mut entries: Vec<HistoryEntry> = filtered.cloned().collect();
                entries.reverse();
                entries
            }
        }
    }

    /// 按插入顺序取出第 `index` 条（从 0 开始）
    pub fn get(&self, index: usize) -> Option<HistoryEntry> {
        self.lock().history.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().history.is_empty()
    }

    /// 清空历史记录（不可恢复）
    pub fn clear(&self) {
        let mut state = self.lock();
        let removed = state.history.len();
        state.history.clear();
        info!("🗑️ 已清空 {} 条历史记录", removed);
    }

    /// 统计各类型数量
    pub fn stats(&self) -> HistoryStats {
        let state = self.lock();
        let analysis_count = state
            .history
            .iter()
            .filter(|entry| entry.kind == HistoryKind::Analysis)
            .count();
        let rag_count = state
            .history
            .iter()
            .filter(|entry| entry.kind == HistoryKind::Rag)
            .count();

        HistoryStats {
            total: state.history.len(),
            analysis_count,
            rag_count,
        }
    }

    // ========== 缓存 ==========

    /// 为问答缓存的提取文本
    pub fn cached_text(&self) -> Option<String> {
        self.lock().cached_text.clone()
    }

    pub fn set_cached_text(&self, text: impl Into<String>) {
        self.lock().cached_text = Some(text.into());
    }

    /// 最近一次成功的分析或问答结果
    pub fn last_result(&self) -> Option<HistoryPayload> {
        self.lock().last_result.clone()
    }

    pub fn set_last_result(&self, payload: HistoryPayload) {
        self.lock().last_result = Some(payload);
    }
}

/// 日志里不输出 API Key
fn patch_summary(patch: &ConfigPatch) -> (Option<&str>, Option<&str>, bool) {
    (
        patch.analysis_endpoint_url.as_deref(),
        patch.rag_endpoint_url.as_deref(),
        patch.api_key.is_some(),
    )
}
