//! 会话状态的持久化

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::types::ConversationState;

/// 以会话ID为键的状态存储
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>>;

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()>;
}

/// 会话ID只允许字母、数字、`-` 与 `_`
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        bail!("无效的会话ID: {:?}", session_id);
    }
    Ok(())
}

/// 进程内存储，进程退出后丢失
#[derive(Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.states.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        self.states
            .write()
            .await
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }
}

/// 每个会话一个JSON文件：`<state_dir>/<session_id>.json`
pub struct FileStateStore {
    state_dir: PathBuf,
}

impl FileStateStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    fn state_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.state_dir.join(format!("{}.json", session_id)))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        let path = self.state_path(session_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("无法读取会话状态: {}", path.display()))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("会话状态格式错误: {}", path.display()))?;
        Ok(Some(state))
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        let path = self.state_path(session_id)?;
        tokio::fs::create_dir_all(&self.state_dir)
            .await
            .with_context(|| format!("无法创建会话目录: {}", self.state_dir.display()))?;

        let content = serde_json::to_string_pretty(state)?;
        // 先写临时文件再重命名，避免中断时留下半个文件
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("无法写入会话状态: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("无法写入会话状态: {}", path.display()))?;
        Ok(())
    }
}
