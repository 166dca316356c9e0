use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    cache::CacheManager,
    config::Config,
    llm::{LLMClient, TextGenerator},
    memory::Memory,
};

#[derive(Clone)]
pub struct GeneratorContext {
    /// 文本生成能力，用于与AI通信
    pub generator: Arc<dyn TextGenerator>,
    /// 配置
    pub config: Config,
    /// 缓存管理器
    pub cache_manager: Arc<RwLock<CacheManager>>,
    /// 生成器记忆
    pub memory: Arc<RwLock<Memory>>,
}

impl GeneratorContext {
    /// 使用配置中的LLM Provider创建上下文
    pub fn new(config: Config) -> Result<Self> {
        let llm_client = LLMClient::new(config.clone())?;
        Ok(Self::with_generator(config, Arc::new(llm_client)))
    }

    /// 使用指定的文本生成能力创建上下文
    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let cache_manager = Arc::new(RwLock::new(CacheManager::new(config.cache.clone())));
        let memory = Arc::new(RwLock::new(Memory::new()));

        Self {
            generator,
            config,
            cache_manager,
            memory,
        }
    }

    /// 存储数据到 Memory
    pub async fn store_to_memory<T>(&self, scope: &str, key: &str, data: T) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        let mut memory = self.memory.write().await;
        memory.store(scope, key, data)
    }

    /// 从 Memory 获取数据
    pub async fn get_from_memory<T>(&self, scope: &str, key: &str) -> Option<T>
    where
        T: for<'a> Deserialize<'a> + Send + Sync,
    {
        let memory = self.memory.read().await;
        memory.get(scope, key)
    }

    /// 获取作用域内的所有数据键
    pub async fn list_memory_keys(&self, scope: &str) -> Vec<String> {
        let memory = self.memory.read().await;
        memory.list_keys(scope)
    }

    /// 清除作用域内的数据
    pub async fn clear_memory_scope(&self, scope: &str) -> usize {
        let mut memory = self.memory.write().await;
        memory.clear_scope(scope)
    }
}
