//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AuditError, AuditResult};
use crate::llm::{ModelRole, TextGenerator};

mod providers;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        tracing::info!("🔄 正在检查模型连接...");
        match self
            .prompt(
                ModelRole::Greeting,
                "System: You are a helpful assistant.",
                "Hello",
            )
            .await
        {
            Ok(_) => {
                tracing::info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 按用途选择模型
    pub fn model_for(&self, role: ModelRole) -> &str {
        let llm_config = &self.config.llm;
        match role {
            ModelRole::Research => &llm_config.model_research,
            ModelRole::Greeting => &llm_config.model_greeting,
            ModelRole::FollowUp => &llm_config.model_followup,
        }
    }

    /// 为单次调用加上超时限制，不做重试
    async fn with_timeout<T, Fut>(&self, operation: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let timeout = Duration::from_secs(self.config.llm.timeout_seconds);
        match tokio::time::timeout(timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "模型调用超时（{}秒）",
                self.config.llm.timeout_seconds
            )),
        }
    }

    /// 数据提取方法
    pub async fn extract<T>(
        &self,
        role: ModelRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor = self.client.create_extractor::<T>(
            self.model_for(role),
            system_prompt,
            &self.config.llm,
        );

        self.with_timeout(extractor.extract(user_prompt)).await
    }

    /// 单轮对话方法
    pub async fn prompt(
        &self,
        role: ModelRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let agent = self
            .client
            .create_agent(self.model_for(role), system_prompt, &self.config.llm);

        self.with_timeout(agent.prompt(user_prompt)).await
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(
        &self,
        role: ModelRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> AuditResult<String> {
        tracing::debug!(%role, model = self.model_for(role), "调用模型");
        self.prompt(role, system_prompt, user_prompt)
            .await
            .map_err(|e| AuditError::GenerationFailure(format!("{:#}", e)))
    }
}
