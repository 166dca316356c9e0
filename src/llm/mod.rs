//! 文本生成能力的抽象，以及基于rig的实现

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::AuditResult;

pub mod client;

pub use client::LLMClient;

/// 调用方的用途，决定使用哪个模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelRole {
    /// 章节调研，需要联网搜索
    Research,
    /// 问候与品牌提取
    Greeting,
    /// 报告完成后的追问
    FollowUp,
}

impl Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ModelRole::Research => "research",
            ModelRole::Greeting => "greeting",
            ModelRole::FollowUp => "followup",
        };
        write!(f, "{}", str)
    }
}

/// 外部文本生成/搜索能力：输入prompt，返回生成的文本
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        role: ModelRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> AuditResult<String>;
}
