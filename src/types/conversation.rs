use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 会话所处阶段，仅用于描述与日志，路由判断不依赖它
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    Auditing,
    Completed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Stage::Greeting => "greeting",
            Stage::Auditing => "auditing",
            Stage::Completed => "completed",
        };
        write!(f, "{}", str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 跨轮次持久化的会话状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub brand: Option<String>,
    pub stage: Stage,
    pub final_report: Option<String>,
    pub new_audit_requested: Option<String>,
    /// 对话记录，供后续追问使用
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            brand: None,
            stage: Stage::default(),
            final_report: None,
            new_audit_requested: None,
            history: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl ConversationState {
    /// 品牌已知（非空白）
    pub fn has_brand(&self) -> bool {
        is_present(&self.brand)
    }

    pub fn has_final_report(&self) -> bool {
        is_present(&self.final_report)
    }

    pub fn has_pending_pivot(&self) -> bool {
        is_present(&self.new_audit_requested)
    }

    /// 清空四个路由字段，保留对话记录
    pub fn reset(&mut self) {
        self.brand = None;
        self.stage = Stage::Greeting;
        self.final_report = None;
        self.new_audit_requested = None;
    }

    /// 追加一条消息，并只保留最近 `limit` 条
    pub fn push_history(&mut self, message: ChatMessage, limit: usize) {
        self.history.push(message);
        if self.history.len() > limit {
            let overflow = self.history.len() - limit;
            self.history.drain(..overflow);
        }
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
