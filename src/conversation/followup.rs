//! 报告完成后的追问处理，以及切换品牌的识别

use regex::Regex;
use std::sync::LazyLock;

use crate::conversation::greeting::clean_brand;
use crate::error::{AuditError, AuditResult};
use crate::generator::context::GeneratorContext;
use crate::llm::ModelRole;
use crate::types::{ChatMessage, Role};

/// 追问的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowupResponse {
    pub reply: String,
    /// 用户要求审计另一个品牌时设置
    pub new_audit_brand: Option<String>,
}

pub fn pivot_reply(brand: &str) -> String {
    format!(
        "I'll start a new brand audit for {}. Let me begin the comprehensive analysis...",
        brand
    )
}

/// 要求审计另一个品牌的常见说法，第一个捕获组为品牌
static PIVOT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\banother\s+brand\s*[:\-]?\s*(.+)$",
        r"(?i)\b(?:audit|analy[sz]e|research)\s+(.+?)\s+(?:next|instead)\b",
        r"(?i)\b(?:let's|lets)\s+do\s+(.+?)\s+(?:next|instead)\b",
        r"(?i)^(?:(?:ok|okay|alright|now|please|then)\s*,?\s+)*(?:let's\s+|lets\s+)?(?:switch|move|change)\s+(?:over\s+)?to\s+(?:auditing\s+|analy[sz]ing\s+|researching\s+)?(.+)$",
        r"(?i)\b(?:switch|move|change)\s+(?:over\s+)?to\s+(?:auditing|analy[sz]ing|researching)\s+(.+)$",
        r"(?i)\bnew\s+(?:brand\s+)?(?:audit|report|analysis)\s+(?:for|of|on)\s+(.+)$",
        r"(?i)\b(?:now|next)\s*,?\s+(?:audit|analy[sz]e|research)\s+(.+)$",
        r"(?i)\b(?:start|run|do|create)\s+(?:a|an)?\s*(?:new\s+)?(?:brand\s+)?audit\s+(?:for|of|on)\s+(.+)$",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// 以这些词开头的捕获是话题而不是品牌，如 "a subscription model"
const DETERMINERS: &[&str] = &[
    "a", "an", "another", "any", "different", "her", "his", "its", "more", "my", "other", "our",
    "some", "that", "the", "their", "these", "this", "those", "your",
];

fn names_a_brand(capture: &str) -> Option<String> {
    let first = capture.split_whitespace().next()?.to_lowercase();
    if DETERMINERS.contains(&first.as_str()) {
        return None;
    }
    clean_brand(capture)
}

/// 识别切换品牌的请求。提到的品牌与当前品牌相同时不算切换。
pub fn detect_pivot(current_brand: &str, question: &str) -> Option<String> {
    let question = question.trim().trim_end_matches(['?', '!', '.']);
    let brand = PIVOT_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.captures(question))
        .find_map(|caps| caps.get(1).and_then(|m| names_a_brand(m.as_str())))?;

    if brand.eq_ignore_ascii_case(current_brand.trim()) {
        None
    } else {
        Some(brand)
    }
}

const FOLLOWUP_PROMPT: &str = r#"You are a brand strategy assistant that handles follow-up questions about brand audits that have already been completed.

The brand currently being analyzed is: {brand}

Based on the conversation history and the user's question, provide detailed, well-researched answers about the brand.
Use web search to find current, accurate information to answer their specific questions.
Include proper citations and source links for all claims.

Format your response with proper citations [1], [2], [3] and include source URLs at the end."#;

fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|message| {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, message.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct FollowupHandler<'a> {
    context: &'a GeneratorContext,
}

impl<'a> FollowupHandler<'a> {
    pub fn new(context: &'a GeneratorContext) -> Self {
        Self { context }
    }

    /// 回答关于 `brand` 的追问，或识别出切换品牌的请求
    pub async fn respond(
        &self,
        brand: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> AuditResult<FollowupResponse> {
        if question.trim().is_empty() {
            return Err(AuditError::InvalidInput(
                "follow-up question is empty".to_string(),
            ));
        }

        if let Some(new_brand) = detect_pivot(brand, question) {
            tracing::info!(from = brand, to = %new_brand, "🔀 用户要求审计新品牌");
            return Ok(FollowupResponse {
                reply: pivot_reply(&new_brand),
                new_audit_brand: Some(new_brand),
            });
        }

        let limit = self.context.config.session.history_limit;
        let recent = &history[history.len().saturating_sub(limit)..];
        let system_prompt = FOLLOWUP_PROMPT.replace("{brand}", brand);
        let user_prompt = if recent.is_empty() {
            question.to_string()
        } else {
            format!(
                "Conversation so far:\n\n{}\n\nQuestion: {}",
                format_history(recent),
                question
            )
        };

        let reply = self
            .context
            .generator
            .generate(ModelRole::FollowUp, &system_prompt, &user_prompt)
            .await?;

        Ok(FollowupResponse {
            reply,
            new_audit_brand: None,
        })
    }
}
