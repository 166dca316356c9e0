//! 会话路由：根据持久化的状态决定本轮由谁处理

use chrono::Utc;
use std::fmt::Display;
use std::sync::Arc;

use crate::conversation::followup::FollowupHandler;
use crate::conversation::greeting::{BrandExtractor, Greeting};
use crate::generator::context::GeneratorContext;
use crate::generator::workflow::{run_audit, save_report};
use crate::types::{ChatMessage, ConversationState, Stage};

pub const AUDIT_FAILED: &str = "Sorry, the brand audit could not be completed, please try again.";
pub const FOLLOWUP_FAILED: &str = "Sorry, I couldn't answer that right now, please try again.";

/// 本轮的处理方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// 问候与品牌提取；切换品牌时携带预先确定的品牌
    Greeting { seed: Option<String> },
    /// 运行审计流水线
    Audit { brand: String },
    /// 回答追问
    FollowUp { brand: String },
}

impl Display for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Dispatch::Greeting { .. } => "greeting",
            Dispatch::Audit { .. } => "audit",
            Dispatch::FollowUp { .. } => "followup",
        };
        write!(f, "{}", str)
    }
}

/// 按优先级计算本轮的处理方，并完成进入该处理方之前的状态迁移
pub fn route(mut state: ConversationState) -> (ConversationState, Dispatch) {
    if state.has_pending_pivot() {
        let seed = state
            .new_audit_requested
            .take()
            .map(|brand| brand.trim().to_string());
        state.reset();
        return (state, Dispatch::Greeting { seed });
    }
    // 空白的切换请求视为不存在
    state.new_audit_requested = None;

    match (state.brand.clone(), state.has_final_report()) {
        (Some(brand), false) if state.has_brand() => {
            state.stage = Stage::Auditing;
            (state, Dispatch::Audit { brand: brand.trim().to_string() })
        }
        (Some(brand), true) if state.has_brand() => {
            state.stage = Stage::Completed;
            (state, Dispatch::FollowUp { brand: brand.trim().to_string() })
        }
        _ => {
            state.stage = Stage::Greeting;
            (state, Dispatch::Greeting { seed: None })
        }
    }
}

/// 一轮处理的结果
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub state: ConversationState,
    pub reply: String,
    pub dispatch: Dispatch,
    /// 本轮只是确认了品牌，可以不等用户输入直接进入下一轮
    pub continue_chain: bool,
}

fn log_state(label: &str, state: &ConversationState) {
    tracing::debug!(
        label,
        brand = ?state.brand,
        stage = %state.stage,
        has_final_report = state.has_final_report(),
        new_audit_requested = ?state.new_audit_requested,
        history = state.history.len(),
        "会话状态"
    );
}

pub struct Router {
    context: GeneratorContext,
    extractor: Arc<dyn BrandExtractor>,
}

impl Router {
    pub fn new(context: GeneratorContext, extractor: Arc<dyn BrandExtractor>) -> Self {
        Self { context, extractor }
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// 处理一轮对话。`message` 为空表示由上一轮自动衔接，没有新的用户输入。
    /// 失败不会向外传播：回复中给出提示，状态保持可重试。
    pub async fn transition(
        &self,
        state: ConversationState,
        message: Option<&str>,
    ) -> TurnOutcome {
        log_state("turn_start", &state);
        let (mut state, dispatch) = route(state);
        tracing::info!(dispatch = %dispatch, stage = %state.stage, "🧭 路由决策");

        let message = message.map(str::trim).filter(|m| !m.is_empty());
        let mut continue_chain = false;

        let reply = match &dispatch {
            Dispatch::Greeting { seed } => {
                let greeting = match seed {
                    Some(brand) if !brand.is_empty() => Greeting::found(brand.clone()),
                    _ => self.extractor.extract(message.unwrap_or_default()).await,
                };
                state.brand = greeting.brand;
                continue_chain = state.has_brand();
                greeting.reply
            }
            Dispatch::Audit { brand } => match run_audit(&self.context, brand).await {
                Ok(report) => {
                    save_report(&self.context.config, &report).await;
                    let rendered = report.render();
                    state.final_report = Some(rendered.clone());
                    rendered
                }
                Err(e) => {
                    tracing::error!(brand = %brand, "❌ 审计失败: {}", e);
                    AUDIT_FAILED.to_string()
                }
            },
            Dispatch::FollowUp { brand } => {
                let handler = FollowupHandler::new(&self.context);
                match handler
                    .respond(brand, &state.history, message.unwrap_or_default())
                    .await
                {
                    Ok(response) => {
                        if let Some(new_brand) = response.new_audit_brand {
                            state.new_audit_requested = Some(new_brand);
                            continue_chain = true;
                        }
                        response.reply
                    }
                    Err(e) => {
                        tracing::warn!(brand = %brand, "⚠️ 追问处理失败: {}", e);
                        FOLLOWUP_FAILED.to_string()
                    }
                }
            }
        };

        let history_limit = self.context.config.session.history_limit;
        if let Some(message) = message {
            state.push_history(ChatMessage::user(message), history_limit);
        }
        state.push_history(ChatMessage::assistant(reply.clone()), history_limit);
        state.updated_at = Utc::now();
        log_state("turn_end", &state);

        TurnOutcome {
            state,
            reply,
            dispatch,
            continue_chain,
        }
    }
}
