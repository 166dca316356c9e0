use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::conversation::router::Router;
use crate::conversation::store::{StateStore, validate_session_id};
use crate::types::ConversationState;

/// 一次用户输入最多衔接的处理轮数：追问(切换) → 问候 → 审计
const MAX_CHAINED_DISPATCHES: usize = 3;

/// 会话驱动：同一会话的轮次串行执行，每轮结束后写回状态
pub struct SessionManager {
    router: Router,
    store: Arc<dyn StateStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(router: Router, store: Arc<dyn StateStore>) -> Self {
        Self {
            router,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// 当前会话状态，不存在时为初始状态
    pub async fn state(&self, session_id: &str) -> Result<ConversationState> {
        validate_session_id(session_id)?;
        Ok(self.store.load(session_id).await?.unwrap_or_default())
    }

    /// 处理一条用户消息，返回本次产生的全部回复。
    /// 开启 `auto_continue` 时，确认品牌之后会直接衔接下一轮。
    pub async fn handle_message(&self, session_id: &str, message: &str) -> Result<Vec<String>> {
        validate_session_id(session_id)?;
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let auto_continue = self.router.context().config.session.auto_continue;
        let mut state = self.store.load(session_id).await?.unwrap_or_default();
        let mut input = Some(message);
        let mut replies = Vec::new();

        for _ in 0..MAX_CHAINED_DISPATCHES {
            let outcome = self.router.transition(state, input.take()).await;
            state = outcome.state;
            self.store.save(session_id, &state).await?;
            replies.push(outcome.reply);

            if !(auto_continue && outcome.continue_chain) {
                break;
            }
            tracing::debug!(session_id, dispatch = %outcome.dispatch, "自动衔接下一轮");
        }

        Ok(replies)
    }
}
