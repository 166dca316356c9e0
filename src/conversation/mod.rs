// 对话模式
// 每条用户消息先由router根据会话状态选择处理方（问候、审计、追问），再由session写回状态

pub mod followup;
pub mod greeting;
pub mod router;
pub mod session;
pub mod store;

pub use greeting::{BrandExtractor, HeuristicExtractor, LlmBrandExtractor};
pub use router::{Dispatch, Router, route};
pub use session::SessionManager;
pub use store::{FileStateStore, MemoryStateStore, StateStore};

#[cfg(test)]
mod tests;
