pub mod audit;
pub mod conversation;

pub use audit::{Batch, Chunk, Section};
pub use conversation::{ChatMessage, ConversationState, Role, Stage};
