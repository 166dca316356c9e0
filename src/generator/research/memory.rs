use crate::generator::context::GeneratorContext;
use crate::types::Chunk;
use crate::types::audit::chunk_key;

pub struct MemoryScope;

impl MemoryScope {
    pub const AUDIT_CHUNKS: &'static str = "audit_chunks";

    /// 每次审计运行使用独立的作用域，避免并发会话互相覆盖
    pub fn for_run(run_id: &str) -> String {
        format!("{}:{}", Self::AUDIT_CHUNKS, run_id)
    }
}

#[allow(async_fn_in_trait)]
pub trait ChunkRetriever {
    async fn store_chunk(&self, run_id: &str, chunk: &Chunk) -> anyhow::Result<()>;

    async fn get_chunk(&self, run_id: &str, batch_index: usize) -> Option<Chunk>;

    async fn clear_chunks(&self, run_id: &str) -> usize;
}

impl ChunkRetriever for GeneratorContext {
    /// 存储Worker输出
    async fn store_chunk(&self, run_id: &str, chunk: &Chunk) -> anyhow::Result<()> {
        self.store_to_memory(
            &MemoryScope::for_run(run_id),
            &chunk_key(chunk.batch_index),
            chunk,
        )
        .await
    }

    /// 获取Worker输出
    async fn get_chunk(&self, run_id: &str, batch_index: usize) -> Option<Chunk> {
        self.get_from_memory(&MemoryScope::for_run(run_id), &chunk_key(batch_index))
            .await
    }

    async fn clear_chunks(&self, run_id: &str) -> usize {
        self.clear_memory_scope(&MemoryScope::for_run(run_id)).await
    }
}
