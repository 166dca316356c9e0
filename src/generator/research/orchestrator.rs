use crate::error::AuditResult;
use crate::generator::context::GeneratorContext;
use crate::generator::research::memory::ChunkRetriever;
use crate::generator::research::worker::AuditWorker;
use crate::types::{Batch, Chunk};
use crate::utils::threads::do_parallel_with_limit;

/// 多Worker调研编排器
#[derive(Default)]
pub struct ResearchOrchestrator;

impl ResearchOrchestrator {
    /// 并发执行所有批次的Worker，全部结束后按批次序号返回存储的Chunk。
    /// 任一Worker失败时返回批次序号最小的那个错误，不返回部分结果。
    pub async fn execute_research_pipeline(
        &self,
        context: &GeneratorContext,
        run_id: &str,
        brand: &str,
        batches: &[Batch],
    ) -> AuditResult<Vec<Chunk>> {
        let max_parallels = context.config.llm.max_parallels;
        tracing::info!(
            brand,
            run_id,
            "🚀 开始品牌调研：{}个Worker，最大并发数：{}",
            batches.len(),
            max_parallels
        );

        let worker_futures: Vec<_> = batches
            .iter()
            .map(|batch| {
                Box::pin(async move { AuditWorker::new(batch).run(context, run_id, brand).await })
            })
            .collect();

        let results = do_parallel_with_limit(worker_futures, max_parallels).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if let Some(err) = results.into_iter().find_map(Result::err) {
            tracing::error!(failed, "❌ {}个Worker失败: {}", failed, err);
            return Err(err);
        }

        let mut chunks = Vec::with_capacity(batches.len());
        for batch in batches {
            if let Some(chunk) = context.get_chunk(run_id, batch.index).await {
                chunks.push(chunk);
            }
        }

        tracing::info!("✓ 品牌调研完成，共{}个Chunk", chunks.len());
        Ok(chunks)
    }
}
