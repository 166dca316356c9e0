use crate::error::{AuditError, AuditResult};
use crate::generator::context::GeneratorContext;
use crate::generator::research::memory::ChunkRetriever;
use crate::generator::research::prompt::{
    BASE_INSTRUCTION, render_prompt, section_instructions, worker_request,
};
use crate::llm::ModelRole;
use crate::types::{Batch, Chunk};

/// 缓存中Worker输出的分类
pub const CACHE_CATEGORY: &str = "audit_chunks";

/// 针对单个批次进行调研的Worker，各批次之间互不依赖
pub struct AuditWorker<'a> {
    batch: &'a Batch,
}

impl<'a> AuditWorker<'a> {
    pub fn new(batch: &'a Batch) -> Self {
        Self { batch }
    }

    /// 调用文本生成能力产出本批次的Chunk，并存入本次运行的Memory作用域
    pub async fn run(
        &self,
        context: &GeneratorContext,
        run_id: &str,
        brand: &str,
    ) -> AuditResult<Chunk> {
        let batch = self.batch;
        let brand = brand.trim();
        if brand.is_empty() {
            return Err(AuditError::InvalidInput(format!(
                "batch {} was dispatched without a brand",
                batch.index
            )));
        }
        if batch.sections.is_empty() {
            return Err(AuditError::InvalidInput(format!(
                "batch {} has no sections",
                batch.index
            )));
        }

        tracing::info!(
            batch = batch.index,
            "🤖 audit_worker_{} 调研章节 {}-{}",
            batch.index,
            batch.start_ordinal,
            batch.end_ordinal()
        );

        let system_prompt = render_prompt(BASE_INSTRUCTION, brand, &section_instructions(batch));
        let user_prompt = worker_request(batch, brand);
        let cache_key = format!(
            "{}\n{}\n{}",
            context.config.llm.model_research, system_prompt, user_prompt
        );

        let cached = {
            let cache = context.cache_manager.read().await;
            cache.get::<String>(CACHE_CATEGORY, &cache_key).await.ok().flatten()
        };

        let raw_text = match cached {
            Some(text) => text,
            None => {
                let text = context
                    .generator
                    .generate(ModelRole::Research, &system_prompt, &user_prompt)
                    .await?;
                if text.trim().is_empty() {
                    return Err(AuditError::GenerationFailure(format!(
                        "audit_worker_{} returned empty output",
                        batch.index
                    )));
                }
                let cache = context.cache_manager.read().await;
                if let Err(e) = cache
                    .set(
                        CACHE_CATEGORY,
                        &cache_key,
                        text.clone(),
                        Some(context.config.llm.model_research.clone()),
                    )
                    .await
                {
                    tracing::warn!("⚠️ 写入缓存失败: {}", e);
                }
                text
            }
        };

        let chunk = Chunk::new(batch.index, brand, raw_text);
        context
            .store_chunk(run_id, &chunk)
            .await
            .map_err(|e| AuditError::GenerationFailure(format!("failed to store chunk: {}", e)))?;

        tracing::info!(batch = batch.index, "✓ audit_worker_{} 完成", batch.index);
        Ok(chunk)
    }
}
