// 品牌调研阶段
// 目录（catalog）→ 分批（planner）→ 每批一个Worker并发调研（worker）→ 结果按批次序号存入Memory

use crate::error::AuditResult;
use crate::generator::context::GeneratorContext;
use crate::generator::research::orchestrator::ResearchOrchestrator;
use crate::types::{Batch, Chunk};

pub mod catalog;
pub mod memory;
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod worker;

/// 执行调研阶段
pub async fn execute(
    context: &GeneratorContext,
    run_id: &str,
    brand: &str,
    batches: &[Batch],
) -> AuditResult<Vec<Chunk>> {
    let orchestrator = ResearchOrchestrator;
    orchestrator
        .execute_research_pipeline(context, run_id, brand, batches)
        .await
}
