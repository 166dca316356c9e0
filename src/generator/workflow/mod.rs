use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AuditError, AuditResult};
use crate::generator::compose::ReportCompiler;
use crate::generator::compose::types::Report;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{DiskOutlet, Outlet};
use crate::generator::research::memory::ChunkRetriever;
use crate::generator::research::{self, catalog, planner};
use crate::llm::LLMClient;

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations
            .push((phase_name.to_string(), duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取格式化的执行时间报告，阶段按结束顺序排列
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒",
            self.total_duration().as_secs_f64()
        );
        for (phase, duration) in &self.phase_durations {
            report.push_str(&format!("; {}: {:.3}秒", phase, duration.as_secs_f64()));
        }
        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const RESEARCH: &'static str = "research";
    pub const COMPOSE: &'static str = "compose";
}

/// 对一个品牌执行完整的审计流水线：分批、并发调研、编译。
/// 无论成功与否，本次运行在Memory中的Chunk都会被清理。
pub async fn run_audit(context: &GeneratorContext, brand: &str) -> AuditResult<Report> {
    let brand = brand.trim();
    if brand.is_empty() {
        return Err(AuditError::InvalidInput(
            "a brand is required to run an audit".to_string(),
        ));
    }

    let batches = planner::plan(&catalog::sections(), planner::BATCH_SIZE);
    let run_id = Uuid::new_v4().to_string();
    let mut timing = TimingScope::new();
    tracing::info!(brand, %run_id, "📋 开始品牌审计，共{}个批次", batches.len());

    timing.start_phase(TimingKeys::RESEARCH);
    let chunks = research::execute(context, &run_id, brand, &batches).await;
    timing.end_phase(TimingKeys::RESEARCH);

    let report = match chunks {
        Ok(chunks) => {
            timing.start_phase(TimingKeys::COMPOSE);
            let report = ReportCompiler::new(&batches).compile(brand, &chunks);
            timing.end_phase(TimingKeys::COMPOSE);
            report
        }
        Err(e) => Err(e),
    };

    let cleared = context.clear_chunks(&run_id).await;
    tracing::debug!(%run_id, cleared, "清理本次运行的Chunk");

    match &report {
        Ok(_) => tracing::info!(brand, "✅ 品牌审计完成，{}", timing.generate_timing_report()),
        Err(e) => tracing::error!(brand, "❌ 品牌审计失败: {}", e),
    }

    let cache = context.cache_manager.read().await;
    if cache.is_enabled() {
        let stats = cache.generate_performance_report();
        tracing::debug!(
            hits = stats.cache_hits,
            misses = stats.cache_misses,
            "缓存命中率: {:.1}%",
            stats.hit_rate * 100.0
        );
    }

    report
}

/// 在配置了输出目录时保存报告。保存失败不影响审计结果。
pub async fn save_report(config: &Config, report: &Report) -> Option<PathBuf> {
    let output_dir = config.output_path.as_ref()?;
    match DiskOutlet::new(output_dir).save(report).await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("⚠️ 报告保存失败: {:#}", e);
            None
        }
    }
}

/// 非对话模式：检查模型连接后直接为指定品牌生成报告
pub async fn launch(config: &Config, brand: &str) -> Result<Report> {
    let llm_client = LLMClient::new(config.clone())?;

    // 启动时检查模型连接
    llm_client.check_connection().await?;

    let context = GeneratorContext::with_generator(config.clone(), Arc::new(llm_client));
    let report = run_audit(&context, brand).await?;
    save_report(config, &report).await;

    Ok(report)
}
