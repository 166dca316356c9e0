use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 缓存性能监控器
#[derive(Clone, Default)]
pub struct CachePerformanceMonitor {
    metrics: Arc<CacheMetrics>,
}

/// 缓存指标
#[derive(Default)]
pub struct CacheMetrics {
    pub cache_hits: AtomicUsize,
    pub cache_misses: AtomicUsize,
    pub cache_writes: AtomicUsize,
    pub cache_errors: AtomicUsize,
    /// 分类命中/未命中统计
    pub category_metrics: std::sync::RwLock<HashMap<String, (usize, usize)>>,
}

/// 缓存性能报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePerformanceReport {
    /// 缓存命中率
    pub hit_rate: f64,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_writes: usize,
    pub cache_errors: usize,
    /// 分类统计（命中, 未命中）
    pub category_stats: HashMap<String, (usize, usize)>,
}

impl CachePerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_category(&self, category: &str, hit: bool) {
        if let Ok(mut category_map) = self.metrics.category_metrics.write() {
            let entry = category_map.entry(category.to_string()).or_default();
            if hit {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self, category: &str) {
        self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.bump_category(category, true);
        tracing::info!("   💰 缓存命中 [{}] - 跳过模型调用", category);
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self, category: &str) {
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        self.bump_category(category, false);
        tracing::debug!("   ⌛ 缓存未命中 [{}] - 需要进行AI推理", category);
    }

    /// 记录缓存写入
    pub fn record_cache_write(&self, category: &str) {
        self.metrics.cache_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("   💾 缓存写入 [{}] - 结果已缓存", category);
    }

    /// 记录缓存错误
    pub fn record_cache_error(&self, category: &str, error: &str) {
        self.metrics.cache_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("   ❌ 缓存错误 [{}]: {}", category, error);
    }

    /// 生成性能报告
    pub fn generate_report(&self) -> CachePerformanceReport {
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let total_operations = hits + misses;

        let hit_rate = if total_operations > 0 {
            hits as f64 / total_operations as f64
        } else {
            0.0
        };

        let category_stats = self
            .metrics
            .category_metrics
            .read()
            .map(|category_map| category_map.clone())
            .unwrap_or_default();

        CachePerformanceReport {
            hit_rate,
            cache_hits: hits,
            cache_misses: misses,
            cache_writes: self.metrics.cache_writes.load(Ordering::Relaxed),
            cache_errors: self.metrics.cache_errors.load(Ordering::Relaxed),
            category_stats,
        }
    }
}
