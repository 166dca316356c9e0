use regex::Captures;
use std::collections::HashMap;

use crate::error::{AuditError, AuditResult};
use crate::generator::compose::citations::{MARKER_RE, SourceEntry, resolve, split_segments};
use crate::generator::compose::sections::split_sections;
use crate::generator::compose::types::{BibliographyEntry, Report};
use crate::types::{Batch, Chunk};

pub mod citations;
pub mod sections;
pub mod types;


/// 将全部Chunk编译为报告
pub fn compile(brand: &str, batches: &[Batch], chunks: &[Chunk]) -> AuditResult<Report> {
    ReportCompiler::new(batches).compile(brand, chunks)
}

/// 来源的全局身份：可解析的来源按URL或标题合并，无法解析的标记各自独立
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    Known(String),
    Unresolved { batch_index: usize, local: u32 },
}

/// 按首次出现顺序分配全局编号
#[derive(Default)]
struct Bibliography {
    numbers: HashMap<SourceKey, usize>,
    entries: Vec<BibliographyEntry>,
}

impl Bibliography {
    fn number_for(&mut self, batch_index: usize, local: u32, entry: Option<&SourceEntry>) -> usize {
        let key = match entry {
            Some(entry) => SourceKey::Known(entry.identity()),
            None => SourceKey::Unresolved { batch_index, local },
        };
        if let Some(number) = self.numbers.get(&key) {
            return *number;
        }

        let number = self.entries.len() + 1;
        self.entries.push(match entry {
            Some(entry) => BibliographyEntry {
                number,
                text: entry.text.clone(),
                url: entry.url.clone(),
            },
            None => BibliographyEntry {
                number,
                text: BibliographyEntry::UNAVAILABLE.to_string(),
                url: None,
            },
        });
        self.numbers.insert(key, number);
        number
    }
}

/// 用 `lookup` 把正文中的局部编号改写为全局编号。
/// 形如 `[1](...)` 的Markdown链接文字保持不变。
fn renumber(body: &str, mut lookup: impl FnMut(u32) -> usize) -> String {
    MARKER_RE
        .replace_all(body, |caps: &Captures| {
            let whole = &caps[0];
            let end = caps.get(0).map(|m| m.end()).unwrap_or(body.len());
            if body[end..].starts_with('(') {
                return whole.to_string();
            }

            let numbers: Vec<String> = caps[1]
                .split(',')
                .map(|n| match n.trim().parse::<u32>() {
                    Ok(0) | Err(_) => n.trim().to_string(),
                    Ok(local) => lookup(local).to_string(),
                })
                .collect();
            format!("[{}]", numbers.join(", "))
        })
        .into_owned()
}

/// 报告编译器，持有本次运行的批次规划
pub struct ReportCompiler<'a> {
    batches: &'a [Batch],
}

impl<'a> ReportCompiler<'a> {
    pub fn new(batches: &'a [Batch]) -> Self {
        Self { batches }
    }

    /// 按批次顺序拼接Chunk，统一引用编号并生成参考文献。
    /// 同样的输入总是得到同样的报告。
    pub fn compile(&self, brand: &str, chunks: &[Chunk]) -> AuditResult<Report> {
        let brand = brand.trim();
        if brand.is_empty() {
            return Err(AuditError::InvalidInput(
                "cannot compile a report without a brand".to_string(),
            ));
        }

        let ordered = self.order_chunks(chunks)?;

        let mut bibliography = Bibliography::default();
        let mut sections = Vec::new();
        let mut markers = 0usize;

        for (batch, chunk) in self.batches.iter().zip(ordered) {
            let segments = split_segments(&chunk.raw_text);
            let mut bodies = Vec::with_capacity(segments.len());

            for (i, segment) in segments.iter().enumerate() {
                let body = renumber(&segment.body, |local| {
                    markers += 1;
                    bibliography.number_for(batch.index, local, resolve(&segments, i, local))
                });
                if !body.trim().is_empty() {
                    bodies.push(body);
                }
            }

            sections.extend(split_sections(batch, &bodies.join("\n\n")));
        }

        let unresolved = bibliography
            .entries
            .iter()
            .filter(|e| e.is_unavailable())
            .count();
        tracing::info!(
            "📚 报告编译完成: {} 个章节, {} 处引用, {} 条参考文献 ({} 条无法解析)",
            sections.len(),
            markers,
            bibliography.entries.len(),
            unresolved
        );

        Ok(Report {
            brand: brand.to_string(),
            title: format!("{} Brand Audit Report", brand),
            sections,
            bibliography: bibliography.entries,
        })
    }

    /// 校验Chunk集合与批次规划一致，并按批次下标排序
    fn order_chunks<'c>(&self, chunks: &'c [Chunk]) -> AuditResult<Vec<&'c Chunk>> {
        let mut slots: Vec<Option<&Chunk>> = vec![None; self.batches.len()];

        for chunk in chunks {
            let Some(slot) = slots.get_mut(chunk.batch_index) else {
                return Err(AuditError::InvalidInput(format!(
                    "chunk for batch {} does not belong to a plan of {} batches",
                    chunk.batch_index,
                    self.batches.len()
                )));
            };
            if slot.is_some() {
                return Err(AuditError::InvalidInput(format!(
                    "duplicate chunk for batch {}",
                    chunk.batch_index
                )));
            }
            *slot = Some(chunk);
        }

        let missing: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            return Err(AuditError::IncompleteInput { missing });
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
