use serde::{Deserialize, Serialize};

/// 报告中的一个固定章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// 章节名称
    pub name: String,
    /// 在最终报告中的序号（从1开始），由目录顺序决定
    pub ordinal: usize,
    /// 该章节需要覆盖的要点
    pub instructions: String,
}

impl Section {
    pub fn new(ordinal: usize, name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            instructions: instructions.into(),
        }
    }
}

/// 交给单个Worker的一组连续章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub index: usize,
    pub sections: Vec<Section>,
    /// 本批次覆盖的第一个全局章节序号
    pub start_ordinal: usize,
}

impl Batch {
    /// 本批次覆盖的最后一个全局章节序号
    pub fn end_ordinal(&self) -> usize {
        self.start_ordinal + self.sections.len().saturating_sub(1)
    }
}

/// 存储批次输出时使用的Memory键
pub fn chunk_key(batch_index: usize) -> String {
    format!("chunk_{}", batch_index)
}

/// 单个Worker针对单个批次的原始输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub batch_index: usize,
    pub brand: String,
    pub raw_text: String,
}

impl Chunk {
    pub fn new(batch_index: usize, brand: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            batch_index,
            brand: brand.into(),
            raw_text: raw_text.into(),
        }
    }
}
