use crate::types::{Batch, Section};

/// 每个Worker负责的章节数
pub const BATCH_SIZE: usize = 3;

/// 按目录顺序把章节切分为固定大小的批次，最后一个批次可以不满。
/// 批次大小为0时按1处理。
pub fn plan(sections: &[Section], batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    sections
        .chunks(batch_size)
        .enumerate()
        .map(|(index, group)| Batch {
            index,
            sections: group.to_vec(),
            start_ordinal: index * batch_size + 1,
        })
        .collect()
}
