//! 品牌审计流程中的领域错误

use thiserror::Error;

/// 审计流水线可能产生的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// 调用方传入了不完整的参数（缺少品牌或批次为空）
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 外部文本生成能力调用失败或超时
    #[error("generation failed: {0}")]
    GenerationFailure(String),

    /// 编译时缺少部分批次的输出
    #[error("incomplete input: missing chunks for batches {missing:?}")]
    IncompleteInput { missing: Vec<usize> },
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;
