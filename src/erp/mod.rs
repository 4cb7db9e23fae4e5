pub mod client;
pub mod decoder;

pub use client::ErpClient;
pub use decoder::{decode, key_table, KeyTable};

use thiserror::Error;

/// ERP 查询错误
#[derive(Debug, Error)]
pub enum ErpError {
    /// ERP 没有符合的单据
    #[error("查无相关资料")]
    NotFound,
    /// 回应存在但不是预期的格式
    #[error("回应格式错误: {0}")]
    Malformed(String),
    #[error("查询条件不完整: {0}")]
    InvalidQuery(String),
    #[error("ERP 回应 HTTP 状态 {0}")]
    Status(u16),
    #[error("API 呼叫失败: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ErpError {
    /// "查无资料" 与 "无法解析" 对使用者一律视为查无资料
    pub fn is_not_found(&self) -> bool {
        matches!(self, ErpError::NotFound | ErpError::Malformed(_))
    }
}
