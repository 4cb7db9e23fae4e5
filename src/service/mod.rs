pub mod label;
pub mod mapper;
pub mod printer;
pub mod session;

pub use label::{LabelService, LookupResult};
pub use mapper::{product_name_advice, FieldMapper, MapError, NameLength, FIELD_ORDER};
pub use printer::{PrintDispatcher, PrintError, MAX_COPIES};
pub use session::{LabelSession, SessionError, SessionId, SessionStore};

use crate::erp::ErpError;
use thiserror::Error;

/// 标签服务错误
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Erp(#[from] ErpError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Print(#[from] PrintError),
    #[error("背景工作异常: {0}")]
    Join(#[from] tokio::task::JoinError),
}
