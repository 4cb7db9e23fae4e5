use serde::{Deserialize, Serialize};

/// 列印工作参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub printer: String,
    pub copies: u32,
}

/// 列印进度 (由背景工作回报)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintProgress {
    Idle,
    Queued,
    Sending,
    Completed,
    Failed,
    Cancelled,
}

/// 列印结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintOutcome {
    pub printer: String,
    pub copies: u32,
    pub template: String,
    pub elapsed_ms: u64,
}
