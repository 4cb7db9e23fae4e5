use crate::engine::{template_name, EngineError, LabelDocument};
use crate::models::{PrintJob, PrintOutcome, PrintProgress};
use crate::service::session::SharedDocument;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

pub const MAX_COPIES: u32 = 999;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("列印份数须为 1-{MAX_COPIES}, 收到 {0}")]
    InvalidCopies(u32),
    #[error("未选择印表机")]
    NoPrinter,
    #[error("已有列印工作进行中")]
    Busy,
    #[error("列印工作已取消")]
    Cancelled,
    #[error("列印工作超时 ({0:?})")]
    Timeout(Duration),
    #[error("列印失败: {0}")]
    Engine(#[from] EngineError),
    #[error("列印工作发生异常: {0}")]
    Worker(String),
}

/// 工作结束 (含 panic) 时释放列印槽
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 已保留的列印槽
///
/// 未交给 [`PrintDispatcher::run`] 就被丢弃时, 释放列印槽并把进度改回 `Idle`。
pub struct PrintSlot {
    guard: Option<SlotGuard>,
    progress: Arc<watch::Sender<PrintProgress>>,
}

impl Drop for PrintSlot {
    fn drop(&mut self) {
        if self.guard.is_some() {
            self.progress.send_replace(PrintProgress::Idle);
        }
    }
}

/// 列印派送: 同一时间只允许一个列印工作, 送印在背景执行绪执行
pub struct PrintDispatcher {
    in_flight: Arc<AtomicBool>,
    progress: Arc<watch::Sender<PrintProgress>>,
    timeout: Duration,
}

impl PrintDispatcher {
    pub fn new(timeout: Duration) -> Self {
        let (progress, _) = watch::channel(PrintProgress::Idle);
        Self {
            in_flight: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(progress),
            timeout,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PrintProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> PrintProgress {
        *self.progress.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 取消排队中的工作
    ///
    /// 只有进度仍为 `Queued` 时有效; 已进入引擎的送印无法中断, 回传 false。
    pub fn cancel(&self) -> bool {
        let accepted = self.progress.send_if_modified(|p| {
            if *p == PrintProgress::Queued {
                *p = PrintProgress::Cancelled;
                true
            } else {
                false
            }
        });
        if accepted {
            tracing::info!("列印工作已取消 (尚未送出)");
        }
        accepted
    }

    /// 检查参数并保留列印槽; 已有工作时立即回传 [`PrintError::Busy`]
    pub fn reserve(&self, job: &PrintJob) -> Result<PrintSlot, PrintError> {
        if !(1..=MAX_COPIES).contains(&job.copies) {
            return Err(PrintError::InvalidCopies(job.copies));
        }
        if job.printer.trim().is_empty() {
            return Err(PrintError::NoPrinter);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PrintError::Busy);
        }
        self.progress.send_replace(PrintProgress::Queued);
        Ok(PrintSlot {
            guard: Some(SlotGuard(Arc::clone(&self.in_flight))),
            progress: Arc::clone(&self.progress),
        })
    }

    /// 保留列印槽后立即送印
    pub async fn dispatch(
        &self,
        document: SharedDocument,
        job: PrintJob,
    ) -> Result<PrintOutcome, PrintError> {
        let slot = self.reserve(&job)?;
        self.run(slot, document, job).await
    }

    /// 以已保留的列印槽送印
    pub async fn run(
        &self,
        mut slot: PrintSlot,
        document: SharedDocument,
        job: PrintJob,
    ) -> Result<PrintOutcome, PrintError> {
        let guard = slot.guard.take();
        drop(slot);
        tracing::info!("开始列印标签: 印表机={}, 份数={}", job.printer, job.copies);

        let progress = Arc::clone(&self.progress);
        let started = Instant::now();

        let worker = tokio::task::spawn_blocking(move || {
            let _slot = guard;
            let sending = progress.send_if_modified(|p| {
                if *p == PrintProgress::Queued {
                    *p = PrintProgress::Sending;
                    true
                } else {
                    false
                }
            });
            if !sending {
                return Err(PrintError::Cancelled);
            }

            let mut doc = document
                .lock()
                .map_err(|_| PrintError::Worker("标签模板锁定失败".to_string()))?;
            let template = template_name(doc.template());

            match doc.print(&job.printer, job.copies) {
                Ok(()) => {
                    progress.send_replace(PrintProgress::Completed);
                    Ok(PrintOutcome {
                        printer: job.printer,
                        copies: job.copies,
                        template,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    })
                }
                Err(e) => {
                    progress.send_replace(PrintProgress::Failed);
                    Err(PrintError::Engine(e))
                }
            }
        });

        match tokio::time::timeout(self.timeout, worker).await {
            Ok(Ok(result)) => {
                match &result {
                    Ok(outcome) => tracing::info!(
                        "列印工作完成: {} 份 -> {} ({} ms)",
                        outcome.copies,
                        outcome.printer,
                        outcome.elapsed_ms
                    ),
                    Err(e) => tracing::error!("列印工作失败: {}", e),
                }
                result
            }
            Ok(Err(join_err)) => {
                self.progress.send_replace(PrintProgress::Failed);
                tracing::error!("列印工作发生异常: {}", join_err);
                Err(PrintError::Worker(join_err.to_string()))
            }
            Err(_) => {
                // 背景送印仍在进行, 结束后才释放列印槽
                tracing::error!("列印工作超时 ({:?})", self.timeout);
                Err(PrintError::Timeout(self.timeout))
            }
        }
    }
}
