use crate::client::{FetchError, WorkflowBackend};
use crate::models::{InvoiceRecord, InvoiceStatus, SourceMode};
use crate::service::FallbackSimulator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// 队列快照：整体替换，读者看不到半更新状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub mode: SourceMode,
    pub records: Vec<InvoiceRecord>,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// 已完成的刷新次数 (含降级)
    pub generation: u64,
}

impl QueueSnapshot {
    fn empty() -> Self {
        Self {
            mode: SourceMode::Live,
            records: Vec::new(),
            refreshed_at: None,
            generation: 0,
        }
    }
}

/// 一次刷新的结果：落地的模式 + 远端调用结果
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub mode: SourceMode,
    pub outcome: Result<(), FetchError>,
}

/// 刷新进行中标志，离开作用域 (包括 future 被丢弃) 时复位
struct RefreshingGuard<'a>(&'a AtomicBool);

impl<'a> RefreshingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 发票队列存储
pub struct QueueStore {
    backend: Arc<dyn WorkflowBackend>,
    simulator: Arc<FallbackSimulator>,
    snapshot: RwLock<QueueSnapshot>,
    /// 刷新串行化：并发的第二次刷新排队等待第一次完成
    refresh_gate: Mutex<()>,
    /// 持有 refresh_gate 期间为 true
    refreshing: AtomicBool,
}

impl QueueStore {
    pub fn new(backend: Arc<dyn WorkflowBackend>, simulator: Arc<FallbackSimulator>) -> Self {
        Self {
            backend,
            simulator,
            snapshot: RwLock::new(QueueSnapshot::empty()),
            refresh_gate: Mutex::new(()),
            refreshing: AtomicBool::new(false),
        }
    }

    /// 从远端同步队列
    ///
    /// 成功: 替换记录集并切到 Live。失败: 切到 Simulated 并装入种子数据，
    /// 仍然返回错误供调用方记录。
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.refresh_report().await.outcome
    }

    /// 同 `refresh`，并带回本次刷新落地的模式
    pub async fn refresh_report(&self) -> RefreshReport {
        let _gate = self.refresh_gate.lock().await;
        let _refreshing = RefreshingGuard::raise(&self.refreshing);

        let (mode, records, outcome) = match self.backend.fetch_queue().await {
            Ok(records) => {
                tracing::info!("Queue refreshed from backend: {} invoices", records.len());
                (SourceMode::Live, records, Ok(()))
            }
            Err(e) => {
                tracing::warn!("Queue fetch failed, switching to simulated mode: {}", e);
                (SourceMode::Simulated, self.simulator.seed_queue(), Err(e))
            }
        };

        let mut snapshot = self.snapshot.write().await;
        let generation = snapshot.generation + 1;
        if snapshot.mode != mode {
            tracing::info!("Queue source mode {:?} -> {:?}", snapshot.mode, mode);
        }
        *snapshot = QueueSnapshot {
            mode,
            records,
            refreshed_at: Some(Utc::now()),
            generation,
        };

        RefreshReport { mode, outcome }
    }

    /// 是否有刷新正在进行
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn mode(&self) -> SourceMode {
        self.snapshot.read().await.mode
    }

    /// 按发票号查找，同时返回当前模式 (同一次读取)
    pub async fn lookup(&self, invoice_id: &str) -> Option<(InvoiceRecord, SourceMode)> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .records
            .iter()
            .find(|inv| inv.invoice_id == invoice_id)
            .map(|inv| (inv.clone(), snapshot.mode))
    }

    /// 人工决策后替换记录状态；发票不存在时静默忽略
    pub async fn apply_status_change(&self, invoice_id: &str, status: InvoiceStatus) -> bool {
        let mut snapshot = self.snapshot.write().await;
        match snapshot.records.iter_mut().find(|inv| inv.invoice_id == invoice_id) {
            Some(slot) => {
                *slot = slot.with_status(status);
                tracing::info!("Invoice {} status -> {}", invoice_id, status);
                true
            }
            None => {
                tracing::debug!("Status change for unknown invoice {} ignored", invoice_id);
                false
            }
        }
    }
}
