#![allow(dead_code)]

use bigdecimal::BigDecimal;
use invoice_audit_hub::models::{AuditFinding, InvoiceRecord, InvoiceStatus};
use invoice_audit_hub::{FetchError, WorkflowBackend};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 可编程的假后端
pub struct FakeBackend {
    queue: Mutex<Result<Vec<InvoiceRecord>, FetchError>>,
    audit: Mutex<Result<AuditFinding, FetchError>>,
    audit_latency: Duration,
    audit_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(
        queue: Result<Vec<InvoiceRecord>, FetchError>,
        audit: Result<AuditFinding, FetchError>,
        audit_latency: Duration,
    ) -> Self {
        Self {
            queue: Mutex::new(queue),
            audit: Mutex::new(audit),
            audit_latency,
            audit_calls: AtomicUsize::new(0),
        }
    }

    /// 完全不可用的后端
    pub fn down() -> Self {
        Self::new(
            Err(FetchError::Status(503)),
            Err(FetchError::Status(503)),
            Duration::ZERO,
        )
    }

    pub fn set_queue(&self, queue: Result<Vec<InvoiceRecord>, FetchError>) {
        *self.queue.lock().unwrap() = queue;
    }

    pub fn audit_calls(&self) -> usize {
        self.audit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WorkflowBackend for FakeBackend {
    async fn fetch_queue(&self) -> Result<Vec<InvoiceRecord>, FetchError> {
        self.queue.lock().unwrap().clone()
    }

    async fn process_invoice(
        &self,
        _invoice_id: &str,
        _po_number: &str,
        _amount: &BigDecimal,
    ) -> Result<AuditFinding, FetchError> {
        self.audit_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.audit_latency).await;
        self.audit.lock().unwrap().clone()
    }
}

pub fn invoice(id: &str, vendor: &str, amount: i64, po: &str) -> InvoiceRecord {
    InvoiceRecord {
        invoice_id: id.to_string(),
        vendor_name: vendor.to_string(),
        invoice_date: None,
        amount: BigDecimal::from(amount),
        status: InvoiceStatus::Ready,
        po_number: po.to_string(),
    }
}
