use crate::client::{FetchError, WorkflowBackend};
use crate::config::AuditConfig;
use crate::models::{AuditFinding, InvoiceRecord, InvoiceStatus, SourceMode};
use crate::service::audit_session::{AuditPhase, AuditSession, SessionError, SessionId};
use crate::service::query_view::{self, StatusFilter};
use crate::service::{FallbackSimulator, QueueSnapshot, QueueStore, RefreshReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// 筛选后的队列视图
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub mode: SourceMode,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// 队列同步进行中
    pub refreshing: bool,
    pub total: usize,
    pub records: Vec<InvoiceRecord>,
}

struct DeskInner {
    store: QueueStore,
    backend: Arc<dyn WorkflowBackend>,
    simulator: Arc<FallbackSimulator>,
    /// 当前会话；只有 id 与当前一致的审核任务才能写入
    session: watch::Sender<AuditSession>,
    surface_remote_failures: bool,
}

/// 发票审核编排器
///
/// 持有队列、后端客户端、本地模拟器和当前审核会话。可廉价克隆，
/// 后台审核任务各持一份。
#[derive(Clone)]
pub struct AuditDesk {
    inner: Arc<DeskInner>,
}

impl AuditDesk {
    pub fn new(
        backend: Arc<dyn WorkflowBackend>,
        simulator: FallbackSimulator,
        audit: &AuditConfig,
    ) -> Self {
        let simulator = Arc::new(simulator);
        let (session, _) = watch::channel(AuditSession::idle(SessionId::default()));

        Self {
            inner: Arc::new(DeskInner {
                store: QueueStore::new(backend.clone(), simulator.clone()),
                backend,
                simulator,
                session,
                surface_remote_failures: audit.surface_remote_failures,
            }),
        }
    }

    /// 刷新队列，并丢弃当前会话 (进行中的审核结果将被忽略)
    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.refresh_report().await.outcome
    }

    /// 同 `refresh`，并带回本次刷新落地的模式
    pub async fn refresh_report(&self) -> RefreshReport {
        let report = self.inner.store.refresh_report().await;
        self.reset_session();
        report
    }

    pub async fn mode(&self) -> SourceMode {
        self.inner.store.mode().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.store.is_refreshing()
    }

    pub async fn lookup(&self, invoice_id: &str) -> Option<(InvoiceRecord, SourceMode)> {
        self.inner.store.lookup(invoice_id).await
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        self.inner.store.snapshot().await
    }

    pub async fn query(&self, filter: StatusFilter, search: &str) -> QueueView {
        let snapshot = self.inner.store.snapshot().await;
        let records = query_view::filter_queue(&snapshot.records, filter, search);

        QueueView {
            mode: snapshot.mode,
            refreshed_at: snapshot.refreshed_at,
            refreshing: self.inner.store.is_refreshing(),
            total: snapshot.records.len(),
            records,
        }
    }

    pub fn session(&self) -> AuditSession {
        self.inner.session.borrow().clone()
    }

    /// 订阅会话变化 (展示层使用)
    pub fn subscribe(&self) -> watch::Receiver<AuditSession> {
        self.inner.session.subscribe()
    }

    /// 选中发票并启动审核，返回新会话 id
    ///
    /// 之前的会话立即被取代；它的后台任务仍可能完成，但结果会被丢弃。
    pub async fn select(&self, invoice_id: &str) -> Result<SessionId, SessionError> {
        let (invoice, mode) = self
            .inner
            .store
            .lookup(invoice_id)
            .await
            .ok_or_else(|| SessionError::UnknownInvoice(invoice_id.to_string()))?;

        let mut id = SessionId::default();
        let mut superseded = None;
        let subject = invoice.clone();
        self.inner.session.send_modify(|s| {
            if s.phase().is_in_flight() {
                superseded = Some(s.id());
            }
            id = s.id().next();
            *s = AuditSession::begin(id, subject, mode);
        });
        if let Some(old) = superseded {
            tracing::debug!("Session {} superseded while in flight", old);
        }
        tracing::info!("Audit session {} started for invoice {} ({:?})", id, invoice_id, mode);

        let desk = self.clone();
        tokio::spawn(async move {
            desk.run_audit(id, invoice, mode).await;
        });

        Ok(id)
    }

    pub fn clear_selection(&self) {
        self.reset_session();
    }

    /// 人工批准 -> Posted
    pub async fn approve(&self) -> Result<InvoiceStatus, SessionError> {
        self.decide(InvoiceStatus::Posted).await
    }

    /// 人工驳回 -> Disputed
    pub async fn dispute(&self) -> Result<InvoiceStatus, SessionError> {
        self.decide(InvoiceStatus::Disputed).await
    }

    async fn decide(&self, status: InvoiceStatus) -> Result<InvoiceStatus, SessionError> {
        let (id, invoice_id) = {
            let session = self.inner.session.borrow();
            let subject = session.decision_subject()?;
            (session.id(), subject.invoice_id.clone())
        };

        self.inner.store.apply_status_change(&invoice_id, status).await;
        self.inner.session.send_if_modified(|s| {
            if s.id() != id {
                return false;
            }
            *s = AuditSession::idle(id.next());
            true
        });
        tracing::info!("Invoice {} decided: {}", invoice_id, status);

        Ok(status)
    }

    fn reset_session(&self) {
        self.inner.session.send_modify(|s| {
            let next = s.id().next();
            *s = AuditSession::idle(next);
        });
    }

    async fn run_audit(&self, id: SessionId, invoice: InvoiceRecord, mode: SourceMode) {
        match mode {
            SourceMode::Live => self.run_remote_audit(id, &invoice).await,
            SourceMode::Simulated => self.run_simulated_audit(id, &invoice).await,
        }
    }

    /// 实时模式: 一次远端往返，中间没有可观察的 Matching 阶段
    async fn run_remote_audit(&self, id: SessionId, invoice: &InvoiceRecord) {
        let outcome = self
            .inner
            .backend
            .process_invoice(&invoice.invoice_id, &invoice.po_number, &invoice.amount)
            .await;

        match outcome {
            Ok(finding) => {
                self.apply(id, |s| s.complete(finding));
            }
            Err(e) => {
                // 单次失败只影响本会话，队列保持 Live
                tracing::warn!("Remote audit for invoice {} failed: {}", invoice.invoice_id, e);
                if self.inner.surface_remote_failures {
                    self.apply(id, |s| s.fail(e.to_string()));
                } else {
                    self.apply(id, |s| s.complete(AuditFinding::connection_failed()));
                }
            }
        }
    }

    async fn run_simulated_audit(&self, id: SessionId, invoice: &InvoiceRecord) {
        let simulator = self.inner.simulator.clone();

        for stage in simulator.stages() {
            tokio::time::sleep(stage.delay).await;

            let applied = match stage.phase {
                AuditPhase::Matching => self.apply(id, |s| s.advance_to_matching()),
                AuditPhase::Ready => {
                    let finding = simulator.simulate_audit(invoice);
                    self.apply(id, |s| s.complete(finding))
                }
                other => {
                    tracing::error!("Unexpected simulated stage {:?}", other);
                    false
                }
            };
            if !applied {
                return;
            }
        }
    }

    /// 仅当会话仍是当前会话时执行迁移；过期结果直接丢弃
    fn apply<F>(&self, id: SessionId, transition: F) -> bool
    where
        F: FnOnce(&mut AuditSession) -> Result<(), SessionError>,
    {
        self.inner.session.send_if_modified(|s| {
            if s.id() != id {
                tracing::debug!("Discarding stale result of session {} (current {})", id, s.id());
                return false;
            }
            match transition(s) {
                Ok(()) => {
                    tracing::debug!("Session {} -> {:?}", id, s.phase());
                    true
                }
                Err(e) => {
                    tracing::warn!("Session {}: {}", id, e);
                    false
                }
            }
        })
    }
}
