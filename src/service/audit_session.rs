use crate::models::{AuditFinding, InvoiceRecord, SourceMode};
use serde::Serialize;
use std::fmt;

/// 会话标识，每次选择/清空/刷新都会递增
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next(self) -> Self {
        SessionId(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 审核阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuditPhase {
    Idle,
    Extracting,
    Matching,
    Ready,
    Failed,
}

impl AuditPhase {
    /// 合法迁移表
    fn can_enter(self, to: AuditPhase) -> bool {
        use AuditPhase::*;
        matches!(
            (self, to),
            (Extracting, Matching) | (Extracting | Matching, Ready) | (Extracting | Matching, Failed)
        )
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, AuditPhase::Extracting | AuditPhase::Matching)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invoice {0} is not in the current queue")]
    UnknownInvoice(String),

    #[error("no decision possible while the session is {0:?}")]
    NotReady(AuditPhase),

    #[error("invalid audit transition {from:?} -> {to:?}")]
    InvalidTransition { from: AuditPhase, to: AuditPhase },
}

/// 单张发票的审核会话 (值对象)
///
/// 只持有发票的只读副本；状态变更通过 QueueStore 替换记录完成。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSession {
    id: SessionId,
    subject: Option<InvoiceRecord>,
    phase: AuditPhase,
    finding: Option<AuditFinding>,
    /// 本次审核走的路径 (实时/模拟)
    mode: Option<SourceMode>,
    failure: Option<String>,
}

impl AuditSession {
    pub fn idle(id: SessionId) -> Self {
        Self {
            id,
            subject: None,
            phase: AuditPhase::Idle,
            finding: None,
            mode: None,
            failure: None,
        }
    }

    /// 选中发票后立即进入 Extracting
    pub fn begin(id: SessionId, invoice: InvoiceRecord, mode: SourceMode) -> Self {
        Self {
            id,
            subject: Some(invoice),
            phase: AuditPhase::Extracting,
            finding: None,
            mode: Some(mode),
            failure: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn subject(&self) -> Option<&InvoiceRecord> {
        self.subject.as_ref()
    }

    pub fn phase(&self) -> AuditPhase {
        self.phase
    }

    pub fn finding(&self) -> Option<&AuditFinding> {
        self.finding.as_ref()
    }

    pub fn mode(&self) -> Option<SourceMode> {
        self.mode
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn enter(&mut self, to: AuditPhase) -> Result<(), SessionError> {
        if !self.phase.can_enter(to) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    pub fn advance_to_matching(&mut self) -> Result<(), SessionError> {
        self.enter(AuditPhase::Matching)
    }

    pub fn complete(&mut self, finding: AuditFinding) -> Result<(), SessionError> {
        self.enter(AuditPhase::Ready)?;
        self.finding = Some(finding);
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), SessionError> {
        self.enter(AuditPhase::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    /// 只有 Ready 状态允许人工决策
    pub fn decision_subject(&self) -> Result<&InvoiceRecord, SessionError> {
        match (self.phase, self.subject.as_ref()) {
            (AuditPhase::Ready, Some(invoice)) => Ok(invoice),
            (phase, _) => Err(SessionError::NotReady(phase)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditVerdict, InvoiceStatus};
    use bigdecimal::BigDecimal;

    fn invoice() -> InvoiceRecord {
        InvoiceRecord {
            invoice_id: "INV-1".to_string(),
            vendor_name: "Acme".to_string(),
            invoice_date: None,
            amount: BigDecimal::from(1000),
            status: InvoiceStatus::Ready,
            po_number: "4500012345".to_string(),
        }
    }

    #[test]
    fn simulated_path_walks_every_phase() {
        let mut s = AuditSession::begin(SessionId::default().next(), invoice(), SourceMode::Simulated);
        assert_eq!(s.phase(), AuditPhase::Extracting);
        assert!(s.phase().is_in_flight());

        s.advance_to_matching().unwrap();
        assert_eq!(s.phase(), AuditPhase::Matching);

        s.complete(AuditFinding::new("ok", AuditVerdict::Matched)).unwrap();
        assert_eq!(s.phase(), AuditPhase::Ready);
        assert_eq!(s.finding().unwrap().verdict, AuditVerdict::Matched);
        assert_eq!(s.decision_subject().unwrap().invoice_id, "INV-1");
    }

    #[test]
    fn live_path_skips_matching() {
        let mut s = AuditSession::begin(SessionId(3), invoice(), SourceMode::Live);
        s.complete(AuditFinding::connection_failed()).unwrap();
        assert_eq!(s.phase(), AuditPhase::Ready);
        assert_eq!(s.finding().unwrap().verdict, AuditVerdict::Error);
    }

    #[test]
    fn failed_is_terminal() {
        let mut s = AuditSession::begin(SessionId(1), invoice(), SourceMode::Live);
        s.fail("backend returned http status 502").unwrap();
        assert_eq!(s.phase(), AuditPhase::Failed);
        assert_eq!(s.failure(), Some("backend returned http status 502"));

        let err = s.complete(AuditFinding::new("late", AuditVerdict::Matched)).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: AuditPhase::Failed,
                to: AuditPhase::Ready
            }
        );
        assert!(s.finding().is_none());
        assert_eq!(s.decision_subject().unwrap_err(), SessionError::NotReady(AuditPhase::Failed));
    }

    #[test]
    fn idle_rejects_transitions_and_decisions() {
        let mut s = AuditSession::idle(SessionId(0));
        assert!(s.advance_to_matching().is_err());
        assert!(s.fail("x").is_err());
        assert_eq!(s.phase(), AuditPhase::Idle);
        assert_eq!(s.decision_subject().unwrap_err(), SessionError::NotReady(AuditPhase::Idle));
    }

    #[test]
    fn ready_cannot_be_completed_twice() {
        let mut s = AuditSession::begin(SessionId(1), invoice(), SourceMode::Live);
        s.complete(AuditFinding::new("first", AuditVerdict::Matched)).unwrap();
        assert!(s.complete(AuditFinding::new("second", AuditVerdict::Error)).is_err());
        assert_eq!(s.finding().unwrap().narrative, "first");
    }
}
