use serde::{Deserialize, Serialize};
use std::fmt;

/// 缺省叙述 (后端成功返回但未给出 finding 时)
pub const DEFAULT_NARRATIVE: &str = "Analysis complete.";

/// 远端审核调用失败时的叙述
pub const CONNECTION_FAILED_NARRATIVE: &str =
    "Connection to the workflow backend failed. Ensure the tunnel is open.";

/// 审核结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditVerdict {
    Matched,
    Discrepancy,
    Error,
    PendingReview,
}

impl AuditVerdict {
    /// 宽松解析后端返回的状态字符串，无法识别的一律视为待复核
    pub fn from_backend(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "matched" | "match" | "approved" => AuditVerdict::Matched,
            "discrepancy" | "mismatch" | "flagged" => AuditVerdict::Discrepancy,
            "error" | "failed" => AuditVerdict::Error,
            _ => AuditVerdict::PendingReview,
        }
    }
}

impl fmt::Display for AuditVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditVerdict::Matched => "Matched",
            AuditVerdict::Discrepancy => "Discrepancy",
            AuditVerdict::Error => "Error",
            AuditVerdict::PendingReview => "Pending Review",
        };
        f.write_str(s)
    }
}

/// 一次审核的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub narrative: String,
    pub verdict: AuditVerdict,
}

impl AuditFinding {
    pub fn new(narrative: impl Into<String>, verdict: AuditVerdict) -> Self {
        Self {
            narrative: narrative.into(),
            verdict,
        }
    }

    /// 远端连接失败时展示给操作员的结果
    pub fn connection_failed() -> Self {
        Self::new(CONNECTION_FAILED_NARRATIVE, AuditVerdict::Error)
    }
}
