use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 发票状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Ready,
    Posted,
    Disputed,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Ready => "Ready",
            InvoiceStatus::Posted => "Posted",
            InvoiceStatus::Disputed => "Disputed",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ready" => Ok(InvoiceStatus::Ready),
            "posted" => Ok(InvoiceStatus::Posted),
            "disputed" => Ok(InvoiceStatus::Disputed),
            other => Err(format!(
                "invalid invoice status '{}'. expected one of: Ready | Posted | Disputed",
                other
            )),
        }
    }
}

/// 待审核发票 (队列中的一行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub invoice_id: String,
    pub vendor_name: String,
    pub invoice_date: Option<NaiveDate>,
    pub amount: BigDecimal,   // 金额 (货币单位)
    pub status: InvoiceStatus,
    pub po_number: String,    // 关联采购订单号
}

impl InvoiceRecord {
    /// 返回状态替换后的新记录，原记录不变
    pub fn with_status(&self, status: InvoiceStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// 队列数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// 远端工作流后端
    Live,
    /// 本地固定种子数据
    Simulated,
}
