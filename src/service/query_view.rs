use crate::models::{InvoiceRecord, InvoiceStatus};
use std::str::FromStr;

/// 状态筛选
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(InvoiceStatus),
}

impl StatusFilter {
    pub fn admits(&self, status: InvoiceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<InvoiceStatus>().map(StatusFilter::Only)
    }
}

/// 队列的筛选/搜索投影，保持原始顺序，不修改数据
///
/// 供应商名或发票号包含搜索词 (不区分大小写) 即命中。
pub fn filter_queue(records: &[InvoiceRecord], filter: StatusFilter, search: &str) -> Vec<InvoiceRecord> {
    let needle = search.to_lowercase();

    records
        .iter()
        .filter(|inv| filter.admits(inv.status))
        .filter(|inv| {
            needle.is_empty()
                || inv.vendor_name.to_lowercase().contains(&needle)
                || inv.invoice_id.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
