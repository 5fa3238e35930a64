//! 后端负载规范化
//!
//! 队列数据来自表格类工作流，字段命名不统一 (`Invoice_ID` / `invoice_id` / `id` ...)。
//! 这里把所有别名收敛成唯一的 `InvoiceRecord` 形状，其余模块不再处理别名。

use super::FetchError;
use crate::models::{AuditFinding, AuditVerdict, InvoiceRecord, InvoiceStatus, DEFAULT_NARRATIVE};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate};
use indexmap::IndexSet;
use serde_json::{Map, Number, Value};
use std::str::FromStr;

const ID_KEYS: &[&str] = &["Invoice_ID", "invoice_id", "invoiceId", "InvoiceID", "id"];
const VENDOR_KEYS: &[&str] = &["Vendor_Name", "vendor_name", "vendorName", "vendor"];
const DATE_KEYS: &[&str] = &["Invoice_Date", "invoice_date", "invoiceDate", "Date", "date"];
const AMOUNT_KEYS: &[&str] = &["Amount", "amount", "Total", "total"];
const STATUS_KEYS: &[&str] = &["Status", "status"];
const PO_KEYS: &[&str] = &["PO_Number", "po_number", "poNumber", "PO", "po"];

const NARRATIVE_KEYS: &[&str] = &["finding", "narrative", "Finding"];
const VERDICT_KEYS: &[&str] = &["verdict", "status", "Status"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// 规范化整个队列 (全有或全无)
pub fn normalize_queue(payload: &Value) -> Result<Vec<InvoiceRecord>, FetchError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| FetchError::Malformed("queue payload is not an array".to_string()))?;

    let mut seen: IndexSet<String> = IndexSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let record = normalize_invoice(row, idx)?;
        if !seen.insert(record.invoice_id.clone()) {
            return Err(FetchError::Malformed(format!(
                "duplicate invoice id '{}' at row {}",
                record.invoice_id, idx
            )));
        }
        records.push(record);
    }

    Ok(records)
}

/// 规范化单行发票
pub fn normalize_invoice(row: &Value, idx: usize) -> Result<InvoiceRecord, FetchError> {
    let obj = row
        .as_object()
        .ok_or_else(|| FetchError::Malformed(format!("row {} is not an object", idx)))?;

    let invoice_id = lookup_text(obj, ID_KEYS)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FetchError::Malformed(format!("row {} has no invoice id", idx)))?;

    let amount = lookup(obj, AMOUNT_KEYS)
        .and_then(parse_amount)
        .ok_or_else(|| {
            FetchError::Malformed(format!("invoice {} has no readable amount", invoice_id))
        })?;
    if amount < BigDecimal::zero() {
        return Err(FetchError::Malformed(format!(
            "invoice {} has negative amount {}",
            invoice_id, amount
        )));
    }

    let status = match lookup_text(obj, STATUS_KEYS).filter(|s| !s.is_empty()) {
        None => InvoiceStatus::Ready,
        Some(raw) => raw
            .parse::<InvoiceStatus>()
            .map_err(|e| FetchError::Malformed(format!("invoice {}: {}", invoice_id, e)))?,
    };

    Ok(InvoiceRecord {
        vendor_name: lookup_text(obj, VENDOR_KEYS).unwrap_or_default(),
        invoice_date: lookup_text(obj, DATE_KEYS).and_then(|d| parse_date(&d)),
        po_number: lookup_text(obj, PO_KEYS).unwrap_or_default(),
        invoice_id,
        amount,
        status,
    })
}

/// 规范化审核响应，缺失字段用缺省值补齐
pub fn normalize_finding(payload: &Value) -> Result<AuditFinding, FetchError> {
    // n8n 的 "respond with all items" 会把单个对象包成数组
    let body = match payload {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };
    let obj = body
        .as_object()
        .ok_or_else(|| FetchError::Malformed("audit response is not an object".to_string()))?;

    let narrative = lookup_text(obj, NARRATIVE_KEYS)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NARRATIVE.to_string());
    let verdict = lookup_text(obj, VERDICT_KEYS)
        .map(|v| AuditVerdict::from_backend(&v))
        .unwrap_or(AuditVerdict::PendingReview);

    Ok(AuditFinding::new(narrative, verdict))
}

/// 按别名顺序取第一个非 null 字段
fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn lookup_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(obj, keys)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(number_text(n)),
        _ => None,
    }
}

/// 整数值的浮点数按整数输出 (17.0 -> "17")
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.is_finite() && f.fract() == 0.0 => {
            format!("{:.0}", f)
        }
        _ => n.to_string(),
    }
}

fn parse_amount(v: &Value) -> Option<BigDecimal> {
    match v {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            BigDecimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
