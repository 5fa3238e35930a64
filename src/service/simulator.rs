use crate::config::SimulationConfig;
use crate::models::{
    AuditFinding, AuditVerdict, InvoiceRecord, InvoiceStatus, PurchaseOrderRecord,
};
use crate::service::audit_session::AuditPhase;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::Duration;

pub const MATCHED_NARRATIVE: &str =
    "3-way match passed: invoice quantity agrees with the purchase order and goods receipt.";

/// 模拟审核的一个阶段: 等待 delay 后进入 phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedStage {
    pub delay: Duration,
    pub phase: AuditPhase,
}

/// 后端不可用时的本地模拟
///
/// 种子数据固定，审核结论只取决于发票和采购订单，不含随机性。
#[derive(Debug, Clone)]
pub struct FallbackSimulator {
    invoices: Vec<InvoiceRecord>,
    purchase_orders: HashMap<String, PurchaseOrderRecord>,
    extract_delay: Duration,
    match_delay: Duration,
}

impl FallbackSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self::with_delays(config.extract_delay(), config.match_delay())
    }

    pub fn with_delays(extract_delay: Duration, match_delay: Duration) -> Self {
        let purchase_orders = seed_purchase_orders()
            .into_iter()
            .map(|po| (po.po_number.clone(), po))
            .collect();

        Self {
            invoices: seed_invoices(),
            purchase_orders,
            extract_delay,
            match_delay,
        }
    }

    /// 固定种子队列
    pub fn seed_queue(&self) -> Vec<InvoiceRecord> {
        self.invoices.clone()
    }

    pub fn purchase_order(&self, po_number: &str) -> Option<&PurchaseOrderRecord> {
        self.purchase_orders.get(po_number)
    }

    /// 两个有序阶段: 抽取 -> 匹配 -> 出结果
    pub fn stages(&self) -> [SimulatedStage; 2] {
        [
            SimulatedStage {
                delay: self.extract_delay,
                phase: AuditPhase::Matching,
            },
            SimulatedStage {
                delay: self.match_delay,
                phase: AuditPhase::Ready,
            },
        ]
    }

    /// 数量比对启发式
    ///
    /// 种子数据把数量编码为金额的百分之一，`billed = amount / 100`。
    /// 这只是模拟数据的约定，实时模式下 amount 是货币金额，不能这样换算。
    pub fn simulate_audit(&self, invoice: &InvoiceRecord) -> AuditFinding {
        let received_qty = self
            .purchase_order(&invoice.po_number)
            .map(|po| po.received_qty)
            .unwrap_or(0);

        let billed_units = (&invoice.amount / BigDecimal::from(100)).normalized();
        let received = BigDecimal::from(received_qty);

        if billed_units != received {
            AuditFinding::new(
                format!(
                    "Quantity mismatch on PO {}: invoice bills {} units but goods receipt shows {} received.",
                    invoice.po_number, billed_units, received_qty
                ),
                AuditVerdict::Discrepancy,
            )
        } else {
            AuditFinding::new(MATCHED_NARRATIVE, AuditVerdict::Matched)
        }
    }
}

fn seed_invoice(id: &str, vendor: &str, date: (i32, u32, u32), amount: i64, po: &str) -> InvoiceRecord {
    InvoiceRecord {
        invoice_id: id.to_string(),
        vendor_name: vendor.to_string(),
        invoice_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        amount: BigDecimal::from(amount),
        status: InvoiceStatus::Ready,
        po_number: po.to_string(),
    }
}

fn seed_invoices() -> Vec<InvoiceRecord> {
    vec![
        seed_invoice("INV-2024-001", "Acme Industrial Supply", (2024, 3, 4), 1200, "4500012345"),
        seed_invoice("INV-2024-002", "Globex Manufacturing", (2024, 3, 6), 500, "4500012346"),
        seed_invoice("INV-2024-003", "Initech Components", (2024, 3, 11), 2500, "4500012347"),
        seed_invoice("INV-2024-004", "Acme Logistics", (2024, 3, 12), 800, "4500012348"),
        // PO 不存在，按零收货处理
        seed_invoice("INV-2024-005", "Umbrella Parts Co", (2024, 3, 15), 300, "4500099999"),
    ]
}

fn seed_purchase_orders() -> Vec<PurchaseOrderRecord> {
    let po = |number: &str, ordered: i64, received: i64, price: i64, desc: &str| PurchaseOrderRecord {
        po_number: number.to_string(),
        ordered_qty: ordered,
        received_qty: received,
        unit_price: BigDecimal::from(price),
        material_description: desc.to_string(),
    };

    vec![
        po("4500012345", 10, 10, 100, "Hex bolts M12 x 80, zinc plated"),
        po("4500012346", 5, 5, 100, "Hydraulic pump seal kit"),
        po("4500012347", 25, 20, 100, "Stainless steel sheet 2mm"),
        po("4500012348", 8, 8, 100, "Pallet wrap, 500mm roll"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> FallbackSimulator {
        FallbackSimulator::with_delays(Duration::from_millis(10), Duration::from_millis(20))
    }

    fn invoice(amount: i64, po: &str) -> InvoiceRecord {
        seed_invoice("T-1", "Test Vendor", (2024, 1, 1), amount, po)
    }

    #[test]
    fn over_billed_quantity_is_a_discrepancy() {
        let finding = sim().simulate_audit(&invoice(1200, "4500012345"));
        assert_eq!(finding.verdict, AuditVerdict::Discrepancy);
        assert!(finding.narrative.contains("12 units"), "{}", finding.narrative);
        assert!(finding.narrative.contains("10 received"), "{}", finding.narrative);
    }

    #[test]
    fn exact_quantity_matches() {
        let finding = sim().simulate_audit(&invoice(1000, "4500012345"));
        assert_eq!(finding.verdict, AuditVerdict::Matched);
        assert_eq!(finding.narrative, MATCHED_NARRATIVE);
    }

    #[test]
    fn unknown_po_means_nothing_received() {
        let finding = sim().simulate_audit(&invoice(300, "does-not-exist"));
        assert_eq!(finding.verdict, AuditVerdict::Discrepancy);
        assert!(finding.narrative.contains("3 units"));
        assert!(finding.narrative.contains("0 received"));

        let finding = sim().simulate_audit(&invoice(0, "does-not-exist"));
        assert_eq!(finding.verdict, AuditVerdict::Matched);
    }

    #[test]
    fn fractional_units_never_match() {
        let mut inv = invoice(0, "4500012345");
        inv.amount = "1000.50".parse().unwrap();
        let finding = sim().simulate_audit(&inv);
        assert_eq!(finding.verdict, AuditVerdict::Discrepancy);
        assert!(finding.narrative.contains("10.005 units"), "{}", finding.narrative);
    }

    #[test]
    fn audit_is_deterministic() {
        let s = sim();
        for inv in s.seed_queue() {
            assert_eq!(s.simulate_audit(&inv), s.simulate_audit(&inv));
        }
    }

    #[test]
    fn seed_queue_is_fixed() {
        let a = sim().seed_queue();
        let b = FallbackSimulator::with_delays(Duration::ZERO, Duration::ZERO).seed_queue();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|inv| inv.status == InvoiceStatus::Ready));
    }

    #[test]
    fn stages_are_ordered() {
        let stages = sim().stages();
        assert_eq!(stages[0].phase, AuditPhase::Matching);
        assert_eq!(stages[0].delay, Duration::from_millis(10));
        assert_eq!(stages[1].phase, AuditPhase::Ready);
        assert_eq!(stages[1].delay, Duration::from_millis(20));
    }
}
