use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 采购订单 + 收货数据 (仅模拟模式使用的参考数据)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderRecord {
    pub po_number: String,
    pub ordered_qty: i64,
    pub received_qty: i64,
    pub unit_price: BigDecimal,
    pub material_description: String,
}
