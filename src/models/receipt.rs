use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 进货单据类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptMode {
    /// 一般进货
    #[default]
    General,
    /// 托外进货 (委外加工回厂)
    Subcontract,
}

impl ReceiptMode {
    pub fn from_subcontract_flag(is_subcontract: bool) -> Self {
        if is_subcontract {
            Self::Subcontract
        } else {
            Self::General
        }
    }

    /// ERP 接口端点名称
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::General => "getPurchaseReceipt",
            Self::Subcontract => "getSubcontractReceipt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::General => "一般進貨",
            Self::Subcontract => "托外進貨",
        }
    }
}

/// 单据查询条件 (单别 + 单号 + 项次)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptQuery {
    pub doc_type: String,
    pub doc_number: String,
    pub doc_item: String,
    #[serde(default)]
    pub mode: ReceiptMode,
}

impl ReceiptQuery {
    pub fn new(
        doc_type: impl Into<String>,
        doc_number: impl Into<String>,
        doc_item: impl Into<String>,
        mode: ReceiptMode,
    ) -> Self {
        Self {
            doc_type: doc_type.into(),
            doc_number: doc_number.into(),
            doc_item: doc_item.into(),
            mode,
        }
    }
}

/// 进货单据明细 (ERP 回传的一行)
///
/// 每次查询成功都整笔替换, 只有 `product_name` 允许使用者事后修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub doc_type: String,      // 进货单别
    pub doc_number: String,    // 进货单号
    pub doc_item: String,      // 进货项次
    pub purchase_date: String, // 进货日期, 格式不固定
    pub supplier_code: String,
    pub supplier_name: String,
    pub product_code: String,
    pub product_name: String,
    pub specification: String,
    pub quantity: BigDecimal,
}
