use crate::config::FallbackPolicy;
use crate::models::{FieldName, FieldValueSet, LabelOverrides, ReceiptRecord};
use crate::parse::{month_of, normalize_quantity, try_month_of, try_normalize_quantity};
use serde::Serialize;
use thiserror::Error;

/// 栏位设定顺序 (由短到长, 品名最后)
///
/// 标签引擎在长文字栏位先设定时会排版错乱, 因此依群组顺序推送。
/// 更换引擎时需重新验证这张表。
pub const FIELD_ORDER: &[&[FieldName]] = &[
    &[
        FieldName::DocType,
        FieldName::DocNumber,
        FieldName::DocItem,
        FieldName::Date,
        FieldName::ProductNumber,
    ],
    &[FieldName::Months],
    &[FieldName::SupplierName],
    &[
        FieldName::Quantity,
        FieldName::Dc,
        FieldName::HwVer,
        FieldName::FwVer,
    ],
    &[FieldName::ProductName],
];

/// 使用者手动输入的栏位 (没有单据时也会推送)
pub const OPERATOR_FIELDS: &[FieldName] = &[
    FieldName::Quantity,
    FieldName::Dc,
    FieldName::HwVer,
    FieldName::FwVer,
];

pub fn ordered_fields() -> impl Iterator<Item = FieldName> {
    FIELD_ORDER.iter().flat_map(|group| group.iter().copied())
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("数量无法解析: '{0}'")]
    InvalidQuantity(String),
    #[error("日期无法解析: '{0}'")]
    InvalidDate(String),
}

/// 品名长度提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameLength {
    Normal,
    /// 超过 30 字
    Long,
    /// 超过 50 字, 建议缩短
    TooLong,
}

pub fn product_name_advice(name: &str) -> NameLength {
    match name.chars().count() {
        n if n > 50 => NameLength::TooLong,
        n if n > 30 => NameLength::Long,
        _ => NameLength::Normal,
    }
}

/// 单据 + 手动输入 -> 标签栏位
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapper {
    policy: FallbackPolicy,
}

impl FieldMapper {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self { policy }
    }

    /// 产生完整的栏位表, 顺序依 [`FIELD_ORDER`]
    pub fn map(
        &self,
        record: &ReceiptRecord,
        overrides: &LabelOverrides,
    ) -> Result<FieldValueSet, MapError> {
        let quantity_text = overrides
            .quantity
            .clone()
            .unwrap_or_else(|| record.quantity.to_string());
        let quantity = self.quantity(&quantity_text)?;
        let months = self.months(&record.purchase_date)?;

        let product_name = overrides
            .product_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&record.product_name);

        let mut fields = FieldValueSet::new();
        for name in ordered_fields() {
            let value = match name {
                FieldName::DocType => record.doc_type.as_str(),
                FieldName::DocNumber => record.doc_number.as_str(),
                FieldName::DocItem => record.doc_item.as_str(),
                FieldName::Date => record.purchase_date.as_str(),
                FieldName::ProductNumber => record.product_code.as_str(),
                FieldName::Months => months.as_str(),
                FieldName::SupplierName => record.supplier_name.as_str(),
                FieldName::Quantity => quantity.as_str(),
                FieldName::Dc => overrides.date_code.as_str(),
                FieldName::HwVer => overrides.hw_version.as_str(),
                FieldName::FwVer => overrides.fw_version.as_str(),
                FieldName::ProductName => product_name,
            };
            fields.set(name, value);
        }
        Ok(fields)
    }

    /// 没有单据时只产生手动输入的栏位
    pub fn map_operator_fields(&self, overrides: &LabelOverrides) -> Result<FieldValueSet, MapError> {
        let quantity = self.quantity(overrides.quantity.as_deref().unwrap_or_default())?;

        let mut fields = FieldValueSet::new();
        fields.set(FieldName::Quantity, quantity);
        fields.set(FieldName::Dc, overrides.date_code.as_str());
        fields.set(FieldName::HwVer, overrides.hw_version.as_str());
        fields.set(FieldName::FwVer, overrides.fw_version.as_str());
        Ok(fields)
    }

    pub fn quantity(&self, text: &str) -> Result<String, MapError> {
        match self.policy {
            FallbackPolicy::Lenient => Ok(normalize_quantity(text)),
            FallbackPolicy::Strict => {
                try_normalize_quantity(text).ok_or_else(|| MapError::InvalidQuantity(text.to_string()))
            }
        }
    }

    pub fn months(&self, date: &str) -> Result<String, MapError> {
        match self.policy {
            FallbackPolicy::Lenient => Ok(month_of(date)),
            FallbackPolicy::Strict => {
                try_month_of(date).ok_or_else(|| MapError::InvalidDate(date.to_string()))
            }
        }
    }
}
