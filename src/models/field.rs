use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 标签模板上的具名栏位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldName {
    DocType,
    DocNumber,
    DocItem,
    Date,
    ProductNumber,
    SupplierName,
    ProductName,
    Months,
    Quantity,
    #[serde(rename = "DC")]
    Dc,
    #[serde(rename = "HWVer")]
    HwVer,
    #[serde(rename = "FWVer")]
    FwVer,
}

impl FieldName {
    pub const ALL: [FieldName; 12] = [
        FieldName::DocType,
        FieldName::DocNumber,
        FieldName::DocItem,
        FieldName::Date,
        FieldName::ProductNumber,
        FieldName::SupplierName,
        FieldName::ProductName,
        FieldName::Months,
        FieldName::Quantity,
        FieldName::Dc,
        FieldName::HwVer,
        FieldName::FwVer,
    ];

    /// 模板中的栏位名称
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::DocType => "DocType",
            FieldName::DocNumber => "DocNumber",
            FieldName::DocItem => "DocItem",
            FieldName::Date => "Date",
            FieldName::ProductNumber => "ProductNumber",
            FieldName::SupplierName => "SupplierName",
            FieldName::ProductName => "ProductName",
            FieldName::Months => "Months",
            FieldName::Quantity => "Quantity",
            FieldName::Dc => "DC",
            FieldName::HwVer => "HWVer",
            FieldName::FwVer => "FWVer",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 要推送给标签引擎的栏位值 (保留设定顺序)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValueSet {
    values: IndexMap<FieldName, String>,
}

impl FieldValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设定栏位; 已存在的栏位保留原本的位置
    pub fn set(&mut self, name: FieldName, value: impl Into<String>) {
        self.values.insert(name, value.into());
    }

    pub fn get(&self, name: FieldName) -> Option<&str> {
        self.values.get(&name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 依设定顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn names(&self) -> Vec<FieldName> {
        self.values.keys().copied().collect()
    }

    /// 尚未设定的栏位
    pub fn missing(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|name| !self.values.contains_key(name))
            .collect()
    }
}

/// 使用者在列印设定中手动输入的值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelOverrides {
    /// 数量文字, 未填时使用单据数量
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub date_code: String,
    #[serde(default)]
    pub hw_version: String,
    #[serde(default)]
    pub fw_version: String,
    /// 使用者修改过的品名, 空白时使用单据品名
    #[serde(default)]
    pub product_name: Option<String>,
}
