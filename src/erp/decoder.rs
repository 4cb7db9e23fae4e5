use crate::erp::ErpError;
use crate::models::{ReceiptMode, ReceiptRecord};
use crate::parse::{extract_value, parse_decimal, unescape_payload};
use serde::Deserialize;
use serde_json::{Map, Value};

/// ERP 回应栏位名称对照
#[derive(Debug, Clone, Copy)]
pub struct KeyTable {
    pub doc_type: &'static str,
    pub doc_number: &'static str,
    pub doc_item: &'static str,
    pub purchase_date: &'static str,
    pub supplier_code: &'static str,
    pub supplier_name: &'static str,
    pub product_code: &'static str,
    pub product_name: &'static str,
    pub specification: &'static str,
    pub quantity: &'static str,
}

/// 一般进货
pub const GENERAL_KEYS: KeyTable = KeyTable {
    doc_type: "進貨單別",
    doc_number: "進貨單號",
    doc_item: "進貨項次(序號)",
    purchase_date: "進貨日期",
    supplier_code: "供應廠商代號",
    supplier_name: "供應廠商名稱",
    product_code: "品號",
    product_name: "品名",
    specification: "規格",
    quantity: "進貨數量",
};

/// 托外进货: 单据栏位带 "託外" 前缀, 厂商/品项/数量栏位与一般进货相同
pub const SUBCONTRACT_KEYS: KeyTable = KeyTable {
    doc_type: "託外進貨單別",
    doc_number: "託外進貨單號",
    doc_item: "託外進貨項次(序號)",
    purchase_date: "託外進貨日期",
    ..GENERAL_KEYS
};

pub fn key_table(mode: ReceiptMode) -> &'static KeyTable {
    match mode {
        ReceiptMode::General => &GENERAL_KEYS,
        ReceiptMode::Subcontract => &SUBCONTRACT_KEYS,
    }
}

const SUCCESS_CODE: &str = "200";

/// 表示查无资料的 Data 写法
const EMPTY_DATA_MARKERS: &[&str] = &[
    "\"Data\":\"[]\"",
    "\"Data\":[]",
    "\"Data\":\"\"",
    "\"Data\":null",
];

/// 标准回应外层 `{"Code": "...", "Message": "...", "Data": "..."}`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Code")]
    code: Option<Value>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Data", default)]
    data: Option<Value>,
}

/// 解析 ERP 回应为单据资料
///
/// 只会回传 [`ErpError::NotFound`] 或 [`ErpError::Malformed`], 两者对使用者都是 "查无资料"。
pub fn decode(raw: &str, mode: ReceiptMode) -> Result<ReceiptRecord, ErpError> {
    if raw.trim().is_empty() {
        tracing::warn!("ERP 回应内容为空");
        return Err(ErpError::NotFound);
    }

    let result = match serde_json::from_str::<Envelope>(raw) {
        Ok(envelope) => decode_envelope(envelope, mode),
        Err(e) => {
            tracing::warn!("回应不是合法 JSON ({}), 改用字串解析", e);
            decode_legacy(raw, mode)
        }
    };

    match &result {
        Ok(record) => tracing::info!(
            "{}资料解析完成: {}-{}-{} 品号 {} 数量 {}",
            mode.label(),
            record.doc_type,
            record.doc_number,
            record.doc_item,
            record.product_code,
            record.quantity
        ),
        Err(ErpError::NotFound) => tracing::info!("ERP 回应查无资料"),
        Err(e) => tracing::warn!("ERP 回应无法解析: {}", e),
    }
    result
}

fn decode_envelope(envelope: Envelope, mode: ReceiptMode) -> Result<ReceiptRecord, ErpError> {
    let code = match envelope.code {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(ErpError::Malformed(format!("unexpected Code: {other}"))),
        None => return Err(ErpError::Malformed("missing Code".to_string())),
    };

    // 先判断 Data 是否为空, 再判断状态码
    let data = match envelope.data {
        None | Some(Value::Null) => return Err(ErpError::NotFound),
        Some(data) => data,
    };
    if is_empty_data(&data) {
        return Err(ErpError::NotFound);
    }

    if code != SUCCESS_CODE {
        tracing::info!(
            "ERP 回应非成功状态: Code={} Message={}",
            code,
            envelope.message.as_deref().unwrap_or_default()
        );
        return Err(ErpError::NotFound);
    }

    let keys = key_table(mode);
    match data {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(inner) => record_from_rows(&inner, keys),
            Err(e) => {
                tracing::warn!("Data 内容不是合法 JSON ({}), 改用字串解析", e);
                let text = unescape_payload(&text);
                Ok(build_record(keys, |key| extract_value(&text, key)))
            }
        },
        other => record_from_rows(&other, keys),
    }
}

fn is_empty_data(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::String(s) => matches!(s.trim(), "" | "[]" | "null"),
        Value::Array(rows) => rows.is_empty(),
        _ => false,
    }
}

fn record_from_rows(rows: &Value, keys: &KeyTable) -> Result<ReceiptRecord, ErpError> {
    let row = match rows {
        Value::Array(items) => match items.first() {
            Some(Value::Object(row)) => row,
            Some(other) => return Err(ErpError::Malformed(format!("unexpected row: {other}"))),
            None => return Err(ErpError::NotFound),
        },
        Value::Object(row) => row,
        Value::Null => return Err(ErpError::NotFound),
        other => return Err(ErpError::Malformed(format!("unexpected Data: {other}"))),
    };
    Ok(build_record(keys, |key| value_text(row, key)))
}

fn value_text(row: &Map<String, Value>, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// 相容旧格式: 以字串标记判断, 再从 Data 片段逐栏抓取
fn decode_legacy(raw: &str, mode: ReceiptMode) -> Result<ReceiptRecord, ErpError> {
    if !(raw.contains("\"Code\"") && raw.contains("\"Data\"")) {
        return Err(ErpError::Malformed("非标准 API 回应格式".to_string()));
    }
    if EMPTY_DATA_MARKERS.iter().any(|m| raw.contains(m)) {
        return Err(ErpError::NotFound);
    }
    if !raw.contains("\"Code\":\"200\"") {
        return Err(ErpError::NotFound);
    }

    const DATA_MARKER: &str = "\"Data\":\"";
    let start = raw
        .find(DATA_MARKER)
        .ok_or_else(|| ErpError::Malformed("找不到 Data 栏位".to_string()))?
        + DATA_MARKER.len();
    let end = raw.rfind('"').unwrap_or(0);
    if end <= start {
        return Err(ErpError::Malformed("找不到 Data 栏位结束位置".to_string()));
    }

    let data = unescape_payload(&raw[start..end]);
    Ok(build_record(key_table(mode), |key| extract_value(&data, key)))
}

fn build_record(keys: &KeyTable, lookup: impl Fn(&str) -> String) -> ReceiptRecord {
    let quantity_text = lookup(keys.quantity);
    let quantity = parse_decimal(&quantity_text).unwrap_or_default();

    ReceiptRecord {
        doc_type: lookup(keys.doc_type),
        doc_number: lookup(keys.doc_number).trim().to_string(),
        doc_item: lookup(keys.doc_item),
        purchase_date: lookup(keys.purchase_date),
        supplier_code: lookup(keys.supplier_code),
        supplier_name: lookup(keys.supplier_name),
        product_code: lookup(keys.product_code),
        product_name: lookup(keys.product_name),
        specification: lookup(keys.specification),
        quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const SAMPLE: &str = r#"{"Code":"200","Message":"OK","Data":"[{\"進貨單別\": \"3113\", \"進貨單號\": \"1140421033\", \"進貨項次(序號)\": \"0001\", \"進貨日期\":\"20250602\", \"品名\":\"TEST PART\", \"進貨數量\": 12.7}]"}"#;

    #[test]
    fn decodes_general_receipt() {
        let record = decode(SAMPLE, ReceiptMode::General).unwrap();
        assert_eq!(record.doc_type, "3113");
        assert_eq!(record.doc_number, "1140421033");
        assert_eq!(record.doc_item, "0001");
        assert_eq!(record.purchase_date, "20250602");
        assert_eq!(record.product_name, "TEST PART");
        assert_eq!(record.quantity, BigDecimal::from_str("12.7").unwrap());
        // 回应中没有的栏位为空字串
        assert_eq!(record.supplier_name, "");
        assert_eq!(record.specification, "");
    }

    #[test]
    fn decodes_subcontract_keys() {
        let raw = r#"{"Code":"200","Message":"OK","Data":"[{\"託外進貨單別\":\"5901\",\"託外進貨單號\":\" 1140500007 \",\"託外進貨項次(序號)\":\"0002\",\"託外進貨日期\":\"2025/05/20\",\"供應廠商名稱\":\"XX科技(股)公司\",\"品號\":\"371760236010SP\",\"進貨數量\":\"500.000\"}]"}"#;
        let record = decode(raw, ReceiptMode::Subcontract).unwrap();
        assert_eq!(record.doc_type, "5901");
        assert_eq!(record.doc_number, "1140500007");
        assert_eq!(record.doc_item, "0002");
        assert_eq!(record.purchase_date, "2025/05/20");
        assert_eq!(record.supplier_name, "XX科技(股)公司");
        assert_eq!(record.product_code, "371760236010SP");
        assert_eq!(record.quantity, BigDecimal::from(500));

        // 以一般进货的栏位解析托外回应, 单据栏位会是空的
        let general = decode(raw, ReceiptMode::General).unwrap();
        assert_eq!(general.doc_type, "");
        assert_eq!(general.product_code, "371760236010SP");
    }

    #[test]
    fn empty_data_is_not_found() {
        for raw in [
            r#"{"Code":"200","Message":"OK","Data":"[]"}"#,
            r#"{"Code":"200","Message":"OK","Data":""}"#,
            r#"{"Code":"200","Message":"OK","Data":null}"#,
            r#"{"Code":"200","Message":"OK","Data":[]}"#,
            r#"{"Code":"200","Message":"OK"}"#,
        ] {
            assert!(matches!(decode(raw, ReceiptMode::General), Err(ErpError::NotFound)), "{raw}");
        }
    }

    #[test]
    fn non_success_code_is_not_found() {
        let raw = SAMPLE.replace(r#""Code":"200""#, r#""Code":"500""#);
        assert!(matches!(decode(&raw, ReceiptMode::General), Err(ErpError::NotFound)));
    }

    #[test]
    fn missing_code_is_malformed() {
        let err = decode(r#"{"Data":"[{}]"}"#, ReceiptMode::General).unwrap_err();
        assert!(matches!(err, ErpError::Malformed(_)));
        assert!(err.is_not_found());
        assert!(decode("", ReceiptMode::General).unwrap_err().is_not_found());
        assert!(decode("<html>502</html>", ReceiptMode::General).unwrap_err().is_not_found());
    }

    #[test]
    fn inline_array_data_is_accepted() {
        let raw = r#"{"Code":200,"Message":"OK","Data":[{"進貨單別":"3113","進貨單號":"1","進貨數量":3}]}"#;
        let record = decode(raw, ReceiptMode::General).unwrap();
        assert_eq!(record.doc_type, "3113");
        assert_eq!(record.quantity, BigDecimal::from(3));
    }

    #[test]
    fn unparseable_quantity_is_zero() {
        let raw = r#"{"Code":"200","Message":"OK","Data":"[{\"進貨單別\":\"3113\",\"進貨數量\":\"n/a\"}]"}"#;
        let record = decode(raw, ReceiptMode::General).unwrap();
        assert_eq!(record.quantity, BigDecimal::from(0));
    }

    #[test]
    fn invalid_inner_json_uses_string_scan() {
        // Data 字串内有多余逗号, 不是合法 JSON
        let raw = r#"{"Code":"200","Message":"OK","Data":"[{\"進貨單別\": \"3113\", \"品名\": \"A B\", \"進貨數量\": 8.5,}]"}"#;
        let record = decode(raw, ReceiptMode::General).unwrap();
        assert_eq!(record.doc_type, "3113");
        assert_eq!(record.product_name, "A B");
        assert_eq!(record.quantity, BigDecimal::from_str("8.5").unwrap());
    }

    #[test]
    fn legacy_envelope_with_raw_newlines() {
        // 外层含未跳脱的换行, serde_json 无法解析
        let raw = "{\"Code\":\"200\",\"Message\":\"OK\",\"Data\":\"[{\\\"進貨單別\\\": \\\"3113\\\",\\r\\n \\\"進貨單號\\\": \\\"1140421033 \\\",\n \\\"進貨數量\\\": 12}]\"}";
        let record = decode(raw, ReceiptMode::General).unwrap();
        assert_eq!(record.doc_type, "3113");
        assert_eq!(record.doc_number, "1140421033");
        assert_eq!(record.quantity, BigDecimal::from(12));
    }

    #[test]
    fn legacy_empty_markers() {
        // 结尾多余字元使外层无法以 JSON 解析
        let raw = "{\"Code\":\"200\",\"Data\":\"[]\"}\n--";
        assert!(matches!(decode(raw, ReceiptMode::General), Err(ErpError::NotFound)));
        let raw = "{\"Code\":\"404\",\"Data\":\"[{}]\"}\n--";
        assert!(matches!(decode(raw, ReceiptMode::General), Err(ErpError::NotFound)));
    }
}
