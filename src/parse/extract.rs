//! 非结构化回应的栏位抓取
//!
//! ERP 的 `Data` 栏位有时并非合法 JSON, 此时退回字串搜寻。
//! 不支援巢状物件、阵列或跳脱引号。

/// 从文字中取出 `"field": "value"` 或 `"field": value` 的值
///
/// 依序尝试: 有空格字串、无空格字串、有空格数值、无空格数值。
/// 找不到时回传空字串。
pub fn extract_value(text: &str, field: &str) -> String {
    if let Some(value) = extract_string(text, field) {
        return value.to_string();
    }
    if let Some(value) = extract_bare(text, field) {
        return value.to_string();
    }
    String::new()
}

fn find_after<'a>(text: &'a str, patterns: &[String]) -> Option<&'a str> {
    patterns
        .iter()
        .find_map(|p| text.find(p.as_str()).map(|idx| &text[idx + p.len()..]))
}

fn extract_string<'a>(text: &'a str, field: &str) -> Option<&'a str> {
    let rest = find_after(
        text,
        &[format!("\"{field}\": \""), format!("\"{field}\":\"")],
    )?;
    // 没有结尾引号时交给数值格式处理
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn extract_bare<'a>(text: &'a str, field: &str) -> Option<&'a str> {
    let rest = find_after(text, &[format!("\"{field}\": "), format!("\"{field}\":")])?;
    let rest = rest.trim_start_matches(' ');
    let end = rest
        .find(|c| matches!(c, ',' | '\r' | '\n' | '}' | ' '))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest[..end].trim())
}

/// 还原 `Data` 字串中的跳脱: 移除字面 `\r\n`, `\"` 还原为 `"`
pub fn unescape_payload(raw: &str) -> String {
    raw.replace("\\r\\n", "").replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"[{"進貨單別": "3113", "進貨單號":"1140421033 ", "進貨數量": 12.7, "單價":3.5}]"#;

    #[test]
    fn spaced_and_compact_strings() {
        assert_eq!(extract_value(ROW, "進貨單別"), "3113");
        assert_eq!(extract_value(ROW, "進貨單號"), "1140421033 ");
    }

    #[test]
    fn bare_numbers_end_at_delimiters() {
        assert_eq!(extract_value(ROW, "進貨數量"), "12.7");
        assert_eq!(extract_value(ROW, "單價"), "3.5");
        assert_eq!(extract_value(r#"{"n":42}"#, "n"), "42");
        assert_eq!(extract_value("{\"n\": 7\r\n}", "n"), "7");
    }

    #[test]
    fn key_must_match_including_quotes() {
        let text = r#"{"託外進貨單號": "A1"}"#;
        assert_eq!(extract_value(text, "進貨單號"), "");
        assert_eq!(extract_value(text, "託外進貨單號"), "A1");
    }

    #[test]
    fn missing_field_is_empty() {
        assert_eq!(extract_value(ROW, "規格"), "");
        assert_eq!(extract_value("", "品名"), "");
        assert_eq!(extract_value(r#"{"品名": }"#, "品名"), "");
    }

    #[test]
    fn unterminated_string_falls_back_to_bare_scan() {
        assert_eq!(extract_value(r#"{"品名": "ABC"#, "品名"), "\"ABC");
    }

    #[test]
    fn unescape_removes_crlf_and_escaped_quotes() {
        let raw = r#"[{\"品名\": \"X\"},\r\n{\"品號\": \"Y\"}]"#;
        assert_eq!(unescape_payload(raw), r#"[{"品名": "X"},{"品號": "Y"}]"#);
    }
}
