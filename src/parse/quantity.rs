use bigdecimal::BigDecimal;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// 无法解析时的预设数量
pub const DEFAULT_QUANTITY: &str = "1";

fn digit_run() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[0-9]+").expect("invalid regex"))
}

/// 以不受地区影响的方式解析十进制数 (允许前后空白与千分位逗号)
pub fn parse_decimal(input: &str) -> Option<BigDecimal> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.contains(['e', 'E']) {
        return None;
    }
    BigDecimal::from_str(&cleaned).ok()
}

/// 转换为无小数的数量; `None` 表示只能使用预设值
///
/// 小数一律舍去 (不四舍五入); 负数不是有效数量。
/// 非数字文字取第一段连续数字, 例如 `"abc7pcs"` -> `"7"`。
pub fn try_normalize_quantity(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }

    if let Some(value) = parse_decimal(input) {
        if value < BigDecimal::from(0) {
            tracing::warn!("数量为负数: '{}'", input);
            return None;
        }
        let whole = value.with_scale(0);
        tracing::debug!("数量处理: '{}' -> {} (忽略小数部分)", input, whole);
        return Some(whole.to_string());
    }

    digit_run().find(input).map(|m| {
        tracing::debug!("从字串 '{}' 提取数量: {}", input, m.as_str());
        m.as_str().to_string()
    })
}

/// 数量正规化, 失败时回传 [`DEFAULT_QUANTITY`]
pub fn normalize_quantity(input: &str) -> String {
    try_normalize_quantity(input).unwrap_or_else(|| {
        tracing::debug!("无法解析数量 '{}', 使用预设值: {}", input, DEFAULT_QUANTITY);
        DEFAULT_QUANTITY.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_are_truncated_not_rounded() {
        assert_eq!(normalize_quantity("12.9"), "12");
        assert_eq!(normalize_quantity("12.7"), "12");
        assert_eq!(normalize_quantity("0.99"), "0");
        assert_eq!(normalize_quantity("1000"), "1000");
    }

    #[test]
    fn empty_input_uses_default() {
        assert_eq!(normalize_quantity(""), "1");
        assert_eq!(try_normalize_quantity(""), None);
    }

    #[test]
    fn first_digit_run_is_scraped() {
        assert_eq!(normalize_quantity("abc7pcs"), "7");
        assert_eq!(normalize_quantity("x12y34"), "12");
    }

    #[test]
    fn no_digits_uses_default() {
        assert_eq!(normalize_quantity("abc"), "1");
        assert_eq!(normalize_quantity("   "), "1");
    }

    #[test]
    fn thousands_separator_and_whitespace() {
        assert_eq!(normalize_quantity(" 1,250.5 "), "1250");
    }

    #[test]
    fn negative_values_fall_back() {
        assert_eq!(try_normalize_quantity("-3.5"), None);
        assert_eq!(normalize_quantity("-3.5"), "1");
    }

    #[test]
    fn large_values_do_not_overflow() {
        assert_eq!(normalize_quantity("98765432109876543210.5"), "98765432109876543210");
    }
}
