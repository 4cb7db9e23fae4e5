use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// 无法判断月份时的预设值
pub const DEFAULT_MONTH: &str = "12";

/// 精确格式, 依序尝试, 第一个成功者为准
///
/// chrono 的 `%m`/`%d` 接受一或两位数, 所以 `yyyy/MM/dd` 与 `yyyy/M/d`
/// 这类成对格式合并为同一项, 顺序不变。
/// `01/02/2025` 依此顺序解析为 1 月 (月/日/年 先于 日/月/年)。
const EXACT_FORMATS: &[&str] = &[
    "%Y%m%d",
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y年%m月%d日",
];

/// 通用解析: 含时间的常见写法
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// 通用解析: 其他只有日期的写法 (点分隔, 英文月份名称)
const DATE_FORMATS: &[&str] = &[
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// 通用解析: 只有年月, 补上日再解析
const YEAR_MONTH_FORMATS: &[&str] = &[
    "%Y/%m",
    "%Y-%m",
    "%Y.%m",
    "%Y年%m月",
    "%m/%Y",
    "%B %Y",
    "%b %Y",
];

fn month_token() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"(\d{1,2})[/\-年月]").expect("invalid regex"))
}

fn parse_exact(input: &str) -> Option<(&'static str, NaiveDate)> {
    EXACT_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(input, fmt)
            .ok()
            .map(|date| (*fmt, date))
    })
}

fn parse_date_only(input: &str) -> Option<u32> {
    if let Some((_, date)) = parse_exact(input) {
        return Some(date.month());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
    {
        return Some(date.month());
    }
    let padded = format!("{input} 1");
    YEAR_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&padded, &format!("{fmt} %d")).ok())
        .map(|date| date.month())
}

fn parse_generic(input: &str) -> Option<u32> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.month());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.month());
    }
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
    {
        return Some(dt.month());
    }
    if let Some(month) = parse_date_only(trimmed) {
        return Some(month);
    }

    // "2025/06/02 上午 12:00:00" 之类: 只看日期部分
    let head = trimmed.split([' ', 'T']).next().unwrap_or_default();
    if !head.is_empty() && head.len() < trimmed.len() {
        return parse_date_only(head);
    }
    None
}

fn scrape_month(input: &str) -> Option<u32> {
    // 只检查第一个符合的片段
    let caps = month_token().captures(input)?;
    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}

/// 从日期字串取出月份 (1-12, 无前导零); `None` 表示只能使用预设值
pub fn try_month_of(date: &str) -> Option<String> {
    if date.is_empty() {
        return None;
    }

    if let Some((fmt, parsed)) = parse_exact(date) {
        tracing::debug!("使用格式 '{}' 解析日期: {} -> 月份: {}", fmt, date, parsed.month());
        return Some(parsed.month().to_string());
    }

    if let Some(month) = parse_generic(date) {
        tracing::debug!("使用通用格式解析日期: {} -> 月份: {}", date, month);
        return Some(month.to_string());
    }

    if let Some(month) = scrape_month(date) {
        tracing::debug!("使用正则表达式从日期 '{}' 提取月份: {}", date, month);
        return Some(month.to_string());
    }

    None
}

/// 日期转月份, 失败时回传 [`DEFAULT_MONTH`]
pub fn month_of(date: &str) -> String {
    try_month_of(date).unwrap_or_else(|| {
        tracing::debug!("无法解析日期 '{}', 使用预设月份: {}", date, DEFAULT_MONTH);
        DEFAULT_MONTH.to_string()
    })
}
