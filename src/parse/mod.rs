//! 宽松解析工具: 不回传错误, 只给出尽力而为的结果或预设值
pub mod extract;
pub mod month;
pub mod quantity;

pub use extract::{extract_value, unescape_payload};
pub use month::{month_of, try_month_of, DEFAULT_MONTH};
pub use quantity::{normalize_quantity, parse_decimal, try_normalize_quantity, DEFAULT_QUANTITY};
