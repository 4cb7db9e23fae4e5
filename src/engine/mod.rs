//! 标签引擎介面
//!
//! 模板解析、栏位替换、绘图与送印都由外部引擎负责, 这里只定义呼叫边界。
pub mod file_drop;
pub mod simulated;

pub use file_drop::FileDropEngine;
pub use simulated::SimulatedEngine;

use crate::config::{AppConfig, EngineKind};
use crate::models::{FieldName, FieldValueSet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("找不到标签档案: {0}")]
    TemplateNotFound(PathBuf),
    #[error("印表机无法使用: {0}")]
    PrinterUnavailable(String),
    #[error("标签引擎错误: {0}")]
    Failed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// 栏位设定结果; 模板中没有该栏位只是警告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Applied,
    NotFound,
}

/// 预览结果
///
/// 服务端不绘制点阵图, 预览为文字版: 第一行是模板档名, 之后依设定顺序每行一个栏位。
/// 需要图档的整合端以标签软体本身产生。
#[derive(Debug, Clone, Serialize)]
pub struct LabelPreview {
    pub template: String,
    pub text: String,
}

pub trait LabelEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// 开启模板, 每个会话各自持有一份
    fn open(&self, template: &Path) -> Result<Box<dyn LabelDocument>, EngineError>;

    fn printers(&self) -> Vec<String>;
}

/// 已开启的标签模板
pub trait LabelDocument: Send {
    fn template(&self) -> &Path;

    fn set_field(&mut self, name: FieldName, value: &str) -> Result<FieldStatus, EngineError>;

    fn render_preview(&mut self) -> Result<LabelPreview, EngineError>;

    /// 阻塞式送印
    fn print(&mut self, printer: &str, copies: u32) -> Result<(), EngineError>;
}

/// 依设定建立引擎
pub fn create_engine(config: &AppConfig) -> Arc<dyn LabelEngine> {
    let printers = configured_printers(config);
    match config.engine.kind {
        EngineKind::Simulated => Arc::new(SimulatedEngine::new(printers)),
        EngineKind::FileDrop => Arc::new(FileDropEngine::new(&config.engine.spool_dir, printers)),
    }
}

fn configured_printers(config: &AppConfig) -> Vec<String> {
    let mut printers = vec![config.printer.default_printer.clone()];
    for name in &config.printer.extra_printers {
        if !printers.contains(name) {
            printers.push(name.clone());
        }
    }
    printers
}

pub(crate) fn ensure_template(template: &Path) -> Result<(), EngineError> {
    if !template.is_file() {
        return Err(EngineError::TemplateNotFound(template.to_path_buf()));
    }
    Ok(())
}

pub(crate) fn ensure_printer(printers: &[String], printer: &str) -> Result<(), EngineError> {
    if !printers.iter().any(|p| p == printer) {
        return Err(EngineError::PrinterUnavailable(printer.to_string()));
    }
    Ok(())
}

pub(crate) fn template_name(template: &Path) -> String {
    template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 文字版预览: 依设定顺序列出栏位
pub(crate) fn render_text(template: &Path, fields: &FieldValueSet) -> LabelPreview {
    let name = template_name(template);
    let mut text = format!("標籤檔案: {name}\n");
    for (field, value) in fields.iter() {
        text.push_str(&format!("{field}: {value}\n"));
    }
    LabelPreview { template: name, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_preview_lists_fields_in_assignment_order() {
        let mut fields = FieldValueSet::new();
        fields.set(FieldName::DocType, "3113");
        fields.set(FieldName::Quantity, "1000");
        fields.set(FieldName::ProductName, "FPC-7602");

        let preview = render_text(Path::new("labels/receipt.btw"), &fields);
        assert_eq!(preview.template, "receipt.btw");
        assert_eq!(
            preview.text,
            "標籤檔案: receipt.btw\nDocType: 3113\nQuantity: 1000\nProductName: FPC-7602\n"
        );
    }
}
