use crate::engine::{
    ensure_printer, ensure_template, render_text, template_name, EngineError, FieldStatus,
    LabelDocument, LabelEngine, LabelPreview,
};
use crate::models::{FieldName, FieldValueSet};
use std::path::{Path, PathBuf};

/// 模拟模式: 不送出实体列印, 只记录栏位与列印请求
pub struct SimulatedEngine {
    printers: Vec<String>,
}

impl SimulatedEngine {
    pub fn new(printers: Vec<String>) -> Self {
        Self { printers }
    }
}

impl LabelEngine for SimulatedEngine {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn open(&self, template: &Path) -> Result<Box<dyn LabelDocument>, EngineError> {
        ensure_template(template)?;
        tracing::info!("已载入标签档案 (模拟模式): {}", template_name(template));
        Ok(Box::new(SimulatedDocument {
            template: template.to_path_buf(),
            printers: self.printers.clone(),
            fields: FieldValueSet::new(),
        }))
    }

    fn printers(&self) -> Vec<String> {
        self.printers.clone()
    }
}

pub struct SimulatedDocument {
    template: PathBuf,
    printers: Vec<String>,
    fields: FieldValueSet,
}

impl LabelDocument for SimulatedDocument {
    fn template(&self) -> &Path {
        &self.template
    }

    fn set_field(&mut self, name: FieldName, value: &str) -> Result<FieldStatus, EngineError> {
        self.fields.set(name, value);
        Ok(FieldStatus::Applied)
    }

    fn render_preview(&mut self) -> Result<LabelPreview, EngineError> {
        Ok(render_text(&self.template, &self.fields))
    }

    fn print(&mut self, printer: &str, copies: u32) -> Result<(), EngineError> {
        ensure_printer(&self.printers, printer)?;
        tracing::info!(
            "模拟列印: 印表机={} 份数={} 档案={}",
            printer,
            copies,
            template_name(&self.template)
        );
        for (field, value) in self.fields.iter() {
            tracing::debug!("  {}: {}", field, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_requires_existing_template() {
        let engine = SimulatedEngine::new(vec!["lc01".to_string()]);
        let err = engine.open(Path::new("/nonexistent/label.btw")).err().unwrap();
        assert!(matches!(err, EngineError::TemplateNotFound(_)));
    }

    #[test]
    fn preview_lists_fields_in_assignment_order() {
        let template = tempfile::Builder::new().suffix(".btw").tempfile().unwrap();
        let engine = SimulatedEngine::new(vec!["lc01".to_string()]);
        let mut doc = engine.open(template.path()).unwrap();

        doc.set_field(FieldName::DocType, "3113").unwrap();
        doc.set_field(FieldName::ProductName, "FPC-7602").unwrap();

        let preview = doc.render_preview().unwrap();
        let lines: Vec<&str> = preview.text.lines().collect();
        assert!(lines[0].ends_with(".btw"));
        assert_eq!(&lines[1..], &["DocType: 3113", "ProductName: FPC-7602"]);
    }

    #[test]
    fn unknown_printer_is_rejected() {
        let template = tempfile::NamedTempFile::new().unwrap();
        let engine = SimulatedEngine::new(vec!["lc01".to_string()]);
        let mut doc = engine.open(template.path()).unwrap();
        assert!(doc.print("lc01", 2).is_ok());
        assert!(matches!(
            doc.print("office", 1),
            Err(EngineError::PrinterUnavailable(_))
        ));
    }
}
