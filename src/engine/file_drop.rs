use crate::engine::{
    ensure_printer, ensure_template, render_text, template_name, EngineError, FieldStatus,
    LabelDocument, LabelEngine, LabelPreview,
};
use crate::models::{FieldName, FieldValueSet};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 档案投递模式: 每次列印在监控目录写一个 CSV 工作档,
/// 由标签软体的整合服务读取后送印
pub struct FileDropEngine {
    spool_dir: PathBuf,
    printers: Vec<String>,
    sequence: Arc<AtomicU64>,
}

impl FileDropEngine {
    pub fn new(spool_dir: &Path, printers: Vec<String>) -> Self {
        Self {
            spool_dir: spool_dir.to_path_buf(),
            printers,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl LabelEngine for FileDropEngine {
    fn name(&self) -> &'static str {
        "file_drop"
    }

    fn open(&self, template: &Path) -> Result<Box<dyn LabelDocument>, EngineError> {
        ensure_template(template)?;
        tracing::info!(
            "已载入标签档案: {} (投递目录 {})",
            template_name(template),
            self.spool_dir.display()
        );
        Ok(Box::new(FileDropDocument {
            template: template.to_path_buf(),
            spool_dir: self.spool_dir.clone(),
            printers: self.printers.clone(),
            sequence: Arc::clone(&self.sequence),
            fields: FieldValueSet::new(),
        }))
    }

    fn printers(&self) -> Vec<String> {
        self.printers.clone()
    }
}

pub struct FileDropDocument {
    template: PathBuf,
    spool_dir: PathBuf,
    printers: Vec<String>,
    sequence: Arc<AtomicU64>,
    fields: FieldValueSet,
}

impl FileDropDocument {
    fn job_path(&self) -> PathBuf {
        let stem = self
            .template
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "label".to_string());
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.spool_dir.join(format!("{stem}_{stamp}_{seq:04}.csv"))
    }
}

impl LabelDocument for FileDropDocument {
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
        std::fs::create_dir_all(&self.spool_dir)?;

        let path = self.job_path();
        self.write_job(&path, printer, copies)?;

        tracing::info!("列印工作已投递: {} (印表机={} 份数={})", path.display(), printer, copies);
        Ok(())
    }
}

impl FileDropDocument {
    /// 先写隐藏的暂存档, 完成后改名为正式工作档
    ///
    /// 监控程式只会看到完整的 `.csv`; 失败时暂存档随之删除。
    fn write_job(&self, path: &Path, printer: &str, copies: u32) -> Result<(), EngineError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&self.spool_dir)?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());

            let mut header = vec!["Template".to_string(), "Printer".to_string(), "Copies".to_string()];
            header.extend(self.fields.iter().map(|(name, _)| name.to_string()));
            writer.write_record(&header)?;

            let mut row = vec![
                self.template.display().to_string(),
                printer.to_string(),
                copies.to_string(),
            ];
            row.extend(self.fields.iter().map(|(_, value)| value.to_string()));
            writer.write_record(&row)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_writes_one_csv_job_in_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let template = dir.path().join("receipt.btw");
        std::fs::write(&template, b"btw").unwrap();

        let engine = FileDropEngine::new(&spool, vec!["lc01".to_string()]);
        let mut doc = engine.open(&template).unwrap();
        doc.set_field(FieldName::Quantity, "12").unwrap();
        doc.set_field(FieldName::ProductName, "TEST, PART").unwrap();
        doc.print("lc01", 3).unwrap();

        let jobs: Vec<_> = std::fs::read_dir(&spool).unwrap().collect();
        assert_eq!(jobs.len(), 1);
        let path = jobs[0].as_ref().unwrap().path();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("receipt_"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["Template", "Printer", "Copies", "Quantity", "ProductName"]
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "lc01");
        assert_eq!(&row[2], "3");
        assert_eq!(&row[4], "TEST, PART");
    }

    #[test]
    fn successive_jobs_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("a.btw");
        std::fs::write(&template, b"btw").unwrap();

        let engine = FileDropEngine::new(dir.path(), vec!["lc01".to_string()]);
        let mut doc = engine.open(&template).unwrap();
        doc.print("lc01", 1).unwrap();
        doc.print("lc01", 1).unwrap();

        let jobs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "csv"))
            .count();
        assert_eq!(jobs, 2);
    }

    #[test]
    fn failed_job_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = FileDropDocument {
            template: dir.path().join("a.btw"),
            spool_dir: dir.path().to_path_buf(),
            printers: vec!["lc01".to_string()],
            sequence: Arc::new(AtomicU64::new(0)),
            fields: FieldValueSet::new(),
        };
        // 目标已是目录, 改名必然失败
        let target = dir.path().join("taken.csv");
        std::fs::create_dir(&target).unwrap();

        assert!(doc.write_job(&target, "lc01", 1).is_err());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }
}
