use crate::config::AppConfig;
use crate::engine::{LabelEngine, LabelPreview};
use crate::erp::ErpClient;
use crate::models::{
    FieldValueSet, LabelOverrides, PrintJob, PrintOutcome, PrintProgress, ReceiptQuery,
    ReceiptRecord,
};
use crate::service::mapper::{product_name_advice, FieldMapper, NameLength};
use crate::service::printer::PrintDispatcher;
use crate::service::session::{LabelSession, SessionId, SessionStore};
use crate::service::ServiceError;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// 查询成功后回传给操作端的资料
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub record: ReceiptRecord,
    /// 自动带入的列印数量 (已去除小数)
    pub quantity: String,
    pub fields: FieldValueSet,
    pub product_name_length: NameLength,
}

/// 标签列印流程: 载入模板 -> 查询单据 -> 调整栏位 -> 预览 -> 列印
pub struct LabelService {
    erp: ErpClient,
    engine: Arc<dyn LabelEngine>,
    sessions: SessionStore,
    printer: PrintDispatcher,
    mapper: FieldMapper,
    default_printer: String,
}

impl LabelService {
    pub fn new(config: &AppConfig, engine: Arc<dyn LabelEngine>) -> Result<Self, ServiceError> {
        Ok(Self {
            erp: ErpClient::new(&config.erp)?,
            engine,
            sessions: SessionStore::new(),
            printer: PrintDispatcher::new(config.printer.timeout()),
            mapper: FieldMapper::new(config.mapping.fallback),
            default_printer: config.printer.default_printer.clone(),
        })
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn printers(&self) -> Vec<String> {
        self.engine.printers()
    }

    pub fn default_printer(&self) -> &str {
        &self.default_printer
    }

    pub fn open_template(&self, template: &Path) -> Result<Arc<LabelSession>, ServiceError> {
        Ok(self.sessions.open(self.engine.as_ref(), template)?)
    }

    pub fn close_session(&self, id: SessionId) -> Result<(), ServiceError> {
        Ok(self.sessions.close(id)?)
    }

    pub fn session(&self, id: SessionId) -> Result<Arc<LabelSession>, ServiceError> {
        Ok(self.sessions.get(id)?)
    }

    /// 查询单据并推送栏位
    ///
    /// 查无资料时清除会话中的旧单据; 网路错误则保留。
    /// 取得单据后即整笔替换并带入数量, 之后的栏位同步失败 (严格模式下日期或数量无法解析)
    /// 只回传错误, 会话仍保留这笔新单据与带入的数量。
    pub async fn lookup_receipt(
        &self,
        id: SessionId,
        query: &ReceiptQuery,
    ) -> Result<LookupResult, ServiceError> {
        let session = self.sessions.get(id)?;

        let record = match self.erp.fetch_receipt(query).await {
            Ok(record) => record,
            Err(e) => {
                if e.is_not_found() {
                    session.clear_record()?;
                }
                return Err(e.into());
            }
        };

        session.replace_record(record.clone())?;
        let fields = self.sync(&session).await?;
        let quantity = session.overrides()?.quantity.unwrap_or_default();

        tracing::info!(
            "会话 {}: 单据 {}-{}-{} 已载入, 品名长度 {}",
            id,
            record.doc_type,
            record.doc_number,
            record.doc_item,
            record.product_name.chars().count()
        );

        Ok(LookupResult {
            product_name_length: product_name_advice(&record.product_name),
            record,
            quantity,
            fields,
        })
    }

    /// 更新手动输入值并重新推送栏位
    pub async fn update_overrides(
        &self,
        id: SessionId,
        overrides: LabelOverrides,
    ) -> Result<FieldValueSet, ServiceError> {
        let session = self.sessions.get(id)?;
        session.set_overrides(overrides)?;
        self.sync(&session).await
    }

    /// 目前资料对应的栏位 (不推送)
    pub fn fields(&self, id: SessionId) -> Result<FieldValueSet, ServiceError> {
        let session = self.sessions.get(id)?;
        Ok(session.compute_fields(&self.mapper)?)
    }

    pub async fn preview(&self, id: SessionId) -> Result<LabelPreview, ServiceError> {
        let session = self.sessions.get(id)?;
        let mapper = self.mapper;
        let preview = tokio::task::spawn_blocking(move || session.preview(&mapper)).await??;
        Ok(preview)
    }

    /// 保留列印槽后做最后一次栏位同步, 再送印
    ///
    /// 已有列印工作时立即回传忙碌, 不会改动文件栏位; 同步失败则释放列印槽不列印。
    pub async fn print(
        &self,
        id: SessionId,
        printer: Option<String>,
        copies: u32,
    ) -> Result<PrintOutcome, ServiceError> {
        let session = self.sessions.get(id)?;
        let printer = printer
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.default_printer.clone());
        let job = PrintJob { printer, copies };

        let slot = self.printer.reserve(&job)?;
        self.sync(&session).await?;
        Ok(self.printer.run(slot, session.document(), job).await?)
    }

    pub fn print_progress(&self) -> PrintProgress {
        self.printer.progress()
    }

    pub fn cancel_print(&self) -> bool {
        self.printer.cancel()
    }

    async fn sync(&self, session: &Arc<LabelSession>) -> Result<FieldValueSet, ServiceError> {
        let session = Arc::clone(session);
        let mapper = self.mapper;
        let fields = tokio::task::spawn_blocking(move || session.sync_fields(&mapper)).await??;
        Ok(fields)
    }
}
