use crate::engine::{EngineError, FieldStatus, LabelDocument, LabelEngine, LabelPreview};
use crate::models::{FieldValueSet, LabelOverrides, ReceiptRecord};
use crate::parse::normalize_quantity;
use crate::service::mapper::{FieldMapper, MapError};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

pub type SessionId = u64;

/// 已开启模板的共用句柄; 这把锁同时是预览锁
pub type SharedDocument = Arc<Mutex<Box<dyn LabelDocument>>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("找不到标签会话 {0}")]
    NotFound(SessionId),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("标签会话状态锁定失败")]
    Poisoned,
}

#[derive(Debug, Default)]
struct SessionState {
    record: Option<ReceiptRecord>,
    overrides: LabelOverrides,
    /// 最近一次推送给引擎的栏位
    pushed: FieldValueSet,
}

/// 一个已载入模板的标签作业
pub struct LabelSession {
    id: SessionId,
    template: PathBuf,
    document: SharedDocument,
    state: RwLock<SessionState>,
}

impl LabelSession {
    fn new(id: SessionId, document: Box<dyn LabelDocument>) -> Self {
        Self {
            id,
            template: document.template().to_path_buf(),
            document: Arc::new(Mutex::new(document)),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn document(&self) -> SharedDocument {
        Arc::clone(&self.document)
    }

    pub fn record(&self) -> Result<Option<ReceiptRecord>, SessionError> {
        Ok(self.state.read().map_err(|_| SessionError::Poisoned)?.record.clone())
    }

    pub fn overrides(&self) -> Result<LabelOverrides, SessionError> {
        Ok(self.state.read().map_err(|_| SessionError::Poisoned)?.overrides.clone())
    }

    pub fn pushed_fields(&self) -> Result<FieldValueSet, SessionError> {
        Ok(self.state.read().map_err(|_| SessionError::Poisoned)?.pushed.clone())
    }

    /// 整笔替换单据; 数量带入单据数量, 品名改回单据品名
    pub fn replace_record(&self, record: ReceiptRecord) -> Result<(), SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::Poisoned)?;
        state.overrides.quantity = Some(normalize_quantity(&record.quantity.to_string()));
        state.overrides.product_name = None;
        state.record = Some(record);
        Ok(())
    }

    pub fn clear_record(&self) -> Result<(), SessionError> {
        self.state.write().map_err(|_| SessionError::Poisoned)?.record = None;
        Ok(())
    }

    pub fn set_overrides(&self, overrides: LabelOverrides) -> Result<(), SessionError> {
        self.state.write().map_err(|_| SessionError::Poisoned)?.overrides = overrides;
        Ok(())
    }

    /// 依目前资料计算栏位 (不推送)
    pub fn compute_fields(&self, mapper: &FieldMapper) -> Result<FieldValueSet, SessionError> {
        let state = self.state.read().map_err(|_| SessionError::Poisoned)?;
        let fields = match &state.record {
            Some(record) => mapper.map(record, &state.overrides)?,
            None => mapper.map_operator_fields(&state.overrides)?,
        };
        Ok(fields)
    }

    /// 重新计算并依序推送全部栏位
    ///
    /// 先取得文件锁再读取状态, 最后推送的一定是最新的资料。
    /// 锁顺序固定为文件锁 -> 状态锁。
    pub fn sync_fields(&self, mapper: &FieldMapper) -> Result<FieldValueSet, SessionError> {
        let mut document = self.document.lock().map_err(|_| SessionError::Poisoned)?;
        let fields = self.compute_fields(mapper)?;
        self.push(document.as_mut(), fields)
    }

    /// 推送栏位后产生预览; 整个过程持有预览锁
    pub fn preview(&self, mapper: &FieldMapper) -> Result<LabelPreview, SessionError> {
        let mut document = self.document.lock().map_err(|_| SessionError::Poisoned)?;
        let fields = self.compute_fields(mapper)?;
        self.push(document.as_mut(), fields)?;
        Ok(document.render_preview()?)
    }

    fn push(
        &self,
        document: &mut dyn LabelDocument,
        fields: FieldValueSet,
    ) -> Result<FieldValueSet, SessionError> {
        for (name, value) in fields.iter() {
            if document.set_field(name, value)? == FieldStatus::NotFound {
                tracing::warn!("会话 {}: 模板中找不到栏位 '{}'", self.id, name);
            }
        }
        tracing::debug!("会话 {}: 已推送 {} 个栏位", self.id, fields.len());
        self.state.write().map_err(|_| SessionError::Poisoned)?.pushed = fields.clone();
        Ok(fields)
    }
}

/// 标签会话表
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<LabelSession>>,
    next_id: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &self,
        engine: &dyn LabelEngine,
        template: &Path,
    ) -> Result<Arc<LabelSession>, SessionError> {
        let document = engine.open(template)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Arc::new(LabelSession::new(id, document));
        self.sessions.insert(id, Arc::clone(&session));
        tracing::info!("会话 {} 已开启: {}", id, template.display());
        Ok(session)
    }

    pub fn get(&self, id: SessionId) -> Result<Arc<LabelSession>, SessionError> {
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SessionError::NotFound(id))
    }

    pub fn close(&self, id: SessionId) -> Result<(), SessionError> {
        self.sessions
            .remove(&id)
            .map(|_| tracing::info!("会话 {} 已关闭", id))
            .ok_or(SessionError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
