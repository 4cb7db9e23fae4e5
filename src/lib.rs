pub mod api;
pub mod config;
pub mod engine;
pub mod erp;
pub mod models;
pub mod parse;
pub mod service;

pub use config::AppConfig;
pub use engine::create_engine;
pub use erp::ErpClient;
pub use service::LabelService;
