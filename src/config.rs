use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub erp: ErpConfig,
    pub printer: PrinterConfig,
    pub engine: EngineConfig,
    pub mapping: MappingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// ERP 条码接口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ErpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterConfig {
    pub default_printer: String,
    /// 额外可选的印表机名称 (引擎本身列出的之外)
    pub extra_printers: Vec<String>,
    pub timeout_secs: u64,
}

impl PrinterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// 内存模拟引擎, 不送出实体列印
    Simulated,
    /// 将列印工作以 CSV 投递到监控目录
    FileDrop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub spool_dir: PathBuf,
}

/// 数量/月份解析失败时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// 静默使用预设值 (数量 "1", 月份 "12")
    #[default]
    Lenient,
    /// 视为输入错误
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    pub fallback: FallbackPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            erp: ErpConfig {
                base_url: "http://192.168.0.13:100/api/ErpToBarcode/".to_string(),
                timeout_secs: 30,
            },
            printer: PrinterConfig {
                default_printer: "lc01".to_string(),
                extra_printers: Vec::new(),
                timeout_secs: 30,
            },
            engine: EngineConfig {
                kind: EngineKind::Simulated,
                spool_dir: PathBuf::from("spool"),
            },
            mapping: MappingConfig {
                fallback: FallbackPolicy::Lenient,
            },
        }
    }
}

impl AppConfig {
    /// 加载配置: 预设值 <- label-print.toml (可选) <- LABEL__* 环境变量
    ///
    /// 例: `LABEL__ERP__BASE_URL=http://erp:100/api/ErpToBarcode/`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(File::with_name("label-print").required(false))
    }

    fn load_from(file: File<config::FileSourceFile, config::FileFormat>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("LABEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_plant_setup() {
        let config = AppConfig::default();
        assert_eq!(config.erp.timeout(), Duration::from_secs(30));
        assert_eq!(config.printer.default_printer, "lc01");
        assert_eq!(config.engine.kind, EngineKind::Simulated);
        assert_eq!(config.mapping.fallback, FallbackPolicy::Lenient);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[erp]\nbase_url = \"http://erp.local/api/\"\ntimeout_secs = 5\n\n[mapping]\nfallback = \"strict\"\n\n[engine]\nkind = \"file_drop\"\nspool_dir = \"/tmp/labels\""
        )
        .unwrap();

        let config = AppConfig::load_from(File::from(file.path())).unwrap();
        assert_eq!(config.erp.base_url, "http://erp.local/api/");
        assert_eq!(config.erp.timeout_secs, 5);
        assert_eq!(config.mapping.fallback, FallbackPolicy::Strict);
        assert_eq!(config.engine.kind, EngineKind::FileDrop);
        // 未出现在文件中的段落保留预设值
        assert_eq!(config.server.port, 8080);
    }
}
