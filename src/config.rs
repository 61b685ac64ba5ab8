use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// 慢查询日志阈值
    pub slow_statement_secs: u64,
}

/// 旧系统导入相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 员工代码 -> 员工ID
    #[serde(default)]
    pub staff: HashMap<String, i64>,
    /// Owner 行之后扫描手机号的行数
    pub phone_scan_lines: usize,
    /// 规范化手机号时去掉的国家区号
    pub country_code: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/clinic".to_string(),
                max_connections: 20,
                acquire_timeout_secs: 10,
                slow_statement_secs: 5,
            },
            import: ImportConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            staff: HashMap::new(),
            phone_scan_lines: 5,
            country_code: "65".to_string(),
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> config/pms-import.* -> PMS_IMPORT__* 环境变量 -> DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("database.acquire_timeout_secs", defaults.database.acquire_timeout_secs as i64)?
            .set_default("database.slow_statement_secs", defaults.database.slow_statement_secs as i64)?
            .set_default("import.phone_scan_lines", defaults.import.phone_scan_lines as i64)?
            .set_default("import.country_code", defaults.import.country_code)?
            .add_source(File::with_name("config/pms-import").required(false))
            .add_source(Environment::with_prefix("PMS_IMPORT").separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }
}
