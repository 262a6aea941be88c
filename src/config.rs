use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "INVOICE_DESK";
const CONFIG_FILE: &str = "invoice-desk";

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 远程 webhook 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub invoices_path: String,
    pub decision_path: String,
    pub resubmit_path: String,
    pub upload_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:5678/webhook".to_string(),
                timeout_secs: 30,
                invoices_path: "/invoices".to_string(),
                decision_path: "/invoices/decision".to_string(),
                resubmit_path: "/invoices/resubmit".to_string(),
                upload_path: "/invoices/upload".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 加载配置：默认值 < 配置文件 (可选) < 环境变量 `INVOICE_DESK__SERVER__PORT` 等
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("remote.base_url", defaults.remote.base_url)?
            .set_default("remote.timeout_secs", defaults.remote.timeout_secs as i64)?
            .set_default("remote.invoices_path", defaults.remote.invoices_path)?
            .set_default("remote.decision_path", defaults.remote.decision_path)?
            .set_default("remote.resubmit_path", defaults.remote.resubmit_path)?
            .set_default("remote.upload_path", defaults.remote.upload_path)?
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 远程端点完整 URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.remote.base_url.trim_end_matches('/'), path)
    }
}
