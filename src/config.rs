use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub simulation: SimulationConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 远端工作流后端 (webhook 组)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// `/webhook` 为已激活流程，`/webhook-test` 为测试模式
    pub webhook_prefix: String,
    /// 附带跳过隧道警告页的请求头
    pub skip_tunnel_warning: bool,
}

/// 本地模拟审核的两段延迟
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub extract_delay_ms: u64,
    pub match_delay_ms: u64,
}

impl SimulationConfig {
    pub fn extract_delay(&self) -> Duration {
        Duration::from_millis(self.extract_delay_ms)
    }

    pub fn match_delay(&self) -> Duration {
        Duration::from_millis(self.match_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// 为 true 时远端审核失败进入 Failed 终态，否则以 Error 结论进入 Ready
    pub surface_remote_failures: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5678".to_string(),
            webhook_prefix: "/webhook".to_string(),
            skip_tunnel_warning: true,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            extract_delay_ms: 1500,
            match_delay_ms: 1500,
        }
    }
}

impl AppConfig {
    /// 加载配置: 缺省值 -> audit-hub.toml (可选) -> 环境变量 AUDIT_HUB__*
    ///
    /// 例: `AUDIT_HUB__BACKEND__BASE_URL=https://example.ngrok-free.dev`
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&AppConfig::default())?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("audit-hub").required(false))
            .add_source(
                Environment::with_prefix("AUDIT_HUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
