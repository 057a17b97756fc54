use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, EnumIter, EnumString};

/// 请求计时通道满时的处理策略
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OverflowPolicy {
    /// Discard the record; the request never waits.
    #[default]
    Drop,
    /// Wait for the aggregator to make room.
    Block,
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址与端口
/// - cache: 缓存后端与各类实体的 TTL
/// - metrics: 后台上报周期与计时通道容量
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：ISCOGRAM，分隔符：__
    /// 示例：ISCOGRAM__CACHE__BACKEND=memory
    pub fn load(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                if std::path::Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                eprintln!("{}", e.format_colored());
                Self::default()
            }
        }
    }

    /// Same as [`StaticConfig::load`] but reports errors instead of falling back.
    pub fn try_load(path: &str) -> crate::errors::Result<Self> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("ISCOGRAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::errors::Result<()> {
        use crate::errors::IscogramError;

        if self.metrics.timing_channel_capacity == 0 {
            return Err(IscogramError::config(
                "metrics.timing_channel_capacity must be greater than 0",
            ));
        }
        if self.metrics.cache_report_interval == 0 || self.metrics.request_report_interval == 0 {
            return Err(IscogramError::config(
                "metrics report intervals must be greater than 0",
            ));
        }
        if self.cache.user_ttl == 0 || self.cache.category_ttl == 0 {
            return Err(IscogramError::config("cache TTLs must be greater than 0"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "redis" | "memory" | "null"
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    /// 用户缓存 TTL（秒）
    #[serde(default = "default_cache_ttl")]
    pub user_ttl: u64,
    /// 分类列表缓存 TTL（秒）
    #[serde(default = "default_cache_ttl")]
    pub category_ttl: u64,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 后台指标任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 缓存命中率上报周期（秒）
    #[serde(default = "default_cache_report_interval")]
    pub cache_report_interval: u64,
    /// 请求耗时聚合窗口（秒）
    #[serde(default = "default_request_report_interval")]
    pub request_report_interval: u64,
    #[serde(default = "default_timing_channel_capacity")]
    pub timing_channel_capacity: usize,
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,
    /// 关闭时等待后台任务的最长时间（秒）
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl MetricsConfig {
    pub fn cache_report_period(&self) -> Duration {
        Duration::from_secs(self.cache_report_interval)
    }

    pub fn request_report_period(&self) -> Duration {
        Duration::from_secs(self.request_report_interval)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default)]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cache_backend() -> String {
    "redis".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "iscogram:".to_string()
}

fn default_memory_capacity() -> u64 {
    100_000
}

fn default_cache_report_interval() -> u64 {
    5
}

fn default_request_report_interval() -> u64 {
    1
}

fn default_timing_channel_capacity() -> usize {
    1000
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            user_ttl: default_cache_ttl(),
            category_ttl: default_cache_ttl(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cache_report_interval: default_cache_report_interval(),
            request_report_interval: default_request_report_interval(),
            timing_channel_capacity: default_timing_channel_capacity(),
            overflow_policy: OverflowPolicy::default(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_match_reference_periods() {
        let config = StaticConfig::default();
        assert_eq!(config.metrics.cache_report_period(), Duration::from_secs(5));
        assert_eq!(config.metrics.request_report_period(), Duration::from_secs(1));
        assert_eq!(config.metrics.timing_channel_capacity, 1000);
        assert_eq!(config.metrics.overflow_policy, OverflowPolicy::Drop);
        assert_eq!(config.cache.user_ttl, 3600);
        assert_eq!(config.cache.category_ttl, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overflow_policy_parsing() {
        assert_eq!(OverflowPolicy::from_str("drop").unwrap(), OverflowPolicy::Drop);
        assert_eq!(OverflowPolicy::from_str("BLOCK").unwrap(), OverflowPolicy::Block);
        assert!(OverflowPolicy::from_str("spill").is_err());
        assert_eq!(OverflowPolicy::Block.to_string(), "block");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = StaticConfig::default();
        config.metrics.timing_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[cache]"));
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.cache.backend, "redis");
        assert_eq!(parsed.metrics.overflow_policy, OverflowPolicy::Drop);
    }

    #[test]
    fn test_load_falls_back_to_defaults_on_invalid_file() {
        let path = std::env::temp_dir()
            .join(format!("iscogram-invalid-{}.toml", std::process::id()));
        std::fs::write(&path, "[metrics]\ntiming_channel_capacity = 0\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        assert!(StaticConfig::try_load(&path).is_err());
        let config = StaticConfig::load(&path);
        assert_eq!(config.metrics.timing_channel_capacity, 1000);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [metrics]
            overflow_policy = "block"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.metrics.overflow_policy, OverflowPolicy::Block);
        assert_eq!(parsed.metrics.timing_channel_capacity, 1000);
        assert_eq!(parsed.server.port, 8080);
    }
}
