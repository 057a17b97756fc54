use std::fmt;

#[derive(Debug, Clone)]
pub enum IscogramError {
    CacheUnavailable(String),
    CacheBackendNotFound(String),
    Serialization(String),
    StoreOperation(String),
    NotFound(String),
    Config(String),
    FileOperation(String),
    Validation(String),
}

impl IscogramError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            IscogramError::CacheUnavailable(_) => "E001",
            IscogramError::CacheBackendNotFound(_) => "E002",
            IscogramError::Serialization(_) => "E003",
            IscogramError::StoreOperation(_) => "E004",
            IscogramError::NotFound(_) => "E005",
            IscogramError::Config(_) => "E006",
            IscogramError::FileOperation(_) => "E007",
            IscogramError::Validation(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            IscogramError::CacheUnavailable(_) => "Cache Unavailable",
            IscogramError::CacheBackendNotFound(_) => "Cache Backend Not Found",
            IscogramError::Serialization(_) => "Serialization Error",
            IscogramError::StoreOperation(_) => "Store Operation Error",
            IscogramError::NotFound(_) => "Resource Not Found",
            IscogramError::Config(_) => "Configuration Error",
            IscogramError::FileOperation(_) => "File Operation Error",
            IscogramError::Validation(_) => "Validation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            IscogramError::CacheUnavailable(msg) => msg,
            IscogramError::CacheBackendNotFound(msg) => msg,
            IscogramError::Serialization(msg) => msg,
            IscogramError::StoreOperation(msg) => msg,
            IscogramError::NotFound(msg) => msg,
            IscogramError::Config(msg) => msg,
            IscogramError::FileOperation(msg) => msg,
            IscogramError::Validation(msg) => msg,
        }
    }

    /// Errors the caller recovers from by skipping the cache and going to the store.
    pub fn is_cache_error(&self) -> bool {
        matches!(
            self,
            IscogramError::CacheUnavailable(_) | IscogramError::Serialization(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for IscogramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for IscogramError {}

// 便捷的构造函数
impl IscogramError {
    pub fn cache_unavailable<T: Into<String>>(msg: T) -> Self {
        IscogramError::CacheUnavailable(msg.into())
    }

    pub fn cache_backend_not_found<T: Into<String>>(msg: T) -> Self {
        IscogramError::CacheBackendNotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        IscogramError::Serialization(msg.into())
    }

    pub fn store_operation<T: Into<String>>(msg: T) -> Self {
        IscogramError::StoreOperation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        IscogramError::NotFound(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        IscogramError::Config(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        IscogramError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        IscogramError::Validation(msg.into())
    }
}

impl From<redis::RedisError> for IscogramError {
    fn from(err: redis::RedisError) -> Self {
        IscogramError::CacheUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for IscogramError {
    fn from(err: serde_json::Error) -> Self {
        IscogramError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for IscogramError {
    fn from(err: std::io::Error) -> Self {
        IscogramError::FileOperation(err.to_string())
    }
}

impl From<config::ConfigError> for IscogramError {
    fn from(err: config::ConfigError) -> Self {
        IscogramError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IscogramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = [
            IscogramError::cache_unavailable("a"),
            IscogramError::cache_backend_not_found("b"),
            IscogramError::serialization("c"),
            IscogramError::store_operation("d"),
            IscogramError::not_found("e"),
            IscogramError::config("f"),
            IscogramError::file_operation("g"),
            IscogramError::validation("h"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_cache_error_classification() {
        assert!(IscogramError::cache_unavailable("down").is_cache_error());
        assert!(IscogramError::serialization("bad json").is_cache_error());
        assert!(!IscogramError::store_operation("db").is_cache_error());
        assert!(!IscogramError::not_found("x").is_cache_error());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = IscogramError::cache_unavailable("connection refused");
        assert_eq!(err.to_string(), "Cache Unavailable: connection refused");
    }

    #[test]
    fn test_colored_format_keeps_code_and_message() {
        let err = IscogramError::config("metrics.timing_channel_capacity must be greater than 0");
        let text = err.format_colored();
        assert!(text.contains("[ERROR]"));
        assert!(text.contains(err.code()));
        assert!(text.contains("metrics.timing_channel_capacity must be greater than 0"));
    }

    #[test]
    fn test_serde_json_error_converts_to_serialization() {
        let parse_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: IscogramError = parse_err.into();
        assert!(matches!(err, IscogramError::Serialization(_)));
    }
}
