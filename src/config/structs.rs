use serde::{Deserialize, Serialize};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "QRGEN";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、可信代理
/// - database: 数据库连接配置
/// - logging: 日志配置
/// - analytics: 扫描统计配置（IP 盐值、GeoIP）
/// - redirect: 跳转缓存头与 not-found 回退
/// - safety: URL 安全检查
/// - qr: 二维码资源生成
/// - cors: 跨域配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub qr: QrConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：QRGEN，分隔符：__
    /// 示例：QRGEN__SERVER__PORT=9999
    pub fn load() -> Self {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.trusted_proxies")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 对外公开的站点地址（如 https://qr.example.com），用于二维码内容。
    /// 未配置时根据请求头重建。
    #[serde(default)]
    pub public_origin: Option<String>,
    /// 可信代理（IP 或 CIDR）。为空时自动信任私有地址/localhost 的连接。
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    /// 请求体大小上限（字节）
    #[serde(default = "default_payload_limit")]
    pub payload_limit: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
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
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 扫描统计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 是否记录扫描事件
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// IP 哈希盐值。为空时每个进程生成随机盐值（重启后哈希不可关联）
    #[serde(default)]
    pub ip_hash_salt: String,
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 如果配置且文件可读，使用本地解析；否则不做地理位置解析
    #[serde(default)]
    pub maxminddb_path: Option<String>,
    /// CDN 提供的国家代码请求头
    #[serde(default = "default_country_header")]
    pub country_header: String,
    /// 关闭时等待未完成写入的最长时间（秒）
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

/// 跳转响应配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Cache-Control max-age（秒）
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: u64,
    /// Cache-Control stale-while-revalidate（秒）
    #[serde(default = "default_stale_while_revalidate")]
    pub stale_while_revalidate: u64,
    /// 公开路由 not-found 时的回退地址
    #[serde(default = "default_not_found_fallback")]
    pub not_found_fallback: String,
}

/// URL 安全检查配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Google Web Risk API key，未配置时跳过检查
    #[serde(default)]
    pub web_risk_api_key: Option<String>,
    #[serde(default = "default_web_risk_endpoint")]
    pub web_risk_endpoint: String,
    #[serde(default = "default_safety_timeout_ms")]
    pub timeout_ms: u64,
    /// 检查结果缓存时间（秒）
    #[serde(default = "default_safety_cache_ttl")]
    pub cache_ttl_secs: u64,
}

/// 二维码资源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    /// logo 原始图片最大字节数
    #[serde(default = "default_max_logo_bytes")]
    pub max_logo_bytes: usize,
    /// PDF 内嵌图片的 JPEG 质量
    #[serde(default = "default_pdf_jpeg_quality")]
    pub pdf_jpeg_quality: u8,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
    #[serde(default)]
    pub allow_credentials: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_payload_limit() -> usize {
    4 * 1024 * 1024
}

fn default_database_url() -> String {
    "sqlite://qrgen.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
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

fn default_enable_rotation() -> bool {
    true
}

fn default_country_header() -> String {
    "cf-ipcountry".to_string()
}

fn default_drain_timeout() -> u64 {
    5
}

fn default_cache_max_age() -> u64 {
    300
}

fn default_stale_while_revalidate() -> u64 {
    60
}

fn default_not_found_fallback() -> String {
    "/".to_string()
}

fn default_web_risk_endpoint() -> String {
    "https://webrisk.googleapis.com/v1/uris:search".to_string()
}

fn default_safety_timeout_ms() -> u64 {
    2000
}

fn default_safety_cache_ttl() -> u64 {
    600
}

fn default_max_logo_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_pdf_jpeg_quality() -> u8 {
    90
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    ["Content-Type", "Accept", "X-Editor-Password"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cors_max_age() -> u64 {
    3600
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            public_origin: None,
            trusted_proxies: Vec::new(),
            payload_limit: default_payload_limit(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
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
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ip_hash_salt: String::new(),
            maxminddb_path: None,
            country_header: default_country_header(),
            drain_timeout_secs: default_drain_timeout(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            cache_max_age: default_cache_max_age(),
            stale_while_revalidate: default_stale_while_revalidate(),
            not_found_fallback: default_not_found_fallback(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            web_risk_api_key: None,
            web_risk_endpoint: default_web_risk_endpoint(),
            timeout_ms: default_safety_timeout_ms(),
            cache_ttl_secs: default_safety_cache_ttl(),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            max_logo_bytes: default_max_logo_bytes(),
            pdf_jpeg_quality: default_pdf_jpeg_quality(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age: default_cors_max_age(),
            allow_credentials: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.redirect.cache_max_age, 300);
        assert_eq!(config.redirect.stale_while_revalidate, 60);
        assert_eq!(config.redirect.not_found_fallback, "/");
        assert_eq!(config.analytics.country_header, "cf-ipcountry");
        assert!(config.analytics.enabled);
        assert!(config.safety.web_risk_api_key.is_none());
    }

    #[test]
    fn test_sample_config_roundtrips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[redirect]"));
        let parsed: StaticConfig = toml::from_str(&sample).expect("sample should parse");
        assert_eq!(parsed.qr.pdf_jpeg_quality, 90);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [redirect]
            not_found_fallback = "https://example.com"
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.redirect.not_found_fallback, "https://example.com");
        assert_eq!(parsed.redirect.cache_max_age, 300);
    }
}
