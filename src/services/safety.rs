//! 目标 URL 安全检查
//!
//! 配置了 API key 时调用 Google Web Risk `uris:search`，否则不检查。
//! 任何失败都按安全处理（fail-open）。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ureq::Agent;

use crate::config::SafetyConfig;

const THREAT_TYPES: &[&str] = &["MALWARE", "SOCIAL_ENGINEERING", "UNWANTED_SOFTWARE"];
const SAFETY_CACHE_MAX_CAPACITY: u64 = 10_000;

/// 检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub safe: bool,
    pub threats: Vec<String>,
}

impl SafetyVerdict {
    pub fn safe() -> Self {
        Self {
            safe: true,
            threats: Vec::new(),
        }
    }
}

#[async_trait]
pub trait UrlSafetyCheck: Send + Sync {
    async fn check(&self, url: &str) -> SafetyVerdict;

    fn name(&self) -> &'static str;
}

/// 不做任何检查
pub struct NoopSafetyCheck;

#[async_trait]
impl UrlSafetyCheck for NoopSafetyCheck {
    async fn check(&self, _url: &str) -> SafetyVerdict {
        SafetyVerdict::safe()
    }

    fn name(&self) -> &'static str {
        "Noop"
    }
}

#[derive(Debug, Deserialize)]
struct SearchUrisResponse {
    threat: Option<ThreatInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo {
    #[serde(default)]
    threat_types: Vec<String>,
}

/// Google Web Risk 检查器
///
/// 结果按 URL 缓存；同一 URL 的并发检查只发一次请求。
pub struct WebRiskChecker {
    api_key: String,
    endpoint: String,
    agent: Arc<Agent>,
    cache: Cache<String, SafetyVerdict>,
}

impl WebRiskChecker {
    pub fn new(config: &SafetyConfig, api_key: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .build()
            .into();
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .max_capacity(SAFETY_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_key: api_key.to_string(),
            endpoint: config.web_risk_endpoint.clone(),
            agent: Arc::new(agent),
            cache,
        }
    }

    /// 同步请求（在 spawn_blocking 中调用）
    ///
    /// 传输或解析失败返回 Err，由调用方放行且不写入缓存。
    fn search_sync(
        agent: &Agent,
        endpoint: &str,
        api_key: &str,
        url: &str,
    ) -> Result<SafetyVerdict, String> {
        let mut request = agent.get(endpoint).query("key", api_key).query("uri", url);
        for threat in THREAT_TYPES {
            request = request.query("threatTypes", *threat);
        }

        let resp = request
            .call()
            .map_err(|e| format!("Web Risk request failed: {}", e))?;
        resp.into_body()
            .read_json::<SearchUrisResponse>()
            .map(verdict_from_response)
            .map_err(|e| format!("Web Risk response parse failed: {}", e))
    }
}

fn verdict_from_response(body: SearchUrisResponse) -> SafetyVerdict {
    match body.threat {
        Some(threat) => SafetyVerdict {
            safe: false,
            threats: threat.threat_types,
        },
        None => SafetyVerdict::safe(),
    }
}

#[async_trait]
impl UrlSafetyCheck for WebRiskChecker {
    async fn check(&self, url: &str) -> SafetyVerdict {
        let result = self
            .cache
            .try_get_with(url.to_string(), async {
                let agent = Arc::clone(&self.agent);
                let endpoint = self.endpoint.clone();
                let api_key = self.api_key.clone();
                let url_owned = url.to_string();
                tokio::task::spawn_blocking(move || {
                    Self::search_sync(&agent, &endpoint, &api_key, &url_owned)
                })
                .await
                .map_err(|e| format!("Web Risk spawn_blocking failed: {}", e))?
            })
            .await;

        // 失败不缓存，下次保存时重试
        result.unwrap_or_else(|e| {
            warn!("{}, treating {} as safe", e, url);
            SafetyVerdict::safe()
        })
    }

    fn name(&self) -> &'static str {
        "WebRisk"
    }
}

/// 根据配置选择实现
pub fn build_safety_check(config: &SafetyConfig) -> Arc<dyn UrlSafetyCheck> {
    match config
        .web_risk_api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        Some(key) => {
            info!("URL safety: Web Risk checks enabled");
            Arc::new(WebRiskChecker::new(config, key))
        }
        None => {
            debug!("URL safety: no Web Risk API key configured, skipping checks");
            Arc::new(NoopSafetyCheck)
        }
    }
}

static SAFETY_CHECK: OnceLock<Arc<dyn UrlSafetyCheck>> = OnceLock::new();

/// 进程内共享的检查器
pub fn get_safety_check() -> Arc<dyn UrlSafetyCheck> {
    Arc::clone(SAFETY_CHECK.get_or_init(|| match crate::config::try_get_config() {
        Some(config) => build_safety_check(&config.safety),
        None => Arc::new(NoopSafetyCheck),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_is_safe() {
        let verdict = NoopSafetyCheck.check("https://example.com").await;
        assert!(verdict.safe);
        assert!(verdict.threats.is_empty());
    }

    #[test]
    fn test_verdict_parsing() {
        let body: SearchUrisResponse = serde_json::from_str(
            r#"{"threat":{"threatTypes":["MALWARE"],"expireTime":"2030-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        let verdict = verdict_from_response(body);
        assert!(!verdict.safe);
        assert_eq!(verdict.threats, vec!["MALWARE".to_string()]);

        let body: SearchUrisResponse = serde_json::from_str("{}").unwrap();
        assert!(verdict_from_response(body).safe);
    }

    #[test]
    fn test_no_key_selects_noop() {
        let config = SafetyConfig::default();
        assert_eq!(build_safety_check(&config).name(), "Noop");

        let config = SafetyConfig {
            web_risk_api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(build_safety_check(&config).name(), "Noop");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_open() {
        let config = SafetyConfig {
            web_risk_api_key: Some("k".to_string()),
            web_risk_endpoint: "http://127.0.0.1:9/v1/uris:search".to_string(),
            timeout_ms: 300,
            ..Default::default()
        };
        let checker = WebRiskChecker::new(&config, "k");
        assert!(checker.check("https://example.com").await.safe);
        assert!(checker.cache.get("https://example.com").await.is_none());
    }
}
