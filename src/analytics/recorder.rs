//! 扫描事件记录器
//!
//! `record` 对调用方是同步的：只拷贝原始请求信息并派发后台任务。
//! 任务派发到构建记录器时所在的运行时（服务器模式下是主线程的 System 运行时），
//! 而不是处理请求的 worker 运行时；worker 停止时不会取消未完成的写入。
//! 待写入的任务数被计数，关闭时可以有限等待其完成。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::device::classify_device;
use super::sink::ScanSink;
use crate::config::AnalyticsConfig;
use crate::services::GeoIpProvider;
use crate::storage::models::{EventKind, NewScanEvent};
use crate::utils::ip::is_private_ip_str;
use crate::utils::{extract_domain, hash_ip, hash_user_agent};

/// 重定向时采集到的原始请求信息
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub record_id: String,
    pub slug: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// CDN 提供的国家代码头
    pub country_hint: Option<String>,
    /// 命中的目的地；存在时事件类型为 destination
    pub destination_id: Option<String>,
}

/// 配置的盐为空时生成进程内随机盐
pub fn resolve_salt(configured: &str) -> String {
    let configured = configured.trim();
    if !configured.is_empty() {
        return configured.to_string();
    }
    warn!(
        "analytics.ip_hash_salt is not set, using a random per-process salt; \
         unique scan counts will not be comparable across restarts"
    );
    bs58::encode(rand::random::<[u8; 32]>()).into_string()
}

/// CDN 国家头：两位字母，忽略 XX（未知）和 T1（Tor）
fn normalize_country_hint(raw: Option<&str>) -> Option<String> {
    let code = raw?.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) || code == "XX" {
        return None;
    }
    Some(code)
}

/// 任务结束（包括 panic）时减少计数
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Clone)]
pub struct ScanRecorder {
    sink: Arc<dyn ScanSink>,
    geo: GeoIpProvider,
    salt: Arc<str>,
    pending: Arc<AtomicUsize>,
    enabled: bool,
    /// 后台写入所在的运行时；构建时不在运行时内则退回到调用方的运行时
    runtime: Option<Handle>,
}

impl ScanRecorder {
    pub fn new(sink: Arc<dyn ScanSink>, geo: GeoIpProvider, salt: impl Into<String>) -> Self {
        Self {
            sink,
            geo,
            salt: Arc::from(salt.into()),
            pending: Arc::new(AtomicUsize::new(0)),
            enabled: true,
            runtime: Handle::try_current().ok(),
        }
    }

    /// 根据配置构建：选择 GeoIP 实现、确定盐
    pub fn from_config(sink: Arc<dyn ScanSink>, config: &AnalyticsConfig) -> Self {
        let mut recorder = Self::new(
            sink,
            GeoIpProvider::new(config),
            resolve_salt(&config.ip_hash_salt),
        );
        recorder.enabled = config.enabled;
        if !config.enabled {
            debug!("Scan analytics disabled by configuration");
        }
        recorder
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 当前仍在写入的事件数
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// 派发后台写入任务，立即返回
    pub fn record(&self, request: ScanRequest) {
        if !self.enabled {
            return;
        }

        self.pending.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(Arc::clone(&self.pending));
        let recorder = self.clone();

        let task = async move {
            let _guard = guard;
            let slug = request.slug.clone();
            let event = recorder.build_event(request).await;
            if let Err(e) = recorder.sink.record_scan(event).await {
                warn!("Failed to record scan event for '{}': {}", slug, e);
            }
        };

        match &self.runtime {
            Some(handle) => {
                handle.spawn(task);
            }
            None => {
                tokio::spawn(task);
            }
        }
    }

    /// 把原始请求信息转换为可存储的事件（不含原始 IP）
    pub async fn build_event(&self, request: ScanRequest) -> NewScanEvent {
        let ip = request
            .client_ip
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let country_hint = normalize_country_hint(request.country_hint.as_deref());
        let geo = match ip {
            Some(ip) if !is_private_ip_str(ip) => self.geo.lookup(ip).await,
            _ => None,
        }
        .unwrap_or_default();
        trace!("Geo for scan on '{}': {:?}", request.slug, geo);

        let event_kind = if request.destination_id.is_some() {
            EventKind::Destination
        } else {
            EventKind::Scan
        };

        NewScanEvent {
            record_id: request.record_id,
            slug_snapshot: request.slug,
            ip_hash: hash_ip(ip, &self.salt),
            user_agent_hash: hash_user_agent(request.user_agent.as_deref().unwrap_or("")),
            country_iso: country_hint.or(geo.country),
            city_name: geo.city,
            referrer_domain: request.referrer.as_deref().and_then(extract_domain),
            device_category: classify_device(request.user_agent.as_deref()),
            destination_id: request.destination_id,
            event_kind,
            created_at: Utc::now(),
        }
    }

    /// 等待未完成的写入，最多等待 `timeout`；返回是否全部完成
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let pending = self.pending();
            if pending == 0 {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!("Dropping {} pending scan events on shutdown", pending);
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
