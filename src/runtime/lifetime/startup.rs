use crate::analytics::{ScanRecorder, ScanSink};
use crate::api::services::RedirectSettings;
use crate::services::RecordService;
use crate::services::safety::get_safety_check;
use crate::storage::{SeaOrmStorage, StorageFactory};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub record_service: Arc<RecordService>,
    pub recorder: ScanRecorder,
    pub redirect_settings: RedirectSettings,
}

/// CLI 模式预处理：只需要安装 TLS provider
#[cfg(feature = "cli")]
pub async fn cli_pre_startup() {
    install_crypto_provider();
}

/// 安装 rustls 默认 provider（重复安装时忽略）
fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 准备服务器启动的上下文
/// 包括存储、扫描记录器和编辑服务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    install_crypto_provider();

    let config = crate::config::get_config();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let sink: Arc<dyn ScanSink> = storage.clone();
    let recorder = ScanRecorder::from_config(sink, &config.analytics);
    if recorder.is_enabled() {
        info!("Scan analytics enabled");
    } else {
        warn!("Scan analytics disabled, redirects will not be recorded");
    }

    let safety = get_safety_check();
    info!("URL safety check: {}", safety.name());

    let record_service = Arc::new(RecordService::new(storage.clone(), safety));
    let redirect_settings = RedirectSettings::from_config(&config);

    if config.server.trusted_proxies.is_empty() {
        warn!(
            "Trusted proxies: auto-detect mode. \
             Connections from private IPs will use forwarded headers. \
             To disable, configure server.trusted_proxies explicitly."
        );
    } else {
        info!(
            "Trusted proxies configured: {:?}",
            config.server.trusted_proxies
        );
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        record_service,
        recorder,
        redirect_settings,
    })
}
