//! 集成测试共用的初始化代码

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use qrgen_studio::analytics::{ScanRecorder, ScanSink};
use qrgen_studio::api::services::{AppStartTime, RedirectSettings};
use qrgen_studio::services::geoip::NullProvider;
use qrgen_studio::services::{
    DestinationInput, GeoIpProvider, NoopSafetyCheck, RecordService, SaveResult,
    SaveShortLinkRequest,
};
use qrgen_studio::storage::{NewScanEvent, SeaOrmStorage};
use tempfile::TempDir;

/// 把事件留在内存里的 sink
#[derive(Default)]
pub struct MemorySink {
    pub events: Mutex<Vec<NewScanEvent>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<NewScanEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScanSink for MemorySink {
    async fn record_scan(&self, event: NewScanEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct TestContext {
    pub storage: Arc<SeaOrmStorage>,
    pub service: Arc<RecordService>,
    pub sink: Arc<MemorySink>,
    pub recorder: ScanRecorder,
    pub settings: RedirectSettings,
    pub start_time: AppStartTime,
    _dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let storage = Arc::new(
            SeaOrmStorage::new(&db_url, "sqlite")
                .await
                .expect("Failed to create storage"),
        );
        let service = Arc::new(RecordService::new(
            storage.clone(),
            Arc::new(NoopSafetyCheck),
        ));
        let sink = Arc::new(MemorySink::default());
        let recorder = ScanRecorder::new(sink.clone(), GeoIpProvider::from_lookup(Arc::new(NullProvider)), "test-salt");

        Self {
            storage,
            service,
            sink,
            recorder,
            settings: RedirectSettings::default(),
            start_time: AppStartTime::now(),
            _dir: dir,
        }
    }

    /// 等待后台扫描写入完成
    pub async fn drain(&self) {
        assert!(self.recorder.drain(Duration::from_secs(5)).await);
    }

    pub async fn create_short(&self, slug: &str, urls: &[&str]) -> SaveResult {
        self.service
            .save_short_link(
                SaveShortLinkRequest {
                    slug: Some(slug.to_string()),
                    destinations: destinations(urls),
                    ..Default::default()
                },
                None,
            )
            .await
            .expect("Failed to create short link")
    }
}

pub fn destinations(urls: &[&str]) -> Vec<DestinationInput> {
    urls.iter()
        .map(|url| DestinationInput {
            url: url.to_string(),
            ..Default::default()
        })
        .collect()
}

/// 用测试上下文构建 actix App
#[macro_export]
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(qrgen_studio::api::middleware::RequestIdMiddleware)
                .app_data(actix_web::web::Data::new($ctx.storage.clone()))
                .app_data(actix_web::web::Data::new($ctx.service.clone()))
                .app_data(actix_web::web::Data::new($ctx.recorder.clone()))
                .app_data(actix_web::web::Data::new($ctx.settings.clone()))
                .app_data(actix_web::web::Data::new($ctx.start_time.clone()))
                .app_data(qrgen_studio::api::services::json_config(1024 * 1024))
                .configure(qrgen_studio::api::services::configure),
        )
        .await
    };
}
