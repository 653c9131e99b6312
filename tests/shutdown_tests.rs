//! Graceful shutdown tests
//!
//! Scan writes dispatched by HTTP workers must finish after the workers stop.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use common::{TestContext, destinations};
use qrgen_studio::analytics::{ScanRecorder, ScanSink};
use qrgen_studio::api::services::configure;
use qrgen_studio::runtime::lifetime::shutdown::drain_scan_events;
use qrgen_studio::services::geoip::NullProvider;
use qrgen_studio::services::{GeoIpProvider, SaveShortLinkRequest};
use qrgen_studio::storage::NewScanEvent;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// 写入较慢的 sink，保证停止服务器时写入仍在进行
#[derive(Default)]
struct SlowSink {
    written: AtomicUsize,
}

#[async_trait::async_trait]
impl ScanSink for SlowSink {
    async fn record_scan(&self, _event: NewScanEvent) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.written.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

async fn raw_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: go.example.com\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}

#[actix_rt::test]
async fn test_pending_scans_are_written_after_server_stop() {
    let ctx = TestContext::new().await;
    ctx.service
        .save_short_link(
            SaveShortLinkRequest {
                slug: Some("promo".to_string()),
                destinations: destinations(&["https://a.example/page"]),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let sink = Arc::new(SlowSink::default());
    let recorder = ScanRecorder::new(
        sink.clone(),
        GeoIpProvider::from_lookup(Arc::new(NullProvider)),
        "test-salt",
    );

    let storage = ctx.storage.clone();
    let service = ctx.service.clone();
    let settings = ctx.settings.clone();
    let start_time = ctx.start_time.clone();
    let app_recorder = recorder.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(app_recorder.clone()))
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(start_time.clone()))
            .configure(configure)
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    let server_task = tokio::spawn(server);

    let response = raw_get(addr, "/promo").await;
    assert!(response.starts_with("HTTP/1.1 302"), "{}", response);
    assert!(response.contains("https://a.example/page"));

    handle.stop(true).await;
    server_task.await.unwrap().unwrap();

    drain_scan_events(&recorder, Duration::from_secs(5)).await;
    assert_eq!(recorder.pending(), 0);
    assert_eq!(sink.written.load(Ordering::Acquire), 1);
}
