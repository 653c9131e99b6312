use crate::storage::models::NewScanEvent;

/// 扫描事件 Sink
#[async_trait::async_trait]
pub trait ScanSink: Send + Sync {
    /// 写入单条扫描事件
    async fn record_scan(&self, event: NewScanEvent) -> anyhow::Result<()>;
}
