//! 空 GeoIP 实现：任何查询都没有结果

use async_trait::async_trait;

use super::provider::{GeoInfo, GeoIpLookup};

pub struct NullProvider;

#[async_trait]
impl GeoIpLookup for NullProvider {
    async fn lookup(&self, _ip: &str) -> Option<GeoInfo> {
        None
    }

    fn name(&self) -> &'static str {
        "Null"
    }
}
