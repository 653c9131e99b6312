//! 扫描事件的城市级定位（GeoLite2-City 本地库）
//!
//! 国家代码优先取 CDN 头，这里只在没有国家头时补充国家，并始终提供城市。

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use maxminddb::geoip2::City;
use tracing::trace;

use super::provider::{GeoInfo, GeoIpLookup};
use crate::errors::{Result, StudioError};

/// 把库中的国家 / 城市字段整理成扫描事件使用的形式
///
/// 国家代码必须是两位字母并统一大写；城市名去掉空白。两者都缺失时返回 None。
pub fn geo_from_fields(country_iso: Option<&str>, city_name: Option<&str>) -> Option<GeoInfo> {
    let country = country_iso
        .map(str::trim)
        .filter(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase);
    let city = city_name
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);

    (country.is_some() || city.is_some()).then_some(GeoInfo { country, city })
}

pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 读取整个 mmdb 文件到内存
    pub fn new(path: &str) -> Result<Self> {
        let reader = Reader::open_readfile(path).map_err(|e| {
            StudioError::file_operation(format!("Cannot open GeoLite2 database {}: {}", path, e))
        })?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

#[async_trait]
impl GeoIpLookup for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        let addr: IpAddr = ip.parse().ok()?;
        let record: City = self.reader.lookup(addr).ok()?.decode().ok()??;

        let geo = geo_from_fields(record.country.iso_code, record.city.names.english);
        trace!("GeoLite2 {} -> {:?}", ip, geo);
        geo
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_from_fields() {
        let geo = geo_from_fields(Some("de"), Some(" Berlin ")).unwrap();
        assert_eq!(geo.country.as_deref(), Some("DE"));
        assert_eq!(geo.city.as_deref(), Some("Berlin"));

        let geo = geo_from_fields(Some("EUR"), Some("Paris")).unwrap();
        assert_eq!(geo.country, None);

        assert_eq!(geo_from_fields(None, Some("  ")), None);
        assert_eq!(geo_from_fields(None, None), None);
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let err = MaxMindProvider::new("/nonexistent/GeoLite2-City.mmdb")
            .err()
            .unwrap();
        assert!(matches!(err, StudioError::FileOperation(_)));
        assert!(err.message().contains("/nonexistent/GeoLite2-City.mmdb"));
    }
}
